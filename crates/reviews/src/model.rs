use std::fmt;

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A map feature: the map file it lives in and its index there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureId {
    pub map: String,
    pub index: u32,
}

impl FeatureId {
    pub fn new<S: Into<String>>(map: S, index: u32) -> Self {
        Self {
            map: map.into(),
            index,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.map, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub key: String,
    pub value: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub ratings: Vec<RatingRecord>,
    pub aggregate: Option<f32>,
}

impl Rating {
    pub fn with(mut self, key: &str, value: f32) -> Self {
        self.ratings.push(RatingRecord {
            key: key.to_owned(),
            value,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty() && self.aggregate.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: u128,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Sentiment {
    Positive,
    Negative,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: u64,
    pub text: String,
    /// Language of `text`, `None` for the default language.
    pub language: Option<String>,
    pub author: Author,
    pub rating: f32,
    pub sentiment: Sentiment,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_owned(),
            value: value.to_owned(),
        }
    }
}

/// Everything users said about a place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ugc {
    pub rating: Rating,
    pub reviews: Vec<Review>,
    pub attributes: Vec<Attribute>,
}

impl Ugc {
    pub fn is_empty(&self) -> bool {
        self.rating.is_empty() && self.reviews.is_empty() && self.attributes.is_empty()
    }

    /// Reviews served until a real review source exists, picked by feature
    /// index so that places differ.
    pub fn sample(feature: &FeatureId) -> Ugc {
        match feature.index % 3 {
            1 => Self::coffee_shop(),
            2 => Self::diner(),
            _ => Ugc::default(),
        }
    }

    fn coffee_shop() -> Ugc {
        let now = Utc::now();
        Ugc {
            rating: Rating {
                aggregate: Some(4.5),
                ..Default::default()
            }
            .with("food", 4.0)
            .with("service", 5.0)
            .with("music", 5.0),
            reviews: vec![
                Review {
                    id: 20,
                    text: "Damn good coffee".to_owned(),
                    language: Some("en".to_owned()),
                    author: Author {
                        id: (987654321 << 64) | 123456789,
                        name: "Cole".to_owned(),
                    },
                    rating: 5.0,
                    sentiment: Sentiment::Positive,
                    time: now - Duration::days(10),
                },
                Review {
                    id: 67812,
                    text: "Clean place, reasonably priced".to_owned(),
                    language: None,
                    author: Author {
                        id: 315,
                        name: "Cooper".to_owned(),
                    },
                    rating: 5.0,
                    sentiment: Sentiment::Positive,
                    time: now - Duration::days(1),
                },
            ],
            attributes: vec![Attribute::new("best-drink", "Coffee")],
        }
    }

    fn diner() -> Ugc {
        Ugc {
            rating: Rating {
                aggregate: Some(5.0),
                ..Default::default()
            }
            .with("food", 5.0)
            .with("service", 5.0)
            .with("music", 5.0),
            reviews: vec![Review {
                id: 119,
                text: "This pie's so good it is a crime".to_owned(),
                language: None,
                author: Author {
                    id: 315,
                    name: "Cooper".to_owned(),
                },
                rating: 5.0,
                sentiment: Sentiment::Positive,
                time: Utc::now() - Duration::days(1),
            }],
            attributes: vec![
                Attribute::new("best-drink", "Coffee"),
                Attribute::new("best-meal", "Cherry Pie"),
            ],
        }
    }
}

/// What the local user added to a place and has not uploaded yet.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UgcUpdate {
    pub rating: Rating,
    pub text: Option<String>,
    pub attributes: Vec<Attribute>,
    pub time: Option<DateTime<Utc>>,
}

impl UgcUpdate {
    pub fn is_empty(&self) -> bool {
        self.rating.is_empty() && self.text.is_none() && self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_depend_on_the_index() {
        assert!(Ugc::sample(&FeatureId::new("Kiel", 3)).is_empty());

        let coffee = Ugc::sample(&FeatureId::new("Kiel", 4));
        assert_eq!(coffee.reviews.len(), 2);
        assert_eq!(coffee.rating.aggregate, Some(4.5));

        let diner = Ugc::sample(&FeatureId::new("Kiel", 5));
        assert_eq!(diner.attributes.len(), 2);
        assert_eq!(diner.reviews[0].author.name, "Cooper");
    }

    #[test]
    fn empty_update_serializes_compactly() {
        let json = serde_json::to_value(UgcUpdate::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "rating": { "ratings": [], "aggregate": null }, "attributes": [] })
        );
    }
}
