use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The mode of travel a route is built for.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum RouterProfile {
    #[default]
    Vehicle,
    Pedestrian,
    Bicycle,
    Taxi,
}

impl RouterProfile {
    pub const ALL: [RouterProfile; 4] = [
        RouterProfile::Vehicle,
        RouterProfile::Pedestrian,
        RouterProfile::Bicycle,
        RouterProfile::Taxi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Pedestrian => "pedestrian",
            Self::Bicycle => "bicycle",
            Self::Taxi => "taxi",
        }
    }
}

impl fmt::Display for RouterProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRouterProfile(pub String);

impl fmt::Display for UnknownRouterProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown router profile: {}", self.0)
    }
}

impl std::error::Error for UnknownRouterProfile {}

impl FromStr for RouterProfile {
    type Err = UnknownRouterProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouterProfile::ALL
            .into_iter()
            .find(|profile| profile.name() == s)
            .ok_or_else(|| UnknownRouterProfile(s.to_owned()))
    }
}
