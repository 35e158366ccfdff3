use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Coordinate, ExampleData, GeoRect};

/// Identifies a downloadable map region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Traffic speed class of one polyline segment, `G0` being the slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SpeedGroup {
    G0,
    G1,
    G2,
    G3,
    G4,
    G5,
    TempBlock,
    Unknown,
}

/// Result of a successful path computation. Never mutated once built; a new
/// computation produces a new artifact.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteArtifact {
    polyline: Vec<Coordinate>,
    traffic: Option<Vec<SpeedGroup>>,
    turn_distances_m: Option<Vec<f64>>,
    altitudes_m: Option<Vec<f64>>,
}

impl RouteArtifact {
    pub fn new(polyline: Vec<Coordinate>) -> Self {
        Self {
            polyline,
            traffic: None,
            turn_distances_m: None,
            altitudes_m: None,
        }
    }

    /// One speed group per polyline segment.
    pub fn with_traffic(mut self, traffic: Vec<SpeedGroup>) -> Self {
        self.traffic = Some(traffic);
        self
    }

    /// Distances from the route start to each turn.
    pub fn with_turn_distances(mut self, turn_distances_m: Vec<f64>) -> Self {
        self.turn_distances_m = Some(turn_distances_m);
        self
    }

    /// One altitude sample per polyline point.
    pub fn with_altitudes(mut self, altitudes_m: Vec<f64>) -> Self {
        self.altitudes_m = Some(altitudes_m);
        self
    }

    pub fn polyline(&self) -> &[Coordinate] {
        &self.polyline
    }

    pub fn traffic(&self) -> Option<&[SpeedGroup]> {
        self.traffic.as_deref()
    }

    pub fn turn_distances_m(&self) -> Option<&[f64]> {
        self.turn_distances_m.as_deref()
    }

    pub fn altitudes_m(&self) -> Option<&[f64]> {
        self.altitudes_m.as_deref()
    }

    /// A route needs at least two points to be drawn or followed.
    pub fn is_valid(&self) -> bool {
        self.polyline.len() >= 2
    }

    pub fn first_point(&self) -> Option<&Coordinate> {
        self.polyline.first()
    }

    pub fn final_point(&self) -> Option<&Coordinate> {
        self.polyline.last()
    }

    pub fn limit_rect(&self) -> Option<GeoRect> {
        GeoRect::bounding(&self.polyline)
    }

    /// Distance from the start to every polyline point after the first.
    pub fn segment_distances_m(&self) -> Vec<f64> {
        let mut total = 0.0;
        self.polyline
            .windows(2)
            .map(|pair| {
                total += pair[0].distance_m(&pair[1]);
                total
            })
            .collect()
    }

    pub fn length_m(&self) -> f64 {
        self.segment_distances_m().last().copied().unwrap_or(0.0)
    }

    pub fn has_altitudes(&self) -> bool {
        self.altitudes_m
            .as_ref()
            .is_some_and(|altitudes| !altitudes.is_empty())
    }

    /// `(min, max)` altitude in meters.
    pub fn altitude_range_m(&self) -> Option<(f64, f64)> {
        let altitudes = self.altitudes_m.as_ref()?;
        altitudes.iter().fold(None, |range, altitude| match range {
            None => Some((*altitude, *altitude)),
            Some((min, max)) => Some((f64::min(min, *altitude), f64::max(max, *altitude))),
        })
    }

    /// Polyline as `(latitude, longitude)` pairs for the geo helpers.
    pub fn segments(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.polyline
            .windows(2)
            .map(|pair| (pair[0].as_tuple(), pair[1].as_tuple()))
    }
}

impl ExampleData for RouteArtifact {
    fn example_data() -> Self {
        RouteArtifact::new(vec![
            Coordinate::new(54.3233, 10.1228),
            Coordinate::new(54.3240, 10.1300),
            Coordinate::new(54.3270, 10.1350),
        ])
        .with_traffic(vec![SpeedGroup::G5, SpeedGroup::G3])
        .with_turn_distances(vec![470.0])
        .with_altitudes(vec![12.0, 18.5, 9.0])
    }
}
