use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use serde_with;

pub mod coordinate;
pub mod navigation;
pub mod profile;
pub mod route;
pub mod waypoint;

pub use coordinate::{Coordinate, GeoRect};
pub use navigation::{NavigationState, ResultCode};
pub use profile::RouterProfile;
pub use route::{RegionId, RouteArtifact, SpeedGroup};
pub use waypoint::{RouteMarkType, Waypoint, WaypointKey};

pub trait ExampleData {
    fn example_data() -> Self;
}

/// Attaches a distance in meters to a value, e.g. a position snapped onto a
/// route together with its distance to the original position.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithDistance<T> {
    pub distance_m: f64,
    #[serde(flatten)]
    pub content: T,
}

impl<T> WithDistance<T> {
    pub fn new(distance_m: f64, content: T) -> Self {
        Self {
            distance_m,
            content,
        }
    }
}
