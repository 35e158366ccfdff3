use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum RouteMarkType {
    Start,
    Intermediate,
    Finish,
}

/// Addresses one waypoint. The index is only meaningful for intermediate
/// points, where it is the position in the intermediate sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaypointKey {
    pub mark_type: RouteMarkType,
    pub intermediate_index: usize,
}

impl WaypointKey {
    pub const START: WaypointKey = WaypointKey {
        mark_type: RouteMarkType::Start,
        intermediate_index: 0,
    };

    pub const FINISH: WaypointKey = WaypointKey {
        mark_type: RouteMarkType::Finish,
        intermediate_index: 0,
    };

    pub fn intermediate(index: usize) -> Self {
        Self {
            mark_type: RouteMarkType::Intermediate,
            intermediate_index: index,
        }
    }

    pub fn new(mark_type: RouteMarkType, intermediate_index: usize) -> Self {
        match mark_type {
            RouteMarkType::Intermediate => Self::intermediate(intermediate_index),
            RouteMarkType::Start => Self::START,
            RouteMarkType::Finish => Self::FINISH,
        }
    }
}

impl fmt::Display for WaypointKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mark_type {
            RouteMarkType::Start => write!(f, "start"),
            RouteMarkType::Finish => write!(f, "finish"),
            RouteMarkType::Intermediate => {
                write!(f, "intermediate #{}", self.intermediate_index)
            }
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub mark_type: RouteMarkType,
    pub intermediate_index: usize,
    pub position: Coordinate,
    pub is_visible: bool,
    /// The point follows the device position and is resolved when a route is
    /// built.
    pub is_my_position: bool,
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

impl Waypoint {
    pub fn new(mark_type: RouteMarkType, position: Coordinate) -> Self {
        Self {
            mark_type,
            intermediate_index: 0,
            position,
            is_visible: true,
            is_my_position: false,
            title: None,
            subtitle: None,
        }
    }

    pub fn start(position: Coordinate) -> Self {
        Self::new(RouteMarkType::Start, position)
    }

    pub fn finish(position: Coordinate) -> Self {
        Self::new(RouteMarkType::Finish, position)
    }

    pub fn intermediate(position: Coordinate) -> Self {
        Self::new(RouteMarkType::Intermediate, position)
    }

    /// A point bound to the device position. The stored coordinate is only a
    /// placeholder until the route is built.
    pub fn my_position(mark_type: RouteMarkType) -> Self {
        Self {
            is_my_position: true,
            ..Self::new(mark_type, Coordinate::new(0.0, 0.0))
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_subtitle<S: Into<String>>(mut self, subtitle: S) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn key(&self) -> WaypointKey {
        WaypointKey::new(self.mark_type, self.intermediate_index)
    }
}
