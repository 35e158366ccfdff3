use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum NavigationState {
    #[default]
    Idle,
    Building,
    Built,
    Following,
    Rebuilding,
}

impl NavigationState {
    /// A route session exists (being built, shown or followed).
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Position updates are matched against the route in these states.
    pub fn is_navigable(&self) -> bool {
        matches!(self, Self::Following | Self::Rebuilding)
    }
}

/// Outcome of a route computation or of a build request that was rejected
/// before any computation started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ResultCode {
    Success,
    Cancelled,
    NoRoute,
    /// Map data for some regions is missing; the regions are reported next to
    /// the code.
    NeedsMoreData,
    NoCurrentPosition,
    StartPointNotFound,
    EndPointNotFound,
    InternalError,
}

impl ResultCode {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Self::Success => "success",
            Self::Cancelled => "cancelled",
            Self::NoRoute => "no route",
            Self::NeedsMoreData => "needs more map data",
            Self::NoCurrentPosition => "no current position",
            Self::StartPointNotFound => "start point not found",
            Self::EndPointNotFound => "end point not found",
            Self::InternalError => "internal error",
        };
        write!(f, "{}", text)
    }
}
