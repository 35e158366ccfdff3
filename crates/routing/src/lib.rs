use std::fmt;

use actors::{actor::ActorError, mailbox::BoundedMailbox};

pub mod builder;
pub mod compute;
pub mod config;
pub mod deviation;
pub mod machine;
pub mod memory;
pub mod messages;
pub mod profile;
pub mod publisher;
pub mod settings;
pub mod waypoints;

pub use builder::RoutingBuilder;
pub use compute::{
    CompletionSink, ComputeCompletion, ComputePurpose, ComputeRequest, ComputeTicket,
    PathSearchBackend, RouteComputeChannel, SearchOutcome, SearchQuery,
};
pub use config::RoutingConfig;
pub use deviation::{CorridorMatcher, DeviationMonitor, DeviationVerdict, MatchResult, RouteMatcher};
pub use machine::{AltitudeSummary, BuildOutcome, RoutingEvent, RoutingStateMachine};
pub use messages::RoutingHandle;
pub use profile::{descriptor, ProfileDescriptor, RoutingSettings};
pub use publisher::{PresentationLayer, RoutePublisher, RouteSegment, SegmentHandle};
pub use settings::{JsonFileSettings, MeasurementUnits, MemorySettings, SettingsStore};
pub use waypoints::{MarkStorage, MemoryMarks, WaypointError, WaypointStore};

pub type RoutingResult<T> = Result<T, RoutingError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    Waypoint(WaypointError),
    /// The routing actor is not running anymore.
    Stopped,
}

impl std::error::Error for RoutingError {}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoutingError::Waypoint(why) => write!(f, "{}", why),
            RoutingError::Stopped => write!(f, "routing is not running"),
        }
    }
}

impl From<WaypointError> for RoutingError {
    fn from(why: WaypointError) -> Self {
        RoutingError::Waypoint(why)
    }
}

impl From<ActorError<RoutingStateMachine, BoundedMailbox<RoutingStateMachine>>> for RoutingError {
    fn from(why: ActorError<RoutingStateMachine, BoundedMailbox<RoutingStateMachine>>) -> Self {
        log::warn!("routing actor unreachable: {}", why);
        RoutingError::Stopped
    }
}
