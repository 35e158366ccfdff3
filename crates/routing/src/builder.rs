use std::sync::{Arc, Weak};

use actors::{actor_ref::ActorRef, start};
use tokio::sync::mpsc;

use crate::{
    compute::PathSearchBackend,
    config::RoutingConfig,
    deviation::{CorridorMatcher, RouteMatcher},
    machine::{RoutingEvent, RoutingStateMachine},
    publisher::PresentationLayer,
    settings::SettingsStore,
    waypoints::{MarkStorage, MemoryMarks},
};

/// Wires a routing session from its ports. Only the path search and the
/// settings are required; everything else has an in-memory default.
pub struct RoutingBuilder {
    backend: Arc<dyn PathSearchBackend>,
    settings: Arc<dyn SettingsStore>,
    config: RoutingConfig,
    matcher: Box<dyn RouteMatcher>,
    marks: Box<dyn MarkStorage>,
    presentation: Option<Weak<dyn PresentationLayer>>,
}

impl RoutingBuilder {
    pub fn new(backend: Arc<dyn PathSearchBackend>, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            backend,
            settings,
            config: RoutingConfig::default(),
            matcher: Box::new(CorridorMatcher),
            marks: Box::<MemoryMarks>::default(),
            presentation: None,
        }
    }

    pub fn with_config(mut self, config: RoutingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_matcher<M: RouteMatcher + 'static>(mut self, matcher: M) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn with_marks<S: MarkStorage + 'static>(mut self, marks: S) -> Self {
        self.marks = Box::new(marks);
        self
    }

    /// The session only keeps a weak reference; the caller owns the
    /// presentation.
    pub fn with_presentation<P: PresentationLayer + 'static>(mut self, presentation: &Arc<P>) -> Self {
        let presentation: Weak<P> = Arc::downgrade(presentation);
        self.presentation = Some(presentation);
        self
    }

    pub fn build(self) -> (RoutingStateMachine, mpsc::UnboundedReceiver<RoutingEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut machine = RoutingStateMachine::new(
            self.config,
            self.backend,
            self.matcher,
            self.marks,
            self.settings,
            events_tx,
        );
        if let Some(presentation) = self.presentation {
            machine.attach_presentation(presentation);
        }
        (machine, events_rx)
    }

    /// Builds the session and runs it as an actor.
    pub fn start(self) -> (ActorRef<RoutingStateMachine>, mpsc::UnboundedReceiver<RoutingEvent>) {
        let (machine, events) = self.build();
        (start(machine), events)
    }
}
