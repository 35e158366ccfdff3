//! The routing session: owns the waypoints, the router profile and the
//! accepted route, and moves between
//! `Idle -> Building -> Built -> Following <-> Rebuilding`.
//!
//! Everything here runs on the actor's mailbox. Searches run in the
//! background and come back as [`ComputeCompletion`]s through the
//! completion sink installed when the actor starts.

use std::{
    any::Any,
    sync::{Arc, Weak},
    time::Duration,
};

use actors::{
    actor::{Actor, SupervisionStrategy},
    actor_ref::WeakActorRef,
};
use itertools::Itertools;
use model::{
    Coordinate, GeoRect, NavigationState, RegionId, ResultCode, RouteArtifact, RouterProfile,
    Waypoint, WaypointKey,
};
use tokio::sync::mpsc;
use utility::geo::meters_to_feet;

use crate::{
    compute::{
        CompletionSink, ComputeCompletion, ComputePurpose, ComputeRequest, ComputeTicket,
        PathSearchBackend, RouteComputeChannel,
    },
    config::RoutingConfig,
    deviation::{DeviationMonitor, DeviationVerdict, RouteMatcher},
    profile::{descriptor, ProfileDescriptor},
    publisher::{PresentationLayer, RoutePublisher, SegmentHandle},
    settings::{self, MeasurementUnits, SettingsStore},
    waypoints::{MarkStorage, WaypointError, WaypointStore},
};

/// Notifications for whoever drives the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingEvent {
    /// A build (or rebuild) finished or was rejected.
    RouteBuilt {
        code: ResultCode,
        missing_regions: Vec<RegionId>,
    },
    FollowStarted(RouterProfile),
    RoutingClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Started(ComputeTicket),
    Rejected(ResultCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AltitudeSummary {
    pub min: i32,
    pub max: i32,
    pub units: MeasurementUnits,
}

pub struct RoutingStateMachine {
    config: RoutingConfig,
    store: WaypointStore,
    channel: RouteComputeChannel,
    monitor: DeviationMonitor,
    publisher: RoutePublisher,
    settings: Arc<dyn SettingsStore>,
    events: mpsc::UnboundedSender<RoutingEvent>,
    profile: &'static ProfileDescriptor,
    state: NavigationState,
    route: Option<Arc<RouteArtifact>>,
    destination: Option<Coordinate>,
    sink: Option<Arc<dyn CompletionSink>>,
}

impl RoutingStateMachine {
    pub(crate) fn new(
        config: RoutingConfig,
        backend: Arc<dyn PathSearchBackend>,
        matcher: Box<dyn RouteMatcher>,
        marks: Box<dyn MarkStorage>,
        settings: Arc<dyn SettingsStore>,
        events: mpsc::UnboundedSender<RoutingEvent>,
    ) -> Self {
        let profile = descriptor(settings::last_used_router(settings.as_ref()));
        log::debug!("starting routing with the {} profile", profile.profile);
        Self {
            store: WaypointStore::new(marks, config.max_intermediate_points),
            channel: RouteComputeChannel::new(backend, profile),
            monitor: DeviationMonitor::new(matcher),
            publisher: RoutePublisher::default(),
            config,
            settings,
            events,
            profile,
            state: NavigationState::Idle,
            route: None,
            destination: None,
            sink: None,
        }
    }

    /// Where search completions are sent. Set by the actor on start.
    pub fn set_completion_sink(&mut self, sink: Arc<dyn CompletionSink>) {
        self.sink = Some(sink);
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn router_profile(&self) -> RouterProfile {
        self.profile.profile
    }

    pub fn route(&self) -> Option<Arc<RouteArtifact>> {
        self.route.clone()
    }

    pub fn installed_segments(&self) -> Vec<SegmentHandle> {
        self.publisher.installed().to_vec()
    }

    pub fn add_waypoint(&mut self, waypoint: Waypoint) -> Result<WaypointKey, WaypointError> {
        self.store.add(waypoint)
    }

    pub fn remove_waypoint(&mut self, key: WaypointKey) -> Option<Waypoint> {
        self.store.remove(key)
    }

    pub fn move_waypoint(&mut self, from: WaypointKey, to: WaypointKey) -> Result<(), WaypointError> {
        self.store.move_point(from, to)
    }

    pub fn waypoints(&mut self) -> Vec<Waypoint> {
        self.store.snapshot().to_vec()
    }

    pub fn can_add_intermediate(&self) -> bool {
        self.store.can_add_intermediate()
    }

    /// Validates the waypoints and starts the initial search. Rejections are
    /// reported as `RouteBuilt` events as well.
    pub fn build_route(&mut self, time_budget: Duration) -> BuildOutcome {
        let points = self.store.snapshot().to_vec();
        if points.len() < 2 {
            log::warn!("cannot build a route from {} points", points.len());
            self.close_routing(false);
            return self.reject(ResultCode::Cancelled);
        }

        let mut resolved = Vec::with_capacity(points.len());
        for point in &points {
            if !point.is_my_position {
                resolved.push(point.position);
                continue;
            }
            match self.publisher.current_position() {
                Some(position) => resolved.push(position),
                None => {
                    log::warn!("{} follows the device position, which is unknown", point.key());
                    return self.reject(ResultCode::NoCurrentPosition);
                }
            }
        }

        let epsilon = self.config.coincidence_epsilon;
        if resolved
            .iter()
            .tuple_combinations()
            .any(|(a, b)| a.equal_dx_dy(b, epsilon))
        {
            log::warn!("route points coincide");
            self.close_routing(false);
            return self.reject(ResultCode::Cancelled);
        }

        if self.state.is_active() {
            self.close_routing(false);
        }

        let Some(sink) = self.sink.clone() else {
            log::error!("no completion sink installed, is the actor running?");
            return self.reject(ResultCode::InternalError);
        };

        self.publisher.show_preview(&resolved);
        if let Some(rect) = GeoRect::bounding(&resolved) {
            self.publisher.show_rect(rect, self.config.viewport_scale);
        }

        // intermediate points are kept but only the ends are searched
        let (Some(origin), Some(destination)) = (resolved.first(), resolved.last()) else {
            return self.reject(ResultCode::Cancelled);
        };
        let ticket = self.channel.submit(
            ComputeRequest {
                origin: *origin,
                destination: *destination,
                time_budget,
                purpose: ComputePurpose::InitialBuild,
            },
            sink,
        );
        self.destination = Some(*destination);
        self.state = NavigationState::Building;
        log::info!("building {} route #{}", self.profile.profile, ticket.generation);
        BuildOutcome::Started(ticket)
    }

    pub fn on_compute_finished(&mut self, completion: ComputeCompletion) {
        if !self.channel.accept(&completion) {
            return;
        }
        match completion.ticket.purpose {
            ComputePurpose::InitialBuild if self.state == NavigationState::Building => {
                self.on_build_finished(completion)
            }
            ComputePurpose::Rebuild if self.state == NavigationState::Rebuilding => {
                self.on_rebuild_finished(completion)
            }
            purpose => log::warn!("ignoring {:?} completion in state {:?}", purpose, self.state),
        }
    }

    fn on_build_finished(&mut self, completion: ComputeCompletion) {
        self.publisher.hide_preview();
        match (completion.code, completion.route) {
            (ResultCode::Success, Some(route)) => {
                self.publisher.install(&route, self.profile);
                self.publisher.stop_location_follow();
                if let Some(rect) = route.limit_rect() {
                    self.publisher.show_rect(rect, self.config.viewport_scale);
                }
                self.route = Some(route);
                self.state = NavigationState::Built;
                self.notify(RoutingEvent::RouteBuilt {
                    code: ResultCode::Success,
                    missing_regions: Vec::new(),
                });
            }
            (code, _) => {
                log::warn!("route build failed: {}", code);
                if code == ResultCode::NeedsMoreData {
                    // keep the points, the user may download the regions and retry
                    self.state = NavigationState::Idle;
                    self.destination = None;
                } else {
                    self.close_routing(false);
                }
                self.notify(RoutingEvent::RouteBuilt {
                    code,
                    missing_regions: completion.missing_regions,
                });
            }
        }
    }

    fn on_rebuild_finished(&mut self, completion: ComputeCompletion) {
        match (completion.code, completion.route) {
            (ResultCode::Success, Some(route)) => {
                self.publisher.uninstall(false);
                self.publisher.install(&route, self.profile);
                self.route = Some(route);
                self.monitor.reset();
                self.state = NavigationState::Following;
                self.notify(RoutingEvent::RouteBuilt {
                    code: ResultCode::Success,
                    missing_regions: Vec::new(),
                });
            }
            (code, _) => {
                log::warn!("rebuild failed with {}, keeping the current route", code);
                self.state = NavigationState::Following;
            }
        }
    }

    /// Starts following a built route. The start point is hidden.
    pub fn follow_route(&mut self) -> bool {
        if self.state != NavigationState::Built {
            log::warn!("cannot follow a route in state {:?}", self.state);
            return false;
        }
        self.store.hide(WaypointKey::START);
        self.state = NavigationState::Following;
        self.notify(RoutingEvent::FollowStarted(self.profile.profile));
        true
    }

    pub fn disable_follow_mode(&mut self) -> bool {
        if self.state != NavigationState::Following {
            return false;
        }
        self.publisher.deactivate_route_following();
        self.state = NavigationState::Built;
        true
    }

    /// Ends the session from any state. The points survive unless
    /// `remove_points` is set.
    pub fn close_routing(&mut self, remove_points: bool) {
        self.publisher.hide_preview();
        self.channel.cancel();
        self.publisher.uninstall(true);
        self.route = None;
        self.destination = None;
        self.monitor.reset();
        if remove_points {
            self.store.clear();
        }

        let was_active = self.state.is_active();
        self.state = NavigationState::Idle;
        if was_active {
            log::info!("routing closed");
            self.notify(RoutingEvent::RoutingClosed);
        }
    }

    /// Switches the profile for future searches and remembers it. The
    /// current route is left alone.
    pub fn set_router_profile(&mut self, profile: RouterProfile) {
        if profile == self.profile.profile {
            return;
        }
        log::info!("router profile {} -> {}", self.profile.profile, profile);
        settings::set_last_used_router(self.settings.as_ref(), profile);
        self.profile = descriptor(profile);
        self.channel.bind(self.profile);
    }

    pub fn on_position_update(&mut self, position: Coordinate) -> DeviationVerdict {
        let verdict = self.monitor.evaluate(
            self.state,
            &position,
            self.route.as_deref(),
            &self.profile.settings,
        );
        if verdict == DeviationVerdict::NeedsRebuild {
            self.start_rebuild(position);
        }
        verdict
    }

    fn start_rebuild(&mut self, origin: Coordinate) {
        let destination = self
            .destination
            .or_else(|| self.route.as_ref()?.final_point().copied());
        let (Some(destination), Some(sink)) = (destination, self.sink.clone()) else {
            log::error!("cannot rebuild without a destination and a completion sink");
            return;
        };
        self.state = NavigationState::Rebuilding;
        let ticket = self.channel.submit(
            ComputeRequest {
                origin,
                destination,
                time_budget: self.config.rebuild_time_budget,
                purpose: ComputePurpose::Rebuild,
            },
            sink,
        );
        log::info!("rebuilding route #{}", ticket.generation);
    }

    /// Shows the active route on `presentation` from now on.
    pub fn attach_presentation(&mut self, presentation: Weak<dyn PresentationLayer>) {
        if !self.publisher.attach(presentation) {
            return;
        }
        if let Some(route) = self.route.clone() {
            self.publisher.install(&route, self.profile);
        }
    }

    pub fn detach_presentation(&mut self) {
        self.publisher.detach();
    }

    /// Lowest and highest point of the route in the configured units.
    pub fn route_altitude(&self) -> Option<AltitudeSummary> {
        let (min, max) = self.route.as_ref()?.altitude_range_m()?;
        let units = settings::measurement_units(self.settings.as_ref());
        let convert = |meters: f64| match units {
            MeasurementUnits::Metric => meters.round() as i32,
            MeasurementUnits::Imperial => meters_to_feet(meters).round() as i32,
        };
        Some(AltitudeSummary {
            min: convert(min),
            max: convert(max),
            units,
        })
    }

    fn reject(&self, code: ResultCode) -> BuildOutcome {
        self.notify(RoutingEvent::RouteBuilt {
            code,
            missing_regions: Vec::new(),
        });
        BuildOutcome::Rejected(code)
    }

    fn notify(&self, event: RoutingEvent) {
        if self.events.send(event).is_err() {
            log::debug!("nobody listens to routing events");
        }
    }
}

impl Actor for RoutingStateMachine {
    fn started(&mut self, myself: WeakActorRef<Self>) {
        self.sink = Some(Arc::new(myself));
    }

    fn on_fail(&mut self, _: Box<dyn Any + Send>) -> SupervisionStrategy {
        SupervisionStrategy::Resume
    }
}

#[cfg(test)]
mod tests {
    use model::{ExampleData, RouteMarkType};

    use super::*;
    use crate::{
        builder::RoutingBuilder,
        compute::SearchOutcome,
        memory::{RecordingPresentation, ScriptedPathSearch},
        settings::{MemorySettings, UNITS_KEY},
        waypoints::{MarkStorage, MemoryMarks},
    };

    struct Session {
        machine: RoutingStateMachine,
        completions: mpsc::UnboundedReceiver<ComputeCompletion>,
        events: mpsc::UnboundedReceiver<RoutingEvent>,
        presentation: Arc<RecordingPresentation>,
        backend: Arc<ScriptedPathSearch>,
        settings: Arc<MemorySettings>,
    }

    impl Session {
        fn new() -> Self {
            let backend = Arc::new(ScriptedPathSearch::default());
            let settings = Arc::new(MemorySettings::default());
            let presentation = Arc::new(RecordingPresentation::default());
            let (mut machine, events) = RoutingBuilder::new(backend.clone(), settings.clone())
                .with_presentation(&presentation)
                .build();
            let (tx, completions) = mpsc::unbounded_channel();
            machine.set_completion_sink(Arc::new(tx));
            Self {
                machine,
                completions,
                events,
                presentation,
                backend,
                settings,
            }
        }

        fn with_points(points: &[(f64, f64)]) -> Self {
            let mut session = Self::new();
            let (first, rest) = points.split_first().unwrap();
            session
                .machine
                .add_waypoint(Waypoint::start((*first).into()))
                .unwrap();
            if let Some((last, middle)) = rest.split_last() {
                for point in middle {
                    session
                        .machine
                        .add_waypoint(Waypoint::intermediate((*point).into()))
                        .unwrap();
                }
                session
                    .machine
                    .add_waypoint(Waypoint::finish((*last).into()))
                    .unwrap();
            }
            session
        }

        async fn finish_next(&mut self) {
            let completion = self.completions.recv().await.unwrap();
            self.machine.on_compute_finished(completion);
        }

        fn drain_events(&mut self) -> Vec<RoutingEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }

        async fn following(points: &[(f64, f64)]) -> Self {
            let mut session = Self::with_points(points);
            session.machine.build_route(Duration::ZERO);
            session.finish_next().await;
            assert!(session.machine.follow_route());
            session.drain_events();
            session
        }
    }

    #[tokio::test]
    async fn points_already_in_the_mark_storage_are_routed() {
        let mut marks = MemoryMarks::default();
        marks.create(Waypoint::start(Coordinate::new(0.0, 0.0)).with_title("Home"));
        marks.create(
            Waypoint::finish(Coordinate::new(1.0, 1.0))
                .with_title("Raisdorf")
                .with_subtitle("Bahnhof"),
        );
        let backend = Arc::new(ScriptedPathSearch::default());
        let (mut machine, _events) =
            RoutingBuilder::new(backend.clone(), Arc::new(MemorySettings::default()))
                .with_marks(marks)
                .build();
        let (tx, mut completions) = mpsc::unbounded_channel();
        machine.set_completion_sink(Arc::new(tx));

        let waypoints = machine.waypoints();
        assert_eq!(waypoints[1].subtitle.as_deref(), Some("Bahnhof"));
        assert!(matches!(
            machine.build_route(Duration::ZERO),
            BuildOutcome::Started(_)
        ));
        machine.on_compute_finished(completions.recv().await.unwrap());
        assert_eq!(machine.state(), NavigationState::Built);
        assert_eq!(backend.queries()[0].destination, Coordinate::new(1.0, 1.0));
    }

    #[tokio::test]
    async fn single_point_is_cancelled_and_kept() {
        let mut session = Session::with_points(&[(0.0, 0.0)]);
        assert_eq!(
            session.machine.build_route(Duration::ZERO),
            BuildOutcome::Rejected(ResultCode::Cancelled)
        );
        assert_eq!(session.machine.state(), NavigationState::Idle);
        assert_eq!(session.machine.waypoints().len(), 1);
        assert_eq!(session.backend.calls(), 0);
    }

    #[tokio::test]
    async fn my_position_without_fix_changes_nothing() {
        let mut session = Session::new();
        session
            .machine
            .add_waypoint(Waypoint::my_position(RouteMarkType::Start))
            .unwrap();
        session
            .machine
            .add_waypoint(Waypoint::finish(Coordinate::new(1.0, 1.0)))
            .unwrap();

        assert_eq!(
            session.machine.build_route(Duration::ZERO),
            BuildOutcome::Rejected(ResultCode::NoCurrentPosition)
        );
        assert_eq!(session.machine.state(), NavigationState::Idle);
        assert_eq!(
            session.drain_events(),
            vec![RoutingEvent::RouteBuilt {
                code: ResultCode::NoCurrentPosition,
                missing_regions: Vec::new()
            }]
        );
    }

    #[tokio::test]
    async fn my_position_is_resolved_from_the_presentation() {
        let mut session = Session::new();
        session
            .presentation
            .set_position(Some(Coordinate::new(0.5, 0.5)));
        session
            .machine
            .add_waypoint(Waypoint::my_position(RouteMarkType::Start))
            .unwrap();
        session
            .machine
            .add_waypoint(Waypoint::finish(Coordinate::new(1.0, 1.0)))
            .unwrap();

        assert!(matches!(
            session.machine.build_route(Duration::ZERO),
            BuildOutcome::Started(_)
        ));
        session.finish_next().await;
        assert_eq!(session.backend.queries()[0].origin, Coordinate::new(0.5, 0.5));
    }

    #[tokio::test]
    async fn build_shows_preview_then_route() {
        let mut session = Session::with_points(&[(0.0, 0.0), (0.5, 0.4), (1.0, 1.0)]);
        session.machine.build_route(Duration::ZERO);
        assert_eq!(session.machine.state(), NavigationState::Building);
        assert_eq!(session.presentation.preview_count(), 2);
        let preview_rect = session.presentation.viewport().unwrap();
        assert!((preview_rect.max.latitude - 1.25).abs() < 1e-9);

        session.finish_next().await;
        assert_eq!(session.machine.state(), NavigationState::Built);
        assert_eq!(session.presentation.preview_count(), 0);
        assert_eq!(session.presentation.segments().len(), 1);

        // only the ends are searched
        let query = &session.backend.queries()[0];
        assert_eq!(query.origin, Coordinate::new(0.0, 0.0));
        assert_eq!(query.destination, Coordinate::new(1.0, 1.0));
    }

    #[tokio::test]
    async fn needs_more_data_keeps_the_points() {
        let mut session = Session::with_points(&[(0.0, 0.0), (1.0, 1.0)]);
        session
            .backend
            .push(SearchOutcome::failure(ResultCode::NeedsMoreData));
        session.machine.build_route(Duration::ZERO);
        session.finish_next().await;

        assert_eq!(session.machine.state(), NavigationState::Idle);
        assert_eq!(session.machine.waypoints().len(), 2);
        assert!(session.machine.route().is_none());
        assert!(session.presentation.segments().is_empty());
    }

    #[tokio::test]
    async fn no_route_closes_the_session() {
        let mut session = Session::with_points(&[(0.0, 0.0), (1.0, 1.0)]);
        session.backend.push(SearchOutcome::failure(ResultCode::NoRoute));
        session.machine.build_route(Duration::ZERO);
        session.finish_next().await;

        assert_eq!(session.machine.state(), NavigationState::Idle);
        assert_eq!(
            session.drain_events(),
            vec![
                RoutingEvent::RoutingClosed,
                RoutingEvent::RouteBuilt {
                    code: ResultCode::NoRoute,
                    missing_regions: Vec::new()
                }
            ]
        );
    }

    #[tokio::test]
    async fn unknown_end_point_closes_the_session() {
        let mut session = Session::with_points(&[(0.0, 0.0), (1.0, 1.0)]);
        session
            .backend
            .push(SearchOutcome::failure(ResultCode::EndPointNotFound));
        session.machine.build_route(Duration::ZERO);
        session.finish_next().await;

        assert_eq!(session.machine.state(), NavigationState::Idle);
        assert!(session.machine.route().is_none());
        assert_eq!(session.machine.waypoints().len(), 2);
        assert_eq!(
            session.drain_events(),
            vec![
                RoutingEvent::RoutingClosed,
                RoutingEvent::RouteBuilt {
                    code: ResultCode::EndPointNotFound,
                    missing_regions: Vec::new()
                }
            ]
        );
    }

    #[tokio::test]
    async fn build_out_of_time_is_cancelled() {
        let mut session = Session::with_points(&[(0.0, 0.0), (1.0, 1.0)]);
        session.backend.hang();
        session.machine.build_route(Duration::from_millis(20));
        session.finish_next().await;

        assert_eq!(session.machine.state(), NavigationState::Idle);
        assert_eq!(session.machine.waypoints().len(), 2);
        assert!(session.presentation.segments().is_empty());
        assert_eq!(session.presentation.preview_count(), 0);
        assert_eq!(
            session.drain_events(),
            vec![
                RoutingEvent::RoutingClosed,
                RoutingEvent::RouteBuilt {
                    code: ResultCode::Cancelled,
                    missing_regions: Vec::new()
                }
            ]
        );
    }

    #[tokio::test]
    async fn stale_completion_is_discarded() {
        let mut session = Session::with_points(&[(0.0, 0.0), (1.0, 1.0)]);
        let BuildOutcome::Started(first) = session.machine.build_route(Duration::ZERO) else {
            panic!("build was rejected");
        };
        let BuildOutcome::Started(second) = session.machine.build_route(Duration::ZERO) else {
            panic!("build was rejected");
        };
        assert_ne!(first, second);
        session.presentation.clear_calls();

        session.machine.on_compute_finished(ComputeCompletion {
            ticket: first,
            code: ResultCode::Success,
            route: Some(Arc::new(RouteArtifact::example_data())),
            missing_regions: Vec::new(),
        });
        assert_eq!(session.machine.state(), NavigationState::Building);
        assert!(session.presentation.calls().is_empty());

        session.finish_next().await;
        assert_eq!(session.machine.state(), NavigationState::Built);
    }

    #[tokio::test]
    async fn leaving_the_route_rebuilds_from_the_position() {
        let mut session = Session::following(&[(0.0, 0.0), (0.0, 0.02)]).await;
        let old_segments = session.presentation.segments();

        let verdict = session
            .machine
            .on_position_update(Coordinate::new(0.01, 0.01));
        assert_eq!(verdict, DeviationVerdict::NeedsRebuild);
        assert_eq!(session.machine.state(), NavigationState::Rebuilding);
        assert_eq!(
            session
                .machine
                .on_position_update(Coordinate::new(0.02, 0.01)),
            DeviationVerdict::Absorbed
        );

        session.finish_next().await;
        assert_eq!(session.machine.state(), NavigationState::Following);
        let new_segments = session.presentation.segments();
        assert_eq!(new_segments.len(), 1);
        assert!(old_segments.iter().all(|old| !new_segments.contains(old)));

        let rebuild = &session.backend.queries()[1];
        assert_eq!(rebuild.origin, Coordinate::new(0.01, 0.01));
        assert_eq!(rebuild.destination, Coordinate::new(0.0, 0.02));
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_the_route() {
        let mut session = Session::following(&[(0.0, 0.0), (0.0, 0.02)]).await;
        let segments = session.presentation.segments();
        let route = session.machine.route();

        session.backend.push(SearchOutcome::failure(ResultCode::NoRoute));
        session
            .machine
            .on_position_update(Coordinate::new(0.01, 0.01));
        session.finish_next().await;

        assert_eq!(session.machine.state(), NavigationState::Following);
        assert_eq!(session.presentation.segments(), segments);
        assert_eq!(session.machine.installed_segments(), segments);
        assert_eq!(session.machine.route(), route);
        assert!(session.drain_events().is_empty());
    }

    #[tokio::test]
    async fn disable_follow_mode_returns_to_built() {
        let mut session = Session::following(&[(0.0, 0.0), (1.0, 1.0)]).await;
        assert!(session.machine.disable_follow_mode());
        assert_eq!(session.machine.state(), NavigationState::Built);
        assert!(!session.machine.disable_follow_mode());
        assert!(session.machine.follow_route());
    }

    #[tokio::test]
    async fn close_cancels_and_clears() {
        let mut session = Session::with_points(&[(0.0, 0.0), (1.0, 1.0)]);
        session.backend.hang();
        session.machine.build_route(Duration::ZERO);
        session.machine.close_routing(true);

        assert_eq!(session.machine.state(), NavigationState::Idle);
        assert!(session.machine.waypoints().is_empty());
        assert_eq!(session.presentation.preview_count(), 0);
        assert!(session.drain_events().contains(&RoutingEvent::RoutingClosed));
        // the cancelled search never reports back
        drop(session.machine);
        assert!(session.completions.recv().await.is_none());
    }

    #[tokio::test]
    async fn profile_change_does_not_rebuild() {
        let mut session = Session::following(&[(0.0, 0.0), (1.0, 1.0)]).await;
        session.machine.set_router_profile(RouterProfile::Bicycle);

        assert_eq!(session.machine.state(), NavigationState::Following);
        assert_eq!(session.backend.calls(), 1);
        assert_eq!(
            settings::last_used_router(session.settings.as_ref()),
            RouterProfile::Bicycle
        );
    }

    #[tokio::test]
    async fn reattaching_installs_the_route_again() {
        let mut session = Session::following(&[(0.0, 0.0), (1.0, 1.0)]).await;
        let other = Arc::new(RecordingPresentation::default());
        let layer: Arc<dyn PresentationLayer> = other.clone();
        session.machine.attach_presentation(Arc::downgrade(&layer));

        assert_eq!(other.segments().len(), 1);
        assert_eq!(session.machine.installed_segments(), other.segments());
        assert!(session.presentation.segments().is_empty());
    }

    #[tokio::test]
    async fn reattaching_the_same_presentation_does_not_duplicate_the_route() {
        let mut session = Session::following(&[(0.0, 0.0), (1.0, 1.0)]).await;
        let layer: Arc<dyn PresentationLayer> = session.presentation.clone();
        session.machine.attach_presentation(Arc::downgrade(&layer));
        assert_eq!(session.presentation.segments().len(), 1);

        session.machine.close_routing(false);
        assert!(session.presentation.segments().is_empty());
    }

    #[tokio::test]
    async fn detached_presentation_keeps_no_route() {
        let mut session = Session::following(&[(0.0, 0.0), (1.0, 1.0)]).await;
        session.machine.detach_presentation();
        assert!(session.presentation.segments().is_empty());

        session.machine.close_routing(false);
        assert!(session.presentation.segments().is_empty());
        assert_eq!(session.machine.state(), NavigationState::Idle);
    }

    #[tokio::test]
    async fn altitude_follows_the_units_setting() {
        let mut session = Session::with_points(&[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(session.machine.route_altitude(), None);

        session
            .backend
            .push(SearchOutcome::success(RouteArtifact::example_data()));
        session.machine.build_route(Duration::ZERO);
        session.finish_next().await;

        let metric = session.machine.route_altitude().unwrap();
        assert_eq!((metric.min, metric.max), (9, 19));
        assert_eq!(metric.units, MeasurementUnits::Metric);

        session
            .settings
            .set(UNITS_KEY, MeasurementUnits::Imperial.to_string());
        let imperial = session.machine.route_altitude().unwrap();
        assert_eq!((imperial.min, imperial.max), (30, 61));
    }
}
