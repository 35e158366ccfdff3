//! Mailbox interface of the routing actor and a typed handle around it.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use actors::{
    actor_ref::{ActorRef, WeakActorRef},
    handler::{Handler, Message},
};
use async_trait::async_trait;
use model::{Coordinate, NavigationState, RouteArtifact, RouterProfile, Waypoint, WaypointKey};

use crate::{
    compute::{CompletionSink, ComputeCompletion},
    deviation::DeviationVerdict,
    machine::{AltitudeSummary, BuildOutcome, RoutingStateMachine},
    publisher::{PresentationLayer, SegmentHandle},
    waypoints::WaypointError,
    RoutingResult,
};

pub struct AddWaypoint(pub Waypoint);

impl Message for AddWaypoint {
    type Response = Result<WaypointKey, WaypointError>;
}

pub struct RemoveWaypoint(pub WaypointKey);

impl Message for RemoveWaypoint {
    type Response = Option<Waypoint>;
}

pub struct MoveWaypoint {
    pub from: WaypointKey,
    pub to: WaypointKey,
}

impl Message for MoveWaypoint {
    type Response = Result<(), WaypointError>;
}

pub struct ListWaypoints;

impl Message for ListWaypoints {
    type Response = Vec<Waypoint>;
}

pub struct CanAddIntermediate;

impl Message for CanAddIntermediate {
    type Response = bool;
}

pub struct BuildRoute {
    pub time_budget: Duration,
}

impl Message for BuildRoute {
    type Response = BuildOutcome;
}

pub struct FollowRoute;

impl Message for FollowRoute {
    type Response = bool;
}

pub struct DisableFollowMode;

impl Message for DisableFollowMode {
    type Response = bool;
}

pub struct CloseRouting {
    pub remove_points: bool,
}

impl Message for CloseRouting {
    type Response = ();
}

pub struct SetRouterProfile(pub RouterProfile);

impl Message for SetRouterProfile {
    type Response = ();
}

pub struct GetRouterProfile;

impl Message for GetRouterProfile {
    type Response = RouterProfile;
}

pub struct PositionUpdate(pub Coordinate);

impl Message for PositionUpdate {
    type Response = DeviationVerdict;
}

pub struct GetState;

impl Message for GetState {
    type Response = NavigationState;
}

pub struct GetRoute;

impl Message for GetRoute {
    type Response = Option<Arc<RouteArtifact>>;
}

pub struct GetInstalledSegments;

impl Message for GetInstalledSegments {
    type Response = Vec<SegmentHandle>;
}

pub struct AttachPresentation(pub Weak<dyn PresentationLayer>);

impl Message for AttachPresentation {
    type Response = ();
}

pub struct DetachPresentation;

impl Message for DetachPresentation {
    type Response = ();
}

pub struct GetRouteAltitude;

impl Message for GetRouteAltitude {
    type Response = Option<AltitudeSummary>;
}

/// A background search finished. Sent by the compute channel; stale
/// completions are dropped by the actor.
pub struct ComputeFinished(pub ComputeCompletion);

impl Message for ComputeFinished {
    type Response = ();
}

#[async_trait]
impl Handler<AddWaypoint> for RoutingStateMachine {
    async fn handle(&mut self, message: AddWaypoint) -> Result<WaypointKey, WaypointError> {
        self.add_waypoint(message.0)
    }
}

#[async_trait]
impl Handler<RemoveWaypoint> for RoutingStateMachine {
    async fn handle(&mut self, message: RemoveWaypoint) -> Option<Waypoint> {
        self.remove_waypoint(message.0)
    }
}

#[async_trait]
impl Handler<MoveWaypoint> for RoutingStateMachine {
    async fn handle(&mut self, message: MoveWaypoint) -> Result<(), WaypointError> {
        self.move_waypoint(message.from, message.to)
    }
}

#[async_trait]
impl Handler<ListWaypoints> for RoutingStateMachine {
    async fn handle(&mut self, _: ListWaypoints) -> Vec<Waypoint> {
        self.waypoints()
    }
}

#[async_trait]
impl Handler<CanAddIntermediate> for RoutingStateMachine {
    async fn handle(&mut self, _: CanAddIntermediate) -> bool {
        self.can_add_intermediate()
    }
}

#[async_trait]
impl Handler<BuildRoute> for RoutingStateMachine {
    async fn handle(&mut self, message: BuildRoute) -> BuildOutcome {
        self.build_route(message.time_budget)
    }
}

#[async_trait]
impl Handler<FollowRoute> for RoutingStateMachine {
    async fn handle(&mut self, _: FollowRoute) -> bool {
        self.follow_route()
    }
}

#[async_trait]
impl Handler<DisableFollowMode> for RoutingStateMachine {
    async fn handle(&mut self, _: DisableFollowMode) -> bool {
        self.disable_follow_mode()
    }
}

#[async_trait]
impl Handler<CloseRouting> for RoutingStateMachine {
    async fn handle(&mut self, message: CloseRouting) {
        self.close_routing(message.remove_points)
    }
}

#[async_trait]
impl Handler<SetRouterProfile> for RoutingStateMachine {
    async fn handle(&mut self, message: SetRouterProfile) {
        self.set_router_profile(message.0)
    }
}

#[async_trait]
impl Handler<GetRouterProfile> for RoutingStateMachine {
    async fn handle(&mut self, _: GetRouterProfile) -> RouterProfile {
        self.router_profile()
    }
}

#[async_trait]
impl Handler<PositionUpdate> for RoutingStateMachine {
    async fn handle(&mut self, message: PositionUpdate) -> DeviationVerdict {
        self.on_position_update(message.0)
    }
}

#[async_trait]
impl Handler<GetState> for RoutingStateMachine {
    async fn handle(&mut self, _: GetState) -> NavigationState {
        self.state()
    }
}

#[async_trait]
impl Handler<GetRoute> for RoutingStateMachine {
    async fn handle(&mut self, _: GetRoute) -> Option<Arc<RouteArtifact>> {
        self.route()
    }
}

#[async_trait]
impl Handler<GetInstalledSegments> for RoutingStateMachine {
    async fn handle(&mut self, _: GetInstalledSegments) -> Vec<SegmentHandle> {
        self.installed_segments()
    }
}

#[async_trait]
impl Handler<AttachPresentation> for RoutingStateMachine {
    async fn handle(&mut self, message: AttachPresentation) {
        self.attach_presentation(message.0)
    }
}

#[async_trait]
impl Handler<DetachPresentation> for RoutingStateMachine {
    async fn handle(&mut self, _: DetachPresentation) {
        self.detach_presentation()
    }
}

#[async_trait]
impl Handler<GetRouteAltitude> for RoutingStateMachine {
    async fn handle(&mut self, _: GetRouteAltitude) -> Option<AltitudeSummary> {
        self.route_altitude()
    }
}

#[async_trait]
impl Handler<ComputeFinished> for RoutingStateMachine {
    async fn handle(&mut self, message: ComputeFinished) {
        self.on_compute_finished(message.0)
    }
}

#[async_trait]
impl CompletionSink for WeakActorRef<RoutingStateMachine> {
    async fn deliver(&self, completion: ComputeCompletion) {
        let Some(actor) = self.upgrade() else {
            log::debug!("routing stopped before search #{} finished", completion.ticket.generation);
            return;
        };
        if let Err(why) = actor.tell(ComputeFinished(completion)).await {
            log::warn!("could not deliver search result: {}", why);
        }
    }
}

#[async_trait]
pub trait RoutingHandle {
    async fn add_waypoint(&self, waypoint: Waypoint) -> RoutingResult<WaypointKey>;
    async fn remove_waypoint(&self, key: WaypointKey) -> RoutingResult<Option<Waypoint>>;
    async fn move_waypoint(&self, from: WaypointKey, to: WaypointKey) -> RoutingResult<()>;
    async fn list_waypoints(&self) -> RoutingResult<Vec<Waypoint>>;
    async fn can_add_intermediate(&self) -> RoutingResult<bool>;
    async fn build_route(&self, time_budget: Duration) -> RoutingResult<BuildOutcome>;
    async fn follow_route(&self) -> RoutingResult<bool>;
    async fn disable_follow_mode(&self) -> RoutingResult<bool>;
    async fn close_routing(&self, remove_points: bool) -> RoutingResult<()>;
    async fn set_router_profile(&self, profile: RouterProfile) -> RoutingResult<()>;
    async fn router_profile(&self) -> RoutingResult<RouterProfile>;
    async fn on_position_update(&self, position: Coordinate) -> RoutingResult<DeviationVerdict>;
    async fn state(&self) -> RoutingResult<NavigationState>;
    async fn route(&self) -> RoutingResult<Option<Arc<RouteArtifact>>>;
    async fn installed_segments(&self) -> RoutingResult<Vec<SegmentHandle>>;
    async fn attach_presentation(
        &self,
        presentation: Weak<dyn PresentationLayer>,
    ) -> RoutingResult<()>;
    async fn detach_presentation(&self) -> RoutingResult<()>;
    async fn route_altitude(&self) -> RoutingResult<Option<AltitudeSummary>>;
}

#[async_trait]
impl RoutingHandle for ActorRef<RoutingStateMachine> {
    async fn add_waypoint(&self, waypoint: Waypoint) -> RoutingResult<WaypointKey> {
        Ok(self.ask(AddWaypoint(waypoint)).await??)
    }

    async fn remove_waypoint(&self, key: WaypointKey) -> RoutingResult<Option<Waypoint>> {
        Ok(self.ask(RemoveWaypoint(key)).await?)
    }

    async fn move_waypoint(&self, from: WaypointKey, to: WaypointKey) -> RoutingResult<()> {
        Ok(self.ask(MoveWaypoint { from, to }).await??)
    }

    async fn list_waypoints(&self) -> RoutingResult<Vec<Waypoint>> {
        Ok(self.ask(ListWaypoints).await?)
    }

    async fn can_add_intermediate(&self) -> RoutingResult<bool> {
        Ok(self.ask(CanAddIntermediate).await?)
    }

    async fn build_route(&self, time_budget: Duration) -> RoutingResult<BuildOutcome> {
        Ok(self.ask(BuildRoute { time_budget }).await?)
    }

    async fn follow_route(&self) -> RoutingResult<bool> {
        Ok(self.ask(FollowRoute).await?)
    }

    async fn disable_follow_mode(&self) -> RoutingResult<bool> {
        Ok(self.ask(DisableFollowMode).await?)
    }

    async fn close_routing(&self, remove_points: bool) -> RoutingResult<()> {
        Ok(self.ask(CloseRouting { remove_points }).await?)
    }

    async fn set_router_profile(&self, profile: RouterProfile) -> RoutingResult<()> {
        Ok(self.ask(SetRouterProfile(profile)).await?)
    }

    async fn router_profile(&self) -> RoutingResult<RouterProfile> {
        Ok(self.ask(GetRouterProfile).await?)
    }

    async fn on_position_update(&self, position: Coordinate) -> RoutingResult<DeviationVerdict> {
        Ok(self.ask(PositionUpdate(position)).await?)
    }

    async fn state(&self) -> RoutingResult<NavigationState> {
        Ok(self.ask(GetState).await?)
    }

    async fn route(&self) -> RoutingResult<Option<Arc<RouteArtifact>>> {
        Ok(self.ask(GetRoute).await?)
    }

    async fn installed_segments(&self) -> RoutingResult<Vec<SegmentHandle>> {
        Ok(self.ask(GetInstalledSegments).await?)
    }

    async fn attach_presentation(
        &self,
        presentation: Weak<dyn PresentationLayer>,
    ) -> RoutingResult<()> {
        Ok(self.ask(AttachPresentation(presentation)).await?)
    }

    async fn detach_presentation(&self) -> RoutingResult<()> {
        Ok(self.ask(DetachPresentation).await?)
    }

    async fn route_altitude(&self) -> RoutingResult<Option<AltitudeSummary>> {
        Ok(self.ask(GetRouteAltitude).await?)
    }
}
