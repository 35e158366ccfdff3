//! In-memory implementations of the routing ports: a presentation layer that
//! records what it is told, a scriptable path search and a straight line
//! path search. Used by the demo binary and by tests.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use indexmap::IndexMap;
use model::{Coordinate, GeoRect, RegionId, ResultCode, RouteArtifact, SpeedGroup};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use utility::geo;

use crate::{
    compute::{PathSearchBackend, SearchOutcome, SearchQuery},
    deviation::{MatchResult, RouteMatcher},
    profile::RoutingSettings,
    publisher::{PresentationLayer, RouteSegment, SegmentHandle},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCall {
    AddSegment(SegmentHandle),
    RemoveSegment(SegmentHandle, bool),
    AddPreview(Coordinate, Coordinate),
    RemoveAllPreviews,
    SetViewport(GeoRect, bool),
    StopLocationFollow,
    DeactivateRouteFollowing,
}

#[derive(Debug, Default)]
struct PresentationState {
    next_handle: u64,
    segments: IndexMap<SegmentHandle, RouteSegment>,
    previews: Vec<(Coordinate, Coordinate)>,
    viewport: Option<GeoRect>,
    position: Option<Coordinate>,
    calls: Vec<PresentationCall>,
}

#[derive(Debug, Default)]
pub struct RecordingPresentation {
    state: Mutex<PresentationState>,
}

impl RecordingPresentation {
    pub fn with_position(position: Coordinate) -> Self {
        let presentation = Self::default();
        presentation.set_position(Some(position));
        presentation
    }

    pub fn set_position(&self, position: Option<Coordinate>) {
        lock(&self.state).position = position;
    }

    /// Handles of the segments currently shown, oldest first.
    pub fn segments(&self) -> Vec<SegmentHandle> {
        lock(&self.state).segments.keys().copied().collect()
    }

    pub fn segment(&self, handle: SegmentHandle) -> Option<RouteSegment> {
        lock(&self.state).segments.get(&handle).cloned()
    }

    pub fn preview_count(&self) -> usize {
        lock(&self.state).previews.len()
    }

    pub fn viewport(&self) -> Option<GeoRect> {
        lock(&self.state).viewport
    }

    pub fn calls(&self) -> Vec<PresentationCall> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }
}

impl PresentationLayer for RecordingPresentation {
    fn add_segment(&self, segment: RouteSegment) -> SegmentHandle {
        let mut state = lock(&self.state);
        state.next_handle += 1;
        let handle = SegmentHandle(state.next_handle);
        state.segments.insert(handle, segment);
        state.calls.push(PresentationCall::AddSegment(handle));
        handle
    }

    fn remove_segment(&self, handle: SegmentHandle, deactivate_following: bool) {
        let mut state = lock(&self.state);
        if state.segments.shift_remove(&handle).is_none() {
            log::warn!("removing unknown segment {:?}", handle);
        }
        state
            .calls
            .push(PresentationCall::RemoveSegment(handle, deactivate_following));
    }

    fn add_preview_segment(&self, from: Coordinate, to: Coordinate) {
        let mut state = lock(&self.state);
        state.previews.push((from, to));
        state.calls.push(PresentationCall::AddPreview(from, to));
    }

    fn remove_all_preview_segments(&self) {
        let mut state = lock(&self.state);
        state.previews.clear();
        state.calls.push(PresentationCall::RemoveAllPreviews);
    }

    fn set_viewport(&self, rect: GeoRect, animate: bool) {
        let mut state = lock(&self.state);
        state.viewport = Some(rect);
        state.calls.push(PresentationCall::SetViewport(rect, animate));
    }

    fn current_position(&self) -> Option<Coordinate> {
        lock(&self.state).position
    }

    fn stop_location_follow(&self) {
        lock(&self.state)
            .calls
            .push(PresentationCall::StopLocationFollow);
    }

    fn deactivate_route_following(&self) {
        lock(&self.state)
            .calls
            .push(PresentationCall::DeactivateRouteFollowing);
    }
}

/// Draws a straight line between origin and destination, sampled into
/// `samples` segments, with a made up altitude profile.
#[derive(Debug, Clone, Copy)]
pub struct StraightLineSearch {
    pub samples: usize,
}

impl Default for StraightLineSearch {
    fn default() -> Self {
        Self { samples: 2 }
    }
}

impl StraightLineSearch {
    pub fn route(&self, origin: Coordinate, destination: Coordinate) -> RouteArtifact {
        let samples = self.samples.max(1);
        let start = (origin.latitude, origin.longitude);
        let end = (destination.latitude, destination.longitude);
        let polyline = (0..=samples)
            .map(|step| geo::interpolate(start, end, step as f64 / samples as f64).into())
            .collect::<Vec<Coordinate>>();
        let altitudes = (0..=samples)
            .map(|step| 10.0 + 5.0 * (step as f64).sin())
            .collect();
        let traffic = vec![SpeedGroup::G5; samples];
        let length_m = origin.distance_m(&destination);
        RouteArtifact::new(polyline)
            .with_traffic(traffic)
            .with_turn_distances(vec![length_m / 2.0])
            .with_altitudes(altitudes)
    }
}

#[async_trait]
impl PathSearchBackend for StraightLineSearch {
    async fn compute(&self, query: &SearchQuery, _: CancellationToken) -> SearchOutcome {
        SearchOutcome::success(self.route(query.origin, query.destination))
    }

    async fn fetch_missing_regions(&self, _: &SearchQuery) -> Vec<RegionId> {
        Vec::new()
    }
}

enum ScriptedSearch {
    Outcome(SearchOutcome),
    /// Waits until the test sends the outcome.
    Gated(oneshot::Receiver<SearchOutcome>),
    /// Never finishes on its own.
    Hang,
    Panic,
}

/// Answers searches from a queue of scripted outcomes, falling back to a
/// straight line once the queue is empty.
#[derive(Default)]
pub struct ScriptedPathSearch {
    script: Mutex<VecDeque<ScriptedSearch>>,
    queries: Mutex<Vec<SearchQuery>>,
    missing_regions: Vec<RegionId>,
    fallback: StraightLineSearch,
}

impl ScriptedPathSearch {
    pub fn with_missing_regions(mut self, regions: Vec<RegionId>) -> Self {
        self.missing_regions = regions;
        self
    }

    pub fn push(&self, outcome: SearchOutcome) {
        lock(&self.script).push_back(ScriptedSearch::Outcome(outcome));
    }

    /// The next search waits for an outcome sent through the returned
    /// sender. Dropping the sender fails the search with `Cancelled`.
    pub fn gate(&self) -> oneshot::Sender<SearchOutcome> {
        let (tx, rx) = oneshot::channel();
        lock(&self.script).push_back(ScriptedSearch::Gated(rx));
        tx
    }

    pub fn hang(&self) {
        lock(&self.script).push_back(ScriptedSearch::Hang);
    }

    pub fn panic_next(&self) {
        lock(&self.script).push_back(ScriptedSearch::Panic);
    }

    /// Number of searches started so far.
    pub fn calls(&self) -> usize {
        lock(&self.queries).len()
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl PathSearchBackend for ScriptedPathSearch {
    async fn compute(&self, query: &SearchQuery, cancel: CancellationToken) -> SearchOutcome {
        lock(&self.queries).push(query.clone());
        let next = lock(&self.script).pop_front();
        match next {
            Some(ScriptedSearch::Outcome(outcome)) => outcome,
            Some(ScriptedSearch::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| SearchOutcome::failure(ResultCode::Cancelled)),
            Some(ScriptedSearch::Hang) => {
                cancel.cancelled().await;
                SearchOutcome::failure(ResultCode::Cancelled)
            }
            Some(ScriptedSearch::Panic) => panic!("scripted path search failure"),
            None => SearchOutcome::success(self.fallback.route(query.origin, query.destination)),
        }
    }

    async fn fetch_missing_regions(&self, _: &SearchQuery) -> Vec<RegionId> {
        self.missing_regions.clone()
    }
}

/// Route matcher answering from a queue, `OnRoute` once it is empty.
#[derive(Debug, Default)]
pub struct ScriptedMatcher {
    results: Mutex<VecDeque<MatchResult>>,
}

impl ScriptedMatcher {
    pub fn push(&self, result: MatchResult) {
        lock(&self.results).push_back(result);
    }
}

impl RouteMatcher for ScriptedMatcher {
    fn match_position(
        &self,
        _: &Coordinate,
        _: &RouteArtifact,
        _: &RoutingSettings,
    ) -> MatchResult {
        lock(&self.results)
            .pop_front()
            .unwrap_or(MatchResult::OnRoute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_has_all_annotations() {
        let route = StraightLineSearch { samples: 4 }
            .route(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0));
        assert_eq!(route.polyline().len(), 5);
        assert_eq!(route.first_point(), Some(&Coordinate::new(0.0, 0.0)));
        assert_eq!(route.final_point(), Some(&Coordinate::new(1.0, 1.0)));
        assert_eq!(route.traffic().map(<[_]>::len), Some(4));
        assert!(route.has_altitudes());
    }

    #[test]
    fn recording_presentation_hands_out_fresh_handles() {
        let presentation = RecordingPresentation::default();
        let segment = RouteSegment {
            polyline: Vec::new(),
            style: crate::profile::descriptor(model::RouterProfile::Vehicle).style,
            traffic: Vec::new(),
            turn_distances_m: Vec::new(),
        };
        let first = presentation.add_segment(segment.clone());
        let second = presentation.add_segment(segment);
        assert_ne!(first, second);

        presentation.remove_segment(first, false);
        assert_eq!(presentation.segments(), vec![second]);
    }
}
