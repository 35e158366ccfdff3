use std::sync::Arc;

use model::{Coordinate, GeoRect, NavigationState, RouteArtifact, WithDistance};
use utility::geo;

use crate::profile::RoutingSettings;

#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    OnRoute,
    NeedsRebuild,
    /// On the route; the position projected onto it.
    Snapped(WithDistance<Coordinate>),
}

/// Decides whether a position still belongs to a route.
pub trait RouteMatcher: Send + Sync {
    fn match_position(
        &self,
        position: &Coordinate,
        route: &RouteArtifact,
        settings: &RoutingSettings,
    ) -> MatchResult;
}

impl<M: RouteMatcher + ?Sized> RouteMatcher for Arc<M> {
    fn match_position(
        &self,
        position: &Coordinate,
        route: &RouteArtifact,
        settings: &RoutingSettings,
    ) -> MatchResult {
        (**self).match_position(position, route, settings)
    }
}

/// Treats the route as a corridor of `matching_threshold_m` around every
/// polyline segment.
#[derive(Debug, Default, Clone, Copy)]
pub struct CorridorMatcher;

impl RouteMatcher for CorridorMatcher {
    fn match_position(
        &self,
        position: &Coordinate,
        route: &RouteArtifact,
        settings: &RoutingSettings,
    ) -> MatchResult {
        let threshold = settings.matching_threshold_m;
        let search_rect = GeoRect::around(position, threshold);
        let point = (position.latitude, position.longitude);

        let nearest = route
            .segments()
            .filter(|&(start, end)| {
                let ends: [Coordinate; 2] = [start.into(), end.into()];
                GeoRect::bounding(&ends).is_some_and(|rect| rect.intersects(&search_rect))
            })
            .map(|(start, end)| {
                let (distance, fraction) = geo::distance_to_segment(point, start, end);
                (distance, geo::interpolate(start, end, fraction))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        match nearest {
            Some((distance, _)) if distance > threshold => MatchResult::NeedsRebuild,
            None => MatchResult::NeedsRebuild,
            Some((distance, snapped)) if settings.match_route => {
                MatchResult::Snapped(WithDistance::new(distance, snapped.into()))
            }
            Some(_) => MatchResult::OnRoute,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviationVerdict {
    /// Not following a route, nothing to check.
    Ignored,
    /// A rebuild is already running.
    Absorbed,
    OnRoute(Option<WithDistance<Coordinate>>),
    NeedsRebuild,
}

pub struct DeviationMonitor {
    matcher: Box<dyn RouteMatcher>,
    last_snapped: Option<WithDistance<Coordinate>>,
}

impl DeviationMonitor {
    pub fn new(matcher: Box<dyn RouteMatcher>) -> Self {
        Self {
            matcher,
            last_snapped: None,
        }
    }

    pub fn evaluate(
        &mut self,
        state: NavigationState,
        position: &Coordinate,
        route: Option<&RouteArtifact>,
        settings: &RoutingSettings,
    ) -> DeviationVerdict {
        if !state.is_navigable() {
            return DeviationVerdict::Ignored;
        }
        if state == NavigationState::Rebuilding {
            return DeviationVerdict::Absorbed;
        }
        let Some(route) = route else {
            log::warn!("following without a route");
            return DeviationVerdict::Ignored;
        };

        match self.matcher.match_position(position, route, settings) {
            MatchResult::OnRoute => {
                self.last_snapped = None;
                DeviationVerdict::OnRoute(None)
            }
            MatchResult::Snapped(snapped) => {
                self.last_snapped = Some(snapped.clone());
                DeviationVerdict::OnRoute(Some(snapped))
            }
            MatchResult::NeedsRebuild => {
                log::info!(
                    "left the route at {:.6},{:.6}",
                    position.latitude,
                    position.longitude
                );
                self.last_snapped = None;
                DeviationVerdict::NeedsRebuild
            }
        }
    }

    /// The last position projected onto the route, if the matcher snaps.
    pub fn last_snapped(&self) -> Option<&WithDistance<Coordinate>> {
        self.last_snapped.as_ref()
    }

    pub fn reset(&mut self) {
        self.last_snapped = None;
    }
}

impl Default for DeviationMonitor {
    fn default() -> Self {
        Self::new(Box::new(CorridorMatcher))
    }
}
