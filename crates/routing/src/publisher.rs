use std::sync::{Arc, Weak};

use model::{Coordinate, GeoRect, RouteArtifact, SpeedGroup};

use crate::profile::{ProfileDescriptor, SegmentStyle};

/// Handle of a segment added to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentHandle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    pub polyline: Vec<Coordinate>,
    pub style: SegmentStyle,
    /// Empty unless the style shows traffic.
    pub traffic: Vec<SpeedGroup>,
    /// Empty unless the style shows turns.
    pub turn_distances_m: Vec<f64>,
}

/// The map the route is drawn on. Implementations are called from the
/// routing actor only.
pub trait PresentationLayer: Send + Sync {
    fn add_segment(&self, segment: RouteSegment) -> SegmentHandle;
    fn remove_segment(&self, handle: SegmentHandle, deactivate_following: bool);
    /// Straight dashed line shown while a route is being built.
    fn add_preview_segment(&self, from: Coordinate, to: Coordinate);
    fn remove_all_preview_segments(&self);
    fn set_viewport(&self, rect: GeoRect, animate: bool);
    fn current_position(&self) -> Option<Coordinate>;
    fn stop_location_follow(&self);
    fn deactivate_route_following(&self);
}

/// Styling of a route segment, depends on nothing but the artifact and the
/// profile.
pub fn build_segment(artifact: &RouteArtifact, profile: &ProfileDescriptor) -> RouteSegment {
    let style = profile.style;
    let traffic = match artifact.traffic() {
        Some(traffic) if style.show_traffic => traffic.to_vec(),
        _ => Vec::new(),
    };
    let turn_distances_m = match artifact.turn_distances_m() {
        Some(turns) if style.show_turns => turns.to_vec(),
        _ => Vec::new(),
    };
    RouteSegment {
        polyline: artifact.polyline().to_vec(),
        style,
        traffic,
        turn_distances_m,
    }
}

/// Keeps the presentation in line with the accepted route. The presentation
/// is only borrowed; once it is dropped every call does nothing.
#[derive(Default)]
pub struct RoutePublisher {
    presentation: Option<Weak<dyn PresentationLayer>>,
    installed: Vec<SegmentHandle>,
}

impl RoutePublisher {
    /// Returns true when the route has to be installed on `presentation`.
    /// Attaching the current presentation again keeps its segments.
    pub fn attach(&mut self, presentation: Weak<dyn PresentationLayer>) -> bool {
        if let Some(current) = &self.presentation {
            if Weak::ptr_eq(current, &presentation) {
                return self.installed.is_empty();
            }
        }
        self.detach();
        self.presentation = Some(presentation);
        true
    }

    /// Clears the route from the current presentation before letting go of it.
    pub fn detach(&mut self) {
        self.uninstall(false);
        self.hide_preview();
        self.presentation = None;
    }

    pub fn presentation(&self) -> Option<Arc<dyn PresentationLayer>> {
        self.presentation.as_ref()?.upgrade()
    }

    pub fn install(&mut self, artifact: &RouteArtifact, profile: &ProfileDescriptor) {
        if !artifact.is_valid() {
            log::warn!(
                "not publishing a route with {} points",
                artifact.polyline().len()
            );
            return;
        }
        let Some(presentation) = self.presentation() else {
            return;
        };
        let handle = presentation.add_segment(build_segment(artifact, profile));
        log::debug!("installed route segment {:?}", handle);
        self.installed.push(handle);
    }

    /// Removes every installed segment. Calling it twice does nothing the
    /// second time.
    pub fn uninstall(&mut self, deactivate_following: bool) {
        let handles = std::mem::take(&mut self.installed);
        let Some(presentation) = self.presentation() else {
            return;
        };
        for handle in handles {
            presentation.remove_segment(handle, deactivate_following);
        }
    }

    pub fn installed(&self) -> &[SegmentHandle] {
        &self.installed
    }

    pub fn show_preview(&self, points: &[Coordinate]) {
        if let Some(presentation) = self.presentation() {
            for pair in points.windows(2) {
                presentation.add_preview_segment(pair[0], pair[1]);
            }
        }
    }

    pub fn hide_preview(&self) {
        if let Some(presentation) = self.presentation() {
            presentation.remove_all_preview_segments();
        }
    }

    pub fn show_rect(&self, rect: GeoRect, scale: f64) {
        if let Some(presentation) = self.presentation() {
            presentation.set_viewport(rect.scaled(scale), true);
        }
    }

    pub fn current_position(&self) -> Option<Coordinate> {
        self.presentation()?.current_position()
    }

    pub fn stop_location_follow(&self) {
        if let Some(presentation) = self.presentation() {
            presentation.stop_location_follow();
        }
    }

    pub fn deactivate_route_following(&self) {
        if let Some(presentation) = self.presentation() {
            presentation.deactivate_route_following();
        }
    }
}

#[cfg(test)]
mod tests {
    use model::{ExampleData, RouterProfile};

    use super::*;
    use crate::{
        memory::{PresentationCall, RecordingPresentation},
        profile::descriptor,
    };

    fn attached() -> (Arc<RecordingPresentation>, RoutePublisher) {
        let presentation = Arc::new(RecordingPresentation::default());
        let mut publisher = RoutePublisher::default();
        let layer: Arc<dyn PresentationLayer> = presentation.clone();
        publisher.attach(Arc::downgrade(&layer));
        (presentation, publisher)
    }

    #[test]
    fn styling_follows_the_profile() {
        let route = RouteArtifact::example_data();

        let car = build_segment(&route, descriptor(RouterProfile::Vehicle));
        assert_eq!(car.traffic.len(), 2);
        assert_eq!(car.turn_distances_m, vec![470.0]);
        assert_eq!(car.polyline, route.polyline());

        let bicycle = build_segment(&route, descriptor(RouterProfile::Bicycle));
        assert!(bicycle.traffic.is_empty());
        assert_eq!(bicycle.turn_distances_m, vec![470.0]);

        let pedestrian = build_segment(&route, descriptor(RouterProfile::Pedestrian));
        assert!(pedestrian.traffic.is_empty());
        assert!(pedestrian.turn_distances_m.is_empty());
        assert!(pedestrian.style.pattern.is_some());
    }

    #[test]
    fn install_then_uninstall_is_idempotent() {
        let (presentation, mut publisher) = attached();
        let profile = descriptor(RouterProfile::Vehicle);

        publisher.install(&RouteArtifact::example_data(), profile);
        assert_eq!(publisher.installed().len(), 1);
        assert_eq!(presentation.segments().len(), 1);

        publisher.uninstall(true);
        publisher.uninstall(true);
        assert!(publisher.installed().is_empty());
        assert!(presentation.segments().is_empty());

        let removals = presentation
            .calls()
            .into_iter()
            .filter(|call| matches!(call, PresentationCall::RemoveSegment(_, true)))
            .count();
        assert_eq!(removals, 1);
    }

    #[test]
    fn degenerate_routes_are_not_installed() {
        let (presentation, mut publisher) = attached();
        let route = RouteArtifact::new(vec![Coordinate::new(1.0, 1.0)]);
        publisher.install(&route, descriptor(RouterProfile::Vehicle));
        assert!(publisher.installed().is_empty());
        assert!(presentation.calls().is_empty());
    }

    #[test]
    fn dropped_presentation_turns_calls_into_no_ops() {
        let (presentation, mut publisher) = attached();
        publisher.install(&RouteArtifact::example_data(), descriptor(RouterProfile::Taxi));
        drop(presentation);

        assert!(publisher.presentation().is_none());
        assert!(publisher.current_position().is_none());
        publisher.uninstall(false);
        assert!(publisher.installed().is_empty());
        publisher.install(&RouteArtifact::example_data(), descriptor(RouterProfile::Taxi));
        assert!(publisher.installed().is_empty());
    }

    #[test]
    fn reattaching_the_same_presentation_keeps_one_copy() {
        let (presentation, mut publisher) = attached();
        publisher.install(&RouteArtifact::example_data(), descriptor(RouterProfile::Vehicle));

        let layer: Arc<dyn PresentationLayer> = presentation.clone();
        assert!(!publisher.attach(Arc::downgrade(&layer)));
        assert_eq!(presentation.segments().len(), 1);

        publisher.uninstall(true);
        assert!(presentation.segments().is_empty());
    }

    #[test]
    fn switching_presentations_clears_the_old_one() {
        let (old, mut publisher) = attached();
        publisher.install(&RouteArtifact::example_data(), descriptor(RouterProfile::Vehicle));
        publisher.show_preview(&[Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)]);

        let new = Arc::new(RecordingPresentation::default());
        let layer: Arc<dyn PresentationLayer> = new.clone();
        assert!(publisher.attach(Arc::downgrade(&layer)));
        assert!(old.segments().is_empty());
        assert_eq!(old.preview_count(), 0);
        assert!(publisher.installed().is_empty());
    }

    #[test]
    fn detach_removes_the_route() {
        let (presentation, mut publisher) = attached();
        publisher.install(&RouteArtifact::example_data(), descriptor(RouterProfile::Vehicle));
        publisher.detach();

        assert!(presentation.segments().is_empty());
        assert!(publisher.presentation().is_none());
        publisher.uninstall(true);
        assert!(presentation.segments().is_empty());
    }

    #[test]
    fn preview_connects_consecutive_points() {
        let (presentation, publisher) = attached();
        publisher.show_preview(&[
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.5, 0.5),
            Coordinate::new(1.0, 1.0),
        ]);
        assert_eq!(presentation.preview_count(), 2);
        publisher.hide_preview();
        assert_eq!(presentation.preview_count(), 0);
    }
}
