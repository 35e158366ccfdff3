//! Everything that depends on the router profile, gathered in one descriptor
//! per profile: the cost model handed to the path search, the settings that
//! drive route following and the styling of the published route.

use model::RouterProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostModel {
    Car,
    Pedestrian,
    Bicycle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutingSettings {
    /// Snap the displayed position onto the route.
    pub match_route: bool,
    pub sound_direction: bool,
    /// Farther away from the route than this, the route is rebuilt.
    pub matching_threshold_m: f64,
    pub keep_pedestrian_info: bool,
    pub show_turn_after_next: bool,
    pub speed_cameras_warning: bool,
}

/// Palette entries understood by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteColor {
    Route,
    RoutePedestrian,
    RouteBicycle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePattern {
    pub dash_length: f64,
    pub gap_length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteType {
    Car,
    Pedestrian,
    Bicycle,
    Taxi,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStyle {
    pub route_type: RouteType,
    pub color: RouteColor,
    /// Solid line if `None`.
    pub pattern: Option<RoutePattern>,
    pub show_traffic: bool,
    pub show_turns: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileDescriptor {
    pub profile: RouterProfile,
    pub cost_model: CostModel,
    pub settings: RoutingSettings,
    pub style: SegmentStyle,
}

const CAR_SETTINGS: RoutingSettings = RoutingSettings {
    match_route: true,
    sound_direction: true,
    matching_threshold_m: 50.0,
    keep_pedestrian_info: false,
    show_turn_after_next: true,
    speed_cameras_warning: true,
};

const PEDESTRIAN_SETTINGS: RoutingSettings = RoutingSettings {
    match_route: false,
    sound_direction: false,
    matching_threshold_m: 20.0,
    keep_pedestrian_info: true,
    show_turn_after_next: false,
    speed_cameras_warning: false,
};

const BICYCLE_SETTINGS: RoutingSettings = RoutingSettings {
    match_route: false,
    sound_direction: false,
    matching_threshold_m: 30.0,
    keep_pedestrian_info: false,
    show_turn_after_next: false,
    speed_cameras_warning: false,
};

static VEHICLE: ProfileDescriptor = ProfileDescriptor {
    profile: RouterProfile::Vehicle,
    cost_model: CostModel::Car,
    settings: CAR_SETTINGS,
    style: SegmentStyle {
        route_type: RouteType::Car,
        color: RouteColor::Route,
        pattern: None,
        show_traffic: true,
        show_turns: true,
    },
};

static PEDESTRIAN: ProfileDescriptor = ProfileDescriptor {
    profile: RouterProfile::Pedestrian,
    cost_model: CostModel::Pedestrian,
    settings: PEDESTRIAN_SETTINGS,
    style: SegmentStyle {
        route_type: RouteType::Pedestrian,
        color: RouteColor::RoutePedestrian,
        pattern: Some(RoutePattern {
            dash_length: 4.0,
            gap_length: 2.0,
        }),
        show_traffic: false,
        show_turns: false,
    },
};

static BICYCLE: ProfileDescriptor = ProfileDescriptor {
    profile: RouterProfile::Bicycle,
    cost_model: CostModel::Bicycle,
    settings: BICYCLE_SETTINGS,
    style: SegmentStyle {
        route_type: RouteType::Bicycle,
        color: RouteColor::RouteBicycle,
        pattern: Some(RoutePattern {
            dash_length: 8.0,
            gap_length: 2.0,
        }),
        show_traffic: false,
        show_turns: true,
    },
};

// Taxi routes are searched like car routes.
static TAXI: ProfileDescriptor = ProfileDescriptor {
    profile: RouterProfile::Taxi,
    cost_model: CostModel::Car,
    settings: CAR_SETTINGS,
    style: SegmentStyle {
        route_type: RouteType::Taxi,
        color: RouteColor::Route,
        pattern: None,
        show_traffic: true,
        show_turns: true,
    },
};

pub fn descriptor(profile: RouterProfile) -> &'static ProfileDescriptor {
    match profile {
        RouterProfile::Vehicle => &VEHICLE,
        RouterProfile::Pedestrian => &PEDESTRIAN,
        RouterProfile::Bicycle => &BICYCLE,
        RouterProfile::Taxi => &TAXI,
    }
}
