use std::{env, str::FromStr, time::Duration};

/// Two route points closer than this (in degrees, on both axes) are treated
/// as the same point.
pub const DEFAULT_COINCIDENCE_EPSILON: f64 = 1e-7;
pub const DEFAULT_MAX_INTERMEDIATE_POINTS: usize = 3;
/// Route and preview rects are enlarged by this factor before they are shown.
pub const DEFAULT_VIEWPORT_SCALE: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    pub coincidence_epsilon: f64,
    pub max_intermediate_points: usize,
    /// Budget of a rebuild after leaving the route. Zero means unlimited.
    pub rebuild_time_budget: Duration,
    pub viewport_scale: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            coincidence_epsilon: DEFAULT_COINCIDENCE_EPSILON,
            max_intermediate_points: DEFAULT_MAX_INTERMEDIATE_POINTS,
            rebuild_time_budget: Duration::ZERO,
            viewport_scale: DEFAULT_VIEWPORT_SCALE,
        }
    }
}

impl RoutingConfig {
    /// Defaults, overridden by `NAV_COINCIDENCE_EPSILON`,
    /// `NAV_MAX_INTERMEDIATE_POINTS`, `NAV_REBUILD_TIMEOUT_SECS` and
    /// `NAV_VIEWPORT_SCALE` when set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            coincidence_epsilon: env_or("NAV_COINCIDENCE_EPSILON", defaults.coincidence_epsilon),
            max_intermediate_points: env_or(
                "NAV_MAX_INTERMEDIATE_POINTS",
                defaults.max_intermediate_points,
            ),
            rebuild_time_budget: Duration::from_secs(env_or(
                "NAV_REBUILD_TIMEOUT_SECS",
                defaults.rebuild_time_budget.as_secs(),
            )),
            viewport_scale: env_or("NAV_VIEWPORT_SCALE", defaults.viewport_scale),
        }
    }
}

pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("ignoring invalid value {:?} for {}", value, key);
            default
        }),
        Err(_) => default,
    }
}
