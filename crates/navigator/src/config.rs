use std::{env, path::PathBuf, time::Duration};

use model::Coordinate;

pub struct NavigatorConfig {
    pub data_dir: PathBuf,
    pub start: Coordinate,
    pub finish: Coordinate,
    /// Zero means unlimited.
    pub build_time_budget: Duration,
    pub position_interval: Duration,
}

impl NavigatorConfig {
    /// Reads `NAV_DATA_DIR`, `NAV_START`, `NAV_FINISH` (as `lat,lon`),
    /// `NAV_BUILD_TIMEOUT_SECS` and `NAV_POSITION_INTERVAL_MS`. Kiel
    /// main station to Raisdorf if nothing is set.
    pub fn from_env() -> Self {
        let data_dir = env::var("NAV_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let start = coordinate("NAV_START").unwrap_or(Coordinate::new(54.3149, 10.1320));
        let finish = coordinate("NAV_FINISH").unwrap_or(Coordinate::new(54.2797, 10.2496));
        let build_time_budget = number("NAV_BUILD_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(Duration::ZERO);
        let position_interval = number("NAV_POSITION_INTERVAL_MS")
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(200));
        Self {
            data_dir,
            start,
            finish,
            build_time_budget,
            position_interval,
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn reviews_path(&self) -> PathBuf {
        self.data_dir.join("ugc.json")
    }
}

fn number(key: &str) -> Option<u64> {
    env::var(key).ok()?.parse().ok()
}

fn coordinate(key: &str) -> Option<Coordinate> {
    let value = env::var(key).ok()?;
    let (latitude, longitude) = value.split_once(',')?;
    let parsed = Coordinate::new(
        latitude.trim().parse().ok()?,
        longitude.trim().parse().ok()?,
    );
    Some(parsed)
}
