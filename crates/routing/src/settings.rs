use std::{
    collections::HashMap,
    fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Mutex, PoisonError},
};

use indexmap::IndexMap;
use model::RouterProfile;

pub const ROUTER_KEY: &str = "router";
pub const UNITS_KEY: &str = "units";

/// Process wide key value settings.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

pub fn get_parsed<T: FromStr>(store: &dyn SettingsStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("ignoring invalid setting {} = {:?}", key, value);
            None
        }
    }
}

/// The router profile used last, `Vehicle` if none was stored yet.
pub fn last_used_router(store: &dyn SettingsStore) -> RouterProfile {
    get_parsed(store, ROUTER_KEY).unwrap_or_default()
}

pub fn set_last_used_router(store: &dyn SettingsStore, profile: RouterProfile) {
    store.set(ROUTER_KEY, profile.to_string());
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MeasurementUnits {
    #[default]
    Metric,
    Imperial,
}

impl FromStr for MeasurementUnits {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MeasurementUnits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Metric => write!(f, "metric"),
            Self::Imperial => write!(f, "imperial"),
        }
    }
}

pub fn measurement_units(store: &dyn SettingsStore) -> MeasurementUnits {
    get_parsed(store, UNITS_KEY).unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl std::error::Error for SettingsError {}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SettingsError::Io(why) => write!(f, "settings file error: {}", why),
            SettingsError::Json(why) => write!(f, "settings parse error: {}", why),
        }
    }
}

impl From<io::Error> for SettingsError {
    fn from(why: io::Error) -> Self {
        SettingsError::Io(why)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(why: serde_json::Error) -> Self {
        SettingsError::Json(why)
    }
}

/// Settings kept in a JSON object on disk. Every `set` rewrites the file.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Mutex<IndexMap<String, String>>,
}

impl JsonFileSettings {
    /// Loads the file, starting empty if it does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(why) if why.kind() == io::ErrorKind::NotFound => IndexMap::new(),
            Err(why) => return Err(why.into()),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn write(&self, values: &IndexMap<String, String>) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_owned(), value);
        if let Err(why) = self.write(&values) {
            log::error!("could not store setting {}: {}", key, why);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_defaults_to_vehicle() {
        let settings = MemorySettings::default();
        assert_eq!(last_used_router(&settings), RouterProfile::Vehicle);

        settings.set(ROUTER_KEY, "hovercraft".to_owned());
        assert_eq!(last_used_router(&settings), RouterProfile::Vehicle);

        set_last_used_router(&settings, RouterProfile::Bicycle);
        assert_eq!(last_used_router(&settings), RouterProfile::Bicycle);
    }

    #[test]
    fn file_settings_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = JsonFileSettings::open(&path).unwrap();
        assert_eq!(settings.get(ROUTER_KEY), None);
        set_last_used_router(&settings, RouterProfile::Pedestrian);
        settings.set(UNITS_KEY, MeasurementUnits::Imperial.to_string());
        drop(settings);

        let reopened = JsonFileSettings::open(&path).unwrap();
        assert_eq!(last_used_router(&reopened), RouterProfile::Pedestrian);
        assert_eq!(measurement_units(&reopened), MeasurementUnits::Imperial);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonFileSettings::open(&path),
            Err(SettingsError::Json(_))
        ));
    }
}
