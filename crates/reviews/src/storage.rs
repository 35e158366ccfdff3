use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{FeatureId, UgcUpdate};

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl std::error::Error for StorageError {}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageError::Io(why) => write!(f, "review storage error: {}", why),
            StorageError::Json(why) => write!(f, "review storage is corrupt: {}", why),
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(why: io::Error) -> Self {
        StorageError::Io(why)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(why: serde_json::Error) -> Self {
        StorageError::Json(why)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUpdate {
    feature: FeatureId,
    update: UgcUpdate,
}

/// Local review updates, kept as a JSON array in a single file in the order
/// they were first written.
#[derive(Debug)]
pub struct ReviewStorage {
    path: PathBuf,
    updates: IndexMap<FeatureId, UgcUpdate>,
}

impl ReviewStorage {
    /// Loads the file, starting empty if it does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let updates = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str::<Vec<StoredUpdate>>(&text)?
                .into_iter()
                .map(|stored| (stored.feature, stored.update))
                .collect(),
            Err(why) if why.kind() == io::ErrorKind::NotFound => IndexMap::new(),
            Err(why) => return Err(why.into()),
        };
        log::debug!("loaded {} review updates from {:?}", updates.len(), path);
        Ok(Self { path, updates })
    }

    pub fn empty<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            updates: IndexMap::new(),
        }
    }

    pub fn get(&self, feature: &FeatureId) -> Option<&UgcUpdate> {
        self.updates.get(feature)
    }

    /// Stores `update` for `feature`. Nothing changes if the file cannot be
    /// written.
    pub fn set(&mut self, feature: FeatureId, update: UgcUpdate) -> Result<(), StorageError> {
        let previous = self.updates.insert(feature.clone(), update);
        if let Err(why) = self.write() {
            match previous {
                Some(previous) => {
                    self.updates.insert(feature, previous);
                }
                None => {
                    self.updates.shift_remove(&feature);
                }
            }
            return Err(why);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    fn write(&self) -> Result<(), StorageError> {
        let stored = self
            .updates
            .iter()
            .map(|(feature, update)| StoredUpdate {
                feature: feature.clone(),
                update: update.clone(),
            })
            .collect::<Vec<_>>();
        fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::model::Attribute;

    use super::*;

    #[test]
    fn updates_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ugc.json");

        let mut storage = ReviewStorage::open(&path).unwrap();
        assert!(storage.is_empty());
        let update = UgcUpdate {
            text: Some("Great view".to_owned()),
            attributes: vec![Attribute::new("wifi", "free")],
            ..Default::default()
        };
        storage
            .set(FeatureId::new("Kiel", 7), update.clone())
            .unwrap();
        storage
            .set(FeatureId::new("Kiel", 2), UgcUpdate::default())
            .unwrap();

        let reopened = ReviewStorage::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get(&FeatureId::new("Kiel", 7)), Some(&update));
        assert_eq!(reopened.get(&FeatureId::new("Kiel", 8)), None);
    }

    #[test]
    fn failed_write_keeps_the_previous_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ugc.json");
        let feature = FeatureId::new("Kiel", 3);
        let kept = UgcUpdate {
            text: Some("Quiet".to_owned()),
            ..Default::default()
        };
        let mut storage = ReviewStorage::open(&path).unwrap();
        storage.set(feature.clone(), kept.clone()).unwrap();

        // a directory in place of the file makes every write fail
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        let rejected = UgcUpdate {
            text: Some("Loud".to_owned()),
            ..Default::default()
        };
        assert!(storage.set(feature.clone(), rejected.clone()).is_err());
        assert_eq!(storage.get(&feature), Some(&kept));

        let other = FeatureId::new("Kiel", 4);
        assert!(storage.set(other.clone(), rejected).is_err());
        assert_eq!(storage.get(&other), None);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ugc.json");
        fs::write(&path, "[{").unwrap();
        assert!(matches!(
            ReviewStorage::open(&path),
            Err(StorageError::Json(_))
        ));
    }
}
