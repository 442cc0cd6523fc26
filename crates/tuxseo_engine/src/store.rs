use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tuxseo_logging::{tux_debug, tux_warn};

use crate::api::{ScannedProject, UserSettings};
use crate::filename::key_filename;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::ProjectId;

pub const USER_PROFILE_KEY: &str = "userProfileSettings";
pub const CURRENT_PROJECT_KEY: &str = "currentProject";
pub const VIEW_STATE_KEY: &str = "viewState";

pub fn project_settings_key(project_id: ProjectId) -> String {
    format!("projectSettings:{project_id}")
}

/// Client-local key/value storage. `set` replaces the whole previous value.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&self, key: &str) -> Result<(), PersistError>;
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    writer: AtomicFileWriter,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.writer.dir().join(key_filename(key));
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                tux_warn!("could not read {}: {err}", path.display());
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let path = self.writer.write(&key_filename(key), value)?;
        tux_debug!("stored {key} at {}", path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.writer.remove(&key_filename(key))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Feature flags read from cached settings. Missing or malformed data means everything is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachedFeatures {
    pub has_auto_submission_setting: bool,
    pub has_pro_subscription: bool,
}

/// Typed access to the values components share through the local store.
#[derive(Clone)]
pub struct SettingsCache {
    store: Arc<dyn LocalStore>,
}

impl SettingsCache {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Reads a JSON value; absent or malformed content reads as `None`.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tux_warn!("ignoring malformed {key}: {err}");
                None
            }
        }
    }

    pub fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PersistError> {
        let encoded =
            serde_json::to_string(value).map_err(|err| PersistError::Encode(err.to_string()))?;
        self.store.set(key, &encoded)
    }

    pub fn store_user_settings(
        &self,
        project_id: ProjectId,
        settings: &UserSettings,
    ) -> Result<(), PersistError> {
        self.save_json(USER_PROFILE_KEY, &settings.profile)?;
        self.save_json(&project_settings_key(project_id), &settings.project)
    }

    pub fn project_features(&self, project_id: ProjectId) -> CachedFeatures {
        let project: Option<Value> = self.load_json(&project_settings_key(project_id));
        let profile: Option<Value> = self.load_json(USER_PROFILE_KEY);
        let flag = |value: &Option<Value>, field: &str| {
            value
                .as_ref()
                .and_then(|v| v.get(field))
                .and_then(Value::as_bool)
        };
        CachedFeatures {
            has_auto_submission_setting: flag(&project, "has_auto_submission_setting")
                .unwrap_or(false),
            has_pro_subscription: flag(&project, "has_pro_subscription")
                .or_else(|| flag(&profile, "has_pro_subscription"))
                .unwrap_or(false),
        }
    }

    pub fn remember_scan(&self, project: &ScannedProject) -> Result<(), PersistError> {
        self.save_json(CURRENT_PROJECT_KEY, project)
    }

    pub fn remembered_scan(&self) -> Option<ScannedProject> {
        self.load_json(CURRENT_PROJECT_KEY)
    }

    pub fn forget_scan(&self) -> Result<(), PersistError> {
        self.store.remove(CURRENT_PROJECT_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache() -> (Arc<MemoryStore>, SettingsCache) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), SettingsCache::new(store))
    }

    #[test]
    fn absent_and_malformed_settings_read_as_disabled() {
        let (store, cache) = cache();
        assert_eq!(cache.project_features(4), CachedFeatures::default());

        store.set(&project_settings_key(4), "{not json").unwrap();
        assert_eq!(cache.project_features(4), CachedFeatures::default());

        store
            .set(&project_settings_key(4), r#"{"has_auto_submission_setting":"yes"}"#)
            .unwrap();
        assert!(!cache.project_features(4).has_auto_submission_setting);
    }

    #[test]
    fn stored_settings_overwrite_previous_value() {
        let (store, cache) = cache();
        store
            .set(
                &project_settings_key(2),
                r#"{"has_auto_submission_setting":true,"stale":1}"#,
            )
            .unwrap();
        let settings = UserSettings {
            profile: json!({"has_pro_subscription": true}),
            project: json!({"has_auto_submission_setting": false}),
        };
        cache.store_user_settings(2, &settings).unwrap();

        let raw = store.get(&project_settings_key(2)).unwrap();
        assert!(!raw.contains("stale"));
        assert_eq!(
            cache.project_features(2),
            CachedFeatures {
                has_auto_submission_setting: false,
                has_pro_subscription: true,
            }
        );
    }

    #[test]
    fn scan_is_remembered_until_forgotten() {
        let (_, cache) = cache();
        let project = ScannedProject {
            project_id: 9,
            name: "Acme".to_string(),
            kind: "SaaS".to_string(),
            url: "https://acme.test".to_string(),
            summary: String::new(),
        };
        cache.remember_scan(&project).unwrap();
        assert_eq!(cache.remembered_scan(), Some(project));
        cache.forget_scan().unwrap();
        assert_eq!(cache.remembered_scan(), None);
        cache.forget_scan().unwrap();
    }
}
