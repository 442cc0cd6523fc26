use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tuxseo_engine::{
    ensure_store_dir, key_filename, project_settings_key, AtomicFileWriter, CachedFeatures,
    FileStore, LocalStore, SettingsCache, UserSettings,
};

#[test]
fn creates_missing_store_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("store");
    assert!(!new_dir.exists());
    ensure_store_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("value.json", r#"{"a":1}"#).unwrap();
    let second = writer.write("value.json", r#"{"b":2}"#).unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), r#"{"b":2}"#);

    // Only the target remains; temp files were renamed away.
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn write_into_file_path_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("value.json", "{}").is_err());
    assert_eq!(fs::read_to_string(&file_path).unwrap(), "x");
}

#[test]
fn file_store_round_trips_and_removes() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path().join("store"));

    assert_eq!(store.get("currentProject"), None);
    store.set("currentProject", r#"{"project_id":1}"#).unwrap();
    assert_eq!(
        store.get("currentProject").as_deref(),
        Some(r#"{"project_id":1}"#)
    );
    assert!(temp
        .path()
        .join("store")
        .join(key_filename("currentProject"))
        .is_file());

    store.remove("currentProject").unwrap();
    store.remove("currentProject").unwrap();
    assert_eq!(store.get("currentProject"), None);
}

#[test]
fn settings_survive_a_new_store_instance() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().to_path_buf();
    let settings = UserSettings {
        profile: serde_json::json!({"has_pro_subscription": false}),
        project: serde_json::json!({"has_auto_submission_setting": true}),
    };
    SettingsCache::new(Arc::new(FileStore::new(dir.clone())))
        .store_user_settings(11, &settings)
        .unwrap();

    let reopened = Arc::new(FileStore::new(dir));
    assert!(reopened.get(&project_settings_key(11)).is_some());
    assert_eq!(
        SettingsCache::new(reopened).project_features(11),
        CachedFeatures {
            has_auto_submission_setting: true,
            has_pro_subscription: false,
        }
    );
}
