use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use healthchat::storage::SledSessionStore;

#[allow(dead_code)]
pub fn create_temp_store() -> (SledSessionStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = SledSessionStore::open(history_path(&tmp)).expect("failed to open sled store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn history_path(dir: &TempDir) -> PathBuf {
    dir.path().join("history.sled")
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
