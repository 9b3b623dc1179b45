use std::path::{Path, PathBuf};

/// File name of the JSON document store inside the data dir.
pub const FILE_DB_NAME: &str = "local-db.json";
/// File name of the SQLite store inside the data dir.
pub const SQLITE_DB_NAME: &str = "lifeos.db";

/// Per-user data root: `<data dir>/lifeos`, else `~/.lifeos`, else `./.data`.
pub fn default_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("lifeos")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".lifeos")
    } else {
        PathBuf::from(".data")
    }
}

/// Sidecar lock file guarding a store file: `local-db.json` -> `local-db.json.lock`.
pub fn lock_path_for(db_file: &Path) -> PathBuf {
    let mut name = db_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    db_file.with_file_name(name)
}
