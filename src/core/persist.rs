//! FR-008: Preferences file locations and atomic reads/writes.

use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory of the per-user configuration directory.
pub const CONFIG_DIR_NAME: &str = "fresar";

/// Default preferences file name.
pub const DEFAULT_CONFIG_BASENAME: &str = "preferences.conf";

/// The per-user configuration directory, created on demand. `None` when no
/// user configuration directory can be determined or created.
pub fn config_dir() -> Option<PathBuf> {
    let dir = dirs::config_dir()?.join(CONFIG_DIR_NAME);
    if !dir.is_dir() {
        fs::create_dir_all(&dir).ok()?;
    }
    Some(dir)
}

/// Path of a named configuration file inside the per-user directory;
/// `preferences.conf` when no name is given.
pub fn config_file_path(name: Option<&str>) -> Option<PathBuf> {
    Some(config_dir()?.join(name.unwrap_or(DEFAULT_CONFIG_BASENAME)))
}

/// Read a configuration file into text.
pub fn read_config(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))
}

/// Write configuration text atomically (temp file + rename).
pub fn write_config(path: &Path, text: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
        }
    }
    let tmp_path = path.with_extension("conf.tmp");
    fs::write(&tmp_path, text)
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        format!(
            "cannot rename {} -> {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;
    Ok(())
}
