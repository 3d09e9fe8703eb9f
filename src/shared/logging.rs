use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default state root for the setup log (`~/.strava-setup`). Secrets are
/// never written here, only stage names and statuses.
pub fn default_state_root() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".strava-setup"))
}

pub fn setup_log_path(state_root: &Path) -> PathBuf {
    state_root.join("logs/setup.log")
}

pub fn append_setup_log_line(state_root: &Path, line: &str) -> std::io::Result<()> {
    let path = setup_log_path(state_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    writeln!(file, "{line}")
}
