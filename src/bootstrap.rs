//! Scaffold a new site: the four conventional directories under the source
//! directory.

use crate::config::Config;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Create any missing source directories. Returns every directory name in
/// `paths` order, created or already present.
pub fn bootstrap(config: &Config) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for name in config.paths.all() {
        let dir = config.source_dir.join(name);
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "bootstrap directory");
        dirs.push(PathBuf::from(name));
    }
    Ok(dirs)
}
