//! Storage configuration (spec §3.3 ambient stack): where each
//! `PMap`'s two companion files live. Resolution order mirrors the
//! pack's `DatabaseConnectionInfo::from_env` convention: environment
//! first, CLI override on top of that in the binary.

use std::path::{Path, PathBuf};

const DATA_DIR_VAR: &str = "RAILBOOK_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "./data";

/// Where the persistent maps' files live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve `RAILBOOK_DATA_DIR`, defaulting to `./data` if unset.
    pub fn from_env() -> Self {
        let data_dir = std::env::var(DATA_DIR_VAR).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        Self::new(data_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The data/metadata file pair for one named `PMap`.
    pub fn paths_for(&self, name: &str) -> (PathBuf, PathBuf) {
        (
            self.data_dir.join(format!("{name}.dat")),
            self.data_dir.join(format!("{name}.meta")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_env_unset() {
        std::env::remove_var(DATA_DIR_VAR);
        assert_eq!(StorageConfig::from_env().data_dir(), Path::new(DEFAULT_DATA_DIR));
    }

    #[test]
    fn paths_are_named_after_the_map() {
        let cfg = StorageConfig::new("/tmp/railbook-data");
        let (data, meta) = cfg.paths_for("users");
        assert_eq!(data, Path::new("/tmp/railbook-data/users.dat"));
        assert_eq!(meta, Path::new("/tmp/railbook-data/users.meta"));
    }
}
