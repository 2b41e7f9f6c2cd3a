use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Construction-time settings for an [`LmdbBackend`](crate::LmdbBackend).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmdbConfig {
    /// Directory holding the LMDB data and lock files.
    pub path: PathBuf,
    /// Maximum number of named collections (LMDB sub-databases).
    pub max_collections: u32,
    /// Maximum number of concurrent read transactions.
    pub max_readers: u32,
    /// Pre-allocated address space in bytes. Bounds the database size.
    pub map_size: usize,
    /// Open the environment read-only. Write transactions are refused.
    pub read_only: bool,
}

impl LmdbConfig {
    /// Default settings rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for LmdbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data"),
            max_collections: 32,
            max_readers: 126,
            map_size: 1024 * 1024 * 1024,
            read_only: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = LmdbConfig::default();
        assert_eq!(c.max_collections, 32);
        assert_eq!(c.max_readers, 126);
        assert_eq!(c.map_size, 1024 * 1024 * 1024);
        assert!(!c.read_only);
    }

    #[test]
    fn new_overrides_path_only() {
        let c = LmdbConfig::new("/tmp/cards");
        assert_eq!(c.path, PathBuf::from("/tmp/cards"));
        assert_eq!(c.max_collections, LmdbConfig::default().max_collections);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: LmdbConfig = toml::from_str(
            r#"
            path = "/var/lib/cards"
            map_size = 1048576
            "#,
        )
        .unwrap();
        assert_eq!(c.path, PathBuf::from("/var/lib/cards"));
        assert_eq!(c.map_size, 1_048_576);
        assert_eq!(c.max_readers, 126);
    }
}
