use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Construction-time settings for a [`BlobStore`](crate::BlobStore).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Directory holding one sub-directory per collection.
    pub root: PathBuf,
    /// Enables encryption at rest. Never written back out.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl BlobConfig {
    /// Plaintext store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            password: None,
        }
    }

    /// Encrypted store rooted at `root`.
    pub fn encrypted(root: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            password: Some(password.into()),
        }
    }
}

impl std::fmt::Debug for BlobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobConfig")
            .field("root", &self.root)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
