use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use dbkit_crypto::Cipher;
use tracing::{debug, info};

use crate::collection::{validate_key, BlobTxn, DirBlobCollection};
use crate::config::BlobConfig;
use crate::error::BlobResult;

/// Registry of large-object collections under one root directory.
///
/// The encryption key, if any, is derived once here and shared by every
/// collection the store opens.
pub struct BlobStore {
    root: PathBuf,
    cipher: Option<Arc<Cipher>>,
    collections: RwLock<HashMap<String, Arc<DirBlobCollection>>>,
}

impl BlobStore {
    /// Open (creating if needed) the root directory and derive the key, if a
    /// password is configured.
    pub fn open(config: BlobConfig) -> BlobResult<Self> {
        std::fs::create_dir_all(&config.root)?;
        let cipher = config
            .password
            .as_deref()
            .map(Cipher::from_password)
            .transpose()?
            .map(Arc::new);

        info!(
            root = %config.root.display(),
            encrypted = cipher.is_some(),
            "opened large-object store"
        );

        Ok(Self {
            root: config.root,
            cipher,
            collections: RwLock::new(HashMap::new()),
        })
    }

    /// Directory holding the collection directories.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` if objects are sealed at rest.
    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Create the named collection's directory if it does not exist yet.
    pub fn create_collection(&self, name: &str) -> BlobResult<()> {
        self.open_collection(name).map(|_| ())
    }

    /// Look up a collection opened through this store.
    pub fn get_collection(&self, name: &str) -> Option<Arc<DirBlobCollection>> {
        self.collections
            .read()
            .expect("lock poisoned")
            .get(name)
            .cloned()
    }

    /// Create-if-absent, then return the collection.
    pub fn open_collection(&self, name: &str) -> BlobResult<Arc<DirBlobCollection>> {
        validate_key(name)?;
        let mut collections = self.collections.write().expect("lock poisoned");
        if let Some(existing) = collections.get(name) {
            return Ok(Arc::clone(existing));
        }
        let collection = Arc::new(DirBlobCollection::open(
            name,
            self.root.join(name),
            self.cipher.clone(),
        )?);
        debug!(collection = name, "opened large-object collection");
        collections.insert(name.to_string(), Arc::clone(&collection));
        Ok(collection)
    }

    /// Names of all collections opened through this store, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Start a large-object transaction. See [`BlobTxn`].
    pub fn begin(&self) -> BlobTxn {
        BlobTxn::default()
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("root", &self.root)
            .field("encrypted", &self.is_encrypted())
            .field("collections", &self.collection_names())
            .finish()
    }
}
