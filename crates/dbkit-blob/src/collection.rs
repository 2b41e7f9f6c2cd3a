use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dbkit_crypto::{Cipher, ContentHash};
use tracing::{debug, warn};

use crate::error::{BlobError, BlobResult};

/// Transaction handle accepted by large-object operations.
///
/// Carries no isolation or atomicity: each operation takes effect on its own
/// as soon as it returns. It exists so large-object calls have the same shape
/// as key-value calls.
#[derive(Debug, Default)]
pub struct BlobTxn {
    _private: (),
}

impl BlobTxn {
    pub fn commit(self) {}

    pub fn abort(self) {}
}

/// Upload/download/delete contract for a named set of large objects.
pub trait LargeObjectCollection: Send + Sync {
    fn name(&self) -> &str;

    fn exists(&self, key: &str) -> BlobResult<bool>;

    /// Store the file at `source` under `key`. An existing object under `key`
    /// is left untouched.
    fn upload(&self, key: &str, source: &Path, txn: Option<&mut BlobTxn>) -> BlobResult<()>;

    /// Write the plaintext of `key` to `destination`.
    fn download(&self, key: &str, destination: &Path, txn: Option<&BlobTxn>) -> BlobResult<()>;

    /// Remove `key`. Returns whether an object was there.
    fn delete(&self, key: &str, txn: Option<&mut BlobTxn>) -> BlobResult<bool>;

    /// Upload `source` under the hex BLAKE3 hash of its contents and return
    /// that hash.
    fn upload_content_addressed(
        &self,
        source: &Path,
        txn: Option<&mut BlobTxn>,
    ) -> BlobResult<ContentHash> {
        let hash = ContentHash::of_file(source)?;
        self.upload(&hash.to_hex(), source, txn)?;
        Ok(hash)
    }
}

/// Large-object collection stored as one file per key in a directory.
///
/// Plaintext objects are streamed between files. Encrypted objects are sealed
/// as a single unit, so one copy of the payload is held in memory while it is
/// sealed or opened.
pub struct DirBlobCollection {
    name: String,
    dir: PathBuf,
    cipher: Option<Arc<Cipher>>,
}

impl DirBlobCollection {
    /// Open (creating if needed) the collection directory.
    pub fn open(name: &str, dir: PathBuf, cipher: Option<Arc<Cipher>>) -> BlobResult<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            name: name.to_string(),
            dir,
            cipher,
        })
    }

    /// Directory holding this collection's objects.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    fn path_for(&self, key: &str) -> BlobResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    fn not_found(&self, key: &str) -> BlobError {
        BlobError::NotFound {
            collection: self.name.clone(),
            key: key.to_string(),
        }
    }
}

impl LargeObjectCollection for DirBlobCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, key: &str) -> BlobResult<bool> {
        Ok(self.path_for(key)?.is_file())
    }

    fn upload(&self, key: &str, source: &Path, _txn: Option<&mut BlobTxn>) -> BlobResult<()> {
        let path = self.path_for(key)?;
        if path.is_file() {
            debug!(collection = %self.name, key, "object already stored, skipping upload");
            return Ok(());
        }

        // Write to a sibling temp file and rename so readers never see a
        // partial object.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        let bytes = match &self.cipher {
            Some(cipher) => {
                let sealed = cipher.seal(std::fs::read(source)?, key.as_bytes())?;
                tmp.write_all(&sealed)?;
                sealed.len() as u64
            }
            None => io::copy(&mut File::open(source)?, &mut tmp)?,
        };
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(
            collection = %self.name,
            key,
            bytes,
            encrypted = self.cipher.is_some(),
            "uploaded object"
        );
        Ok(())
    }

    fn download(&self, key: &str, destination: &Path, _txn: Option<&BlobTxn>) -> BlobResult<()> {
        let path = self.path_for(key)?;
        let mut stored = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(self.not_found(key)),
            Err(e) => return Err(e.into()),
        };

        let bytes = match &self.cipher {
            Some(cipher) => {
                let mut sealed = Vec::new();
                stored.read_to_end(&mut sealed)?;
                let plaintext = cipher.open(sealed, key.as_bytes()).map_err(|e| {
                    warn!(collection = %self.name, key, error = %e, "failed to open stored object");
                    e
                })?;
                std::fs::write(destination, &plaintext)?;
                plaintext.len() as u64
            }
            None => io::copy(&mut stored, &mut File::create(destination)?)?,
        };
        debug!(collection = %self.name, key, bytes, "downloaded object");
        Ok(())
    }

    fn delete(&self, key: &str, _txn: Option<&mut BlobTxn>) -> BlobResult<bool> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(collection = %self.name, key, "deleted object");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for DirBlobCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirBlobCollection")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

/// Keys become file names, so they must name a single plain path component.
pub(crate) fn validate_key(key: &str) -> BlobResult<()> {
    let reason = if key.is_empty() {
        Some("empty")
    } else if key == "." || key == ".." {
        Some("reserved name")
    } else if key.contains(['/', '\\', '\0']) {
        Some("contains a path separator")
    } else if key.starts_with('.') {
        Some("leading dot")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(BlobError::InvalidKey {
            key: key.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
