use std::io::Read;
use std::path::Path;

use crate::error::{CryptoError, CryptoResult};

/// BLAKE3 digest of a payload, rendered as lowercase hex when used as a key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash an in-memory payload.
    pub fn of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hash everything `reader` yields.
    pub fn of_reader(mut reader: impl Read) -> CryptoResult<Self> {
        let mut hasher = blake3::Hasher::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// Hash a file's contents without loading it whole.
    pub fn of_file(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::of_reader(std::io::BufReader::new(file))
    }

    /// Parse a 64-character hex digest.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidHash(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidHash(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self(arr))
    }

    /// Lowercase hex form, used as the large-object key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}
