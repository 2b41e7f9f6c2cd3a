use zeroize::{Zeroize, ZeroizeOnDrop};

/// BLAKE3 key-derivation context for password keys.
const PASSWORD_CONTEXT: &str = "dbkit 2021-07-11 large-object password key v1";

/// 256-bit symmetric key, erased from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Derive a key from a password with BLAKE3's key-derivation mode.
    ///
    /// The derivation is deterministic so the same password reopens the same
    /// store. It is a one-way hash, not a password-stretching function.
    pub fn from_password(password: &str) -> Self {
        Self(blake3::derive_key(PASSWORD_CONTEXT, password.as_bytes()))
    }

    /// Wrap raw key material.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptionKey(<redacted>)")
    }
}
