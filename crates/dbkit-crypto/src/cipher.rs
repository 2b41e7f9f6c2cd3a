use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, CHACHA20_POLY1305, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{CryptoError, CryptoResult};
use crate::key::EncryptionKey;

/// Authentication tag length appended by ChaCha20-Poly1305.
pub const TAG_LEN: usize = 16;

/// ChaCha20-Poly1305 sealer for whole payloads.
///
/// Sealed format: `[nonce(12)][ciphertext][tag(16)]`. Nonces are drawn from
/// the system RNG for every call.
pub struct Cipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl Cipher {
    /// Build a cipher for `key`.
    pub fn new(key: &EncryptionKey) -> CryptoResult<Self> {
        let unbound =
            UnboundKey::new(&CHACHA20_POLY1305, key.as_bytes()).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Shorthand for `Cipher::new(&EncryptionKey::from_password(..))`.
    pub fn from_password(password: &str) -> CryptoResult<Self> {
        Self::new(&EncryptionKey::from_password(password))
    }

    /// Encrypt and authenticate `plaintext` in place, binding it to `aad`.
    ///
    /// The buffer is reused for the sealed output.
    pub fn seal(&self, plaintext: Vec<u8>, aad: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::Rng)?;

        let mut sealed = plaintext;
        sealed.reserve_exact(NONCE_LEN + TAG_LEN);
        let tag = self
            .key
            .seal_in_place_separate_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from(aad),
                &mut sealed,
            )
            .map_err(|_| CryptoError::SealFailed)?;
        sealed.extend_from_slice(tag.as_ref());
        sealed.splice(0..0, nonce_bytes);
        Ok(sealed)
    }

    /// Verify and decrypt a payload produced by [`Cipher::seal`], in place.
    pub fn open(&self, sealed: Vec<u8>, aad: &[u8]) -> CryptoResult<Vec<u8>> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Truncated { len: sealed.len() });
        }
        let nonce = Nonce::try_assume_unique_for_key(&sealed[..NONCE_LEN])
            .map_err(|_| CryptoError::AuthenticationFailed)?;

        let mut buf = sealed;
        let plain_len = self
            .key
            .open_within(nonce, Aad::from(aad), &mut buf, NONCE_LEN..)
            .map_err(|_| CryptoError::AuthenticationFailed)?
            .len();
        buf.truncate(plain_len);
        Ok(buf)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("algorithm", &"ChaCha20-Poly1305")
            .finish()
    }
}
