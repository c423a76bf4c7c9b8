//! Symmetric key type and key generation

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::entropy::{EntropySource, OsEntropy};
use crate::error::CryptoResult;
use crate::KEY_SIZE;

/// A 256-bit AES-GCM key. Zeroized on drop.
///
/// Equality is constant time so comparing a re-imported key against the
/// original does not leak where they differ.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    pub(crate) fn zeroed() -> Self {
        Self {
            bytes: [0u8; KEY_SIZE],
        }
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8; KEY_SIZE] {
        &mut self.bytes
    }

    /// Draw a fresh key from `entropy`.
    ///
    /// The bytes are drawn straight into the key, so a source that fails
    /// halfway leaves nothing behind once the partial key is dropped.
    pub fn generate_with<E: EntropySource + ?Sized>(entropy: &E) -> CryptoResult<Self> {
        let mut key = Self::zeroed();
        entropy.fill(key.as_bytes_mut())?;
        Ok(key)
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SymmetricKey {}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit key from the operating system CSPRNG.
pub fn generate_key() -> CryptoResult<SymmetricKey> {
    SymmetricKey::generate_with(&OsEntropy)
}
