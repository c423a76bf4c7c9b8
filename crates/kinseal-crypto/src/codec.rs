//! Key export/import as standard base64
//!
//! The exported form is what leaves the engine for the external secret store:
//! 44 characters of standard-alphabet base64 with padding, no line breaks.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::SymmetricKey;
use crate::KEY_SIZE;

/// Serialize a key to standard base64. Deterministic.
pub fn export_key(key: &SymmetricKey) -> String {
    STANDARD.encode(key.as_bytes())
}

/// Parse a key previously produced by [`export_key`].
///
/// Fails with [`CryptoError::MalformedKey`] if `encoded` is not valid
/// standard base64 or does not decode to exactly 32 bytes.
pub fn import_key(encoded: &str) -> CryptoResult<SymmetricKey> {
    let decoded = Zeroizing::new(
        STANDARD
            .decode(encoded)
            .map_err(|_| CryptoError::MalformedKey)?,
    );

    if decoded.len() != KEY_SIZE {
        return Err(CryptoError::MalformedKey);
    }

    let mut key = SymmetricKey::zeroed();
    key.as_bytes_mut().copy_from_slice(&decoded);
    Ok(key)
}
