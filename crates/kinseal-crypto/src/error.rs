use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors surfaced by the sealing engine.
///
/// None of the variants carry key material or the underlying cipher's
/// message: a failed tag check is reported as a bare `AuthenticationFailed`
/// whatever the cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("secure random source unavailable")]
    EntropyUnavailable,

    #[error("malformed key: expected standard base64 encoding of 32 bytes")]
    MalformedKey,

    #[error("authentication failed: wrong key, wrong nonce, or tampered ciphertext")]
    AuthenticationFailed,

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("malformed envelope: {len} bytes is shorter than nonce and tag")]
    MalformedEnvelope { len: usize },
}
