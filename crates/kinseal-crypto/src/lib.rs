//! kinseal-crypto: client-side file sealing for kinseal
//!
//! Every uploaded document (certificate scan, profile image, ...) is sealed
//! with AES-256-GCM before it leaves the client and opened again after it is
//! fetched back.
//!
//! ```text
//! generate_key ──► export_key ──► (external secret store) ──► import_key
//!                                                               │
//!          plaintext ──► encrypt(key) ──► Envelope { ciphertext || tag, nonce }
//!                                               │
//!          plaintext ◄── decrypt(key, nonce) ◄──┘   or AuthenticationFailed
//! ```
//!
//! Algorithm identity is fixed: 256-bit key, 96-bit random nonce, 128-bit tag
//! appended to the ciphertext, no associated data unless the caller opts in
//! through [`Sealer::encrypt_bound`].

pub mod codec;
pub mod entropy;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod sealer;

pub use codec::{export_key, import_key};
pub use entropy::{EntropySource, OsEntropy, SeededEntropy};
pub use envelope::{decrypt, encrypt, Envelope, Nonce};
pub use error::{CryptoError, CryptoResult};
pub use keys::{generate_key, SymmetricKey};
pub use sealer::Sealer;

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
