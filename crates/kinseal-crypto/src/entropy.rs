//! Randomness sources for key and nonce generation
//!
//! The engine never reaches for a global RNG directly: every draw goes through
//! an [`EntropySource`] handed to it. Production code uses [`OsEntropy`];
//! test harnesses can swap in [`SeededEntropy`] to get reproducible keys and
//! nonces.

use std::sync::Mutex;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::error::{CryptoError, CryptoResult};

/// A cryptographically secure, thread-safe source of random bytes.
///
/// Implementations must fill the whole buffer or fail; a partial or weakened
/// fill is never acceptable.
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> CryptoResult<()>;
}

impl<E: EntropySource + ?Sized> EntropySource for &E {
    fn fill(&self, dest: &mut [u8]) -> CryptoResult<()> {
        (**self).fill(dest)
    }
}

/// The operating system CSPRNG (`getrandom`).
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> CryptoResult<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|_| CryptoError::EntropyUnavailable)
    }
}

/// Deterministic source seeded from a `u64`.
///
/// Only for tests and reproducible fixtures: two instances with the same seed
/// produce the same keys and nonces, which is exactly what must never happen
/// in production.
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn fill(&self, dest: &mut [u8]) -> CryptoResult<()> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| CryptoError::EntropyUnavailable)?;
        rng.try_fill_bytes(dest)
            .map_err(|_| CryptoError::EntropyUnavailable)
    }
}

impl std::fmt::Debug for SeededEntropy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededEntropy").finish_non_exhaustive()
    }
}
