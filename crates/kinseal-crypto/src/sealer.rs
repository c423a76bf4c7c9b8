//! Sealing engine with an injected entropy source
//!
//! [`Sealer`] holds nothing but its [`EntropySource`]; every call is an
//! independent transformation of its inputs. The free functions
//! [`crate::encrypt`], [`crate::decrypt`] and [`crate::generate_key`] are
//! `Sealer<OsEntropy>` shorthands.
//!
//! `encrypt_bound` / `decrypt_bound` additionally authenticate a caller
//! supplied context (file name, owner id, ...) as AES-GCM associated data.
//! The context is not stored in the envelope; the same bytes must be passed
//! again to open it.

use crate::entropy::{EntropySource, OsEntropy};
use crate::envelope::{open_with_aad, seal_with_aad, Envelope, Nonce};
use crate::error::CryptoResult;
use crate::keys::SymmetricKey;
use crate::NONCE_SIZE;

#[derive(Debug, Clone, Default)]
pub struct Sealer<E = OsEntropy> {
    entropy: E,
}

impl<E: EntropySource> Sealer<E> {
    pub fn new(entropy: E) -> Self {
        Self { entropy }
    }

    pub fn entropy(&self) -> &E {
        &self.entropy
    }

    pub fn generate_key(&self) -> CryptoResult<SymmetricKey> {
        SymmetricKey::generate_with(&self.entropy)
    }

    pub fn encrypt(&self, plaintext: &[u8], key: &SymmetricKey) -> CryptoResult<Envelope> {
        self.encrypt_bound(plaintext, key, &[])
    }

    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &SymmetricKey,
        nonce: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        self.decrypt_bound(ciphertext, key, nonce, &[])
    }

    /// Encrypt with `context` bound into the tag as associated data.
    ///
    /// An empty context is identical to [`Sealer::encrypt`].
    pub fn encrypt_bound(
        &self,
        plaintext: &[u8],
        key: &SymmetricKey,
        context: &[u8],
    ) -> CryptoResult<Envelope> {
        let nonce = self.fresh_nonce()?;
        let ciphertext = seal_with_aad(key, &nonce, plaintext, context)?;
        Ok(Envelope::new(ciphertext, nonce))
    }

    pub fn decrypt_bound(
        &self,
        ciphertext: &[u8],
        key: &SymmetricKey,
        nonce: &[u8],
        context: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        open_with_aad(key, nonce, ciphertext, context)
    }

    fn fresh_nonce(&self) -> CryptoResult<Nonce> {
        let mut nonce = [0u8; NONCE_SIZE];
        self.entropy.fill(&mut nonce)?;
        Ok(nonce)
    }
}
