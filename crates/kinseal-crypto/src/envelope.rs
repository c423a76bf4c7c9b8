//! AES-256-GCM envelopes
//!
//! An envelope is a ciphertext plus the nonce it was sealed under:
//! ```text
//! ciphertext = [N bytes: encrypted plaintext][16 bytes: GCM tag]
//! nonce      = [12 bytes: random]
//! ```
//!
//! Callers that want a single blob use the sealed framing:
//! ```text
//! [12 bytes: nonce][N bytes: encrypted plaintext][16 bytes: GCM tag]
//! ```
//! There is no version byte; algorithm parameters are fixed.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce as GcmNonce,
};

use crate::entropy::OsEntropy;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::SymmetricKey;
use crate::sealer::Sealer;
use crate::{NONCE_SIZE, TAG_SIZE};

/// A 96-bit AES-GCM nonce.
pub type Nonce = [u8; NONCE_SIZE];

/// Ciphertext (tag appended) together with its nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    ciphertext: Vec<u8>,
    nonce: Nonce,
}

impl Envelope {
    pub fn new(ciphertext: Vec<u8>, nonce: Nonce) -> Self {
        Self { ciphertext, nonce }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn into_parts(self) -> (Vec<u8>, Nonce) {
        (self.ciphertext, self.nonce)
    }

    /// Length of the plaintext this envelope was sealed from.
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_SIZE)
    }

    /// Open the envelope with `key`.
    pub fn open(&self, key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
        decrypt(&self.ciphertext, key, &self.nonce)
    }

    /// Sealed framing: `[12-byte nonce][ciphertext][16-byte tag]`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse the sealed framing written by [`Envelope::to_bytes`].
    ///
    /// Only the length is checked here; authenticity is checked on open.
    pub fn from_bytes(sealed: &[u8]) -> CryptoResult<Self> {
        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::MalformedEnvelope { len: sealed.len() });
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            ciphertext: ciphertext.to_vec(),
            nonce,
        })
    }
}

/// Encrypt `plaintext` under `key` with a fresh nonce from the OS CSPRNG.
///
/// The returned ciphertext is `plaintext.len() + 16` bytes. The nonce must be
/// stored with it; without the nonce the ciphertext cannot be recovered.
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> CryptoResult<Envelope> {
    Sealer::new(OsEntropy).encrypt(plaintext, key)
}

/// Decrypt and verify `ciphertext` (tag appended) under `key` and `nonce`.
///
/// A wrong key, a wrong nonce, or any modified bit all produce
/// [`CryptoError::AuthenticationFailed`] and no plaintext.
pub fn decrypt(ciphertext: &[u8], key: &SymmetricKey, nonce: &[u8]) -> CryptoResult<Vec<u8>> {
    open_with_aad(key, nonce, ciphertext, &[])
}

pub(crate) fn seal_with_aad(
    key: &SymmetricKey,
    nonce: &Nonce,
    plaintext: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .encrypt(
            GcmNonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::EncryptionFailed)
}

pub(crate) fn open_with_aad(
    key: &SymmetricKey,
    nonce: &[u8],
    ciphertext: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    // A malformed nonce or truncated ciphertext can never authenticate;
    // report it the same way as a tag mismatch.
    if nonce.len() != NONCE_SIZE || ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }

    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(
            GcmNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key;

    #[test]
    fn test_hello_world() {
        let key = generate_key().unwrap();
        let envelope = encrypt(b"hello world", &key).unwrap();

        assert_eq!(envelope.ciphertext().len(), 11 + 16);
        assert_eq!(envelope.nonce().len(), 12);

        let plaintext = decrypt(envelope.ciphertext(), &key, envelope.nonce()).unwrap();
        assert_eq!(plaintext, b"hello world");

        let other = generate_key().unwrap();
        let result = decrypt(envelope.ciphertext(), &other, envelope.nonce());
        assert_eq!(result.unwrap_err(), CryptoError::AuthenticationFailed);
    }

    #[test]
    fn test_empty_plaintext() {
        let key = generate_key().unwrap();
        let envelope = encrypt(b"", &key).unwrap();

        assert_eq!(envelope.ciphertext().len(), TAG_SIZE);
        assert_eq!(envelope.plaintext_len(), 0);
        assert!(envelope.open(&key).unwrap().is_empty());
    }

    #[test]
    fn test_same_plaintext_different_ciphertext() {
        let key = generate_key().unwrap();
        let e1 = encrypt(b"same bytes", &key).unwrap();
        let e2 = encrypt(b"same bytes", &key).unwrap();
        assert_ne!(e1.nonce(), e2.nonce());
        assert_ne!(e1.ciphertext(), e2.ciphertext());
    }

    #[test]
    fn test_tag_is_appended() {
        let key = generate_key().unwrap();
        let plaintext = vec![0x5Au8; 64];
        let envelope = encrypt(&plaintext, &key).unwrap();

        // Truncating the trailing tag must make the envelope unopenable
        let truncated = &envelope.ciphertext()[..plaintext.len()];
        assert_eq!(
            decrypt(truncated, &key, envelope.nonce()).unwrap_err(),
            CryptoError::AuthenticationFailed
        );
    }

    #[test]
    fn test_every_ciphertext_bit_flip_rejected() {
        let key = generate_key().unwrap();
        let envelope = encrypt(b"hello world", &key).unwrap();

        for byte in 0..envelope.ciphertext().len() {
            for bit in 0..8 {
                let mut tampered = envelope.ciphertext().to_vec();
                tampered[byte] ^= 1 << bit;
                assert_eq!(
                    decrypt(&tampered, &key, envelope.nonce()).unwrap_err(),
                    CryptoError::AuthenticationFailed,
                    "flip at byte {byte} bit {bit} must fail"
                );
            }
        }
    }

    #[test]
    fn test_every_nonce_bit_flip_rejected() {
        let key = generate_key().unwrap();
        let envelope = encrypt(b"hello world", &key).unwrap();

        for byte in 0..NONCE_SIZE {
            for bit in 0..8 {
                let mut nonce = *envelope.nonce();
                nonce[byte] ^= 1 << bit;
                assert_eq!(
                    decrypt(envelope.ciphertext(), &key, &nonce).unwrap_err(),
                    CryptoError::AuthenticationFailed,
                    "nonce flip at byte {byte} bit {bit} must fail"
                );
            }
        }
    }

    #[test]
    fn test_wrong_nonce_length_rejected() {
        let key = generate_key().unwrap();
        let envelope = encrypt(b"data", &key).unwrap();

        for len in [0, 11, 13, 24] {
            let nonce = vec![0u8; len];
            assert_eq!(
                decrypt(envelope.ciphertext(), &key, &nonce).unwrap_err(),
                CryptoError::AuthenticationFailed
            );
        }
    }

    #[test]
    fn test_ciphertext_shorter_than_tag_rejected() {
        let key = generate_key().unwrap();
        let nonce = [0u8; NONCE_SIZE];
        assert_eq!(
            decrypt(&[0u8; TAG_SIZE - 1], &key, &nonce).unwrap_err(),
            CryptoError::AuthenticationFailed
        );
    }

    #[test]
    fn test_sealed_framing_layout() {
        let key = generate_key().unwrap();
        let envelope = encrypt(b"framed", &key).unwrap();
        let sealed = envelope.to_bytes();

        assert_eq!(sealed.len(), NONCE_SIZE + 6 + TAG_SIZE);
        assert_eq!(&sealed[..NONCE_SIZE], envelope.nonce());
        assert_eq!(&sealed[NONCE_SIZE..], envelope.ciphertext());

        let parsed = Envelope::from_bytes(&sealed).unwrap();
        assert_eq!(parsed, envelope);
        assert_eq!(parsed.open(&key).unwrap(), b"framed");
    }

    #[test]
    fn test_sealed_framing_rejects_short_input() {
        let err = Envelope::from_bytes(&[0u8; NONCE_SIZE + TAG_SIZE - 1]).unwrap_err();
        assert_eq!(err, CryptoError::MalformedEnvelope { len: 27 });

        // nonce + bare tag is the minimum (empty plaintext)
        assert!(Envelope::from_bytes(&[0u8; NONCE_SIZE + TAG_SIZE]).is_ok());
    }

    #[test]
    fn test_into_parts() {
        let key = generate_key().unwrap();
        let envelope = encrypt(b"parts", &key).unwrap();
        let nonce = *envelope.nonce();
        let (ciphertext, returned_nonce) = envelope.into_parts();
        assert_eq!(returned_nonce, nonce);
        assert_eq!(decrypt(&ciphertext, &key, &nonce).unwrap(), b"parts");
    }
}
