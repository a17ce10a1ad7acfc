//! Reversible encryption of stored setting text
//!
//! ChaCha20-Poly1305 with a key derived from the application secret. This is
//! a thin transform for keeping values unreadable at rest, not a vault: there
//! is no key rotation and a lost secret means lost values.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chacha20poly1305::aead::{Aead, AeadCore, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce};
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("ciphertext is too short")]
    Truncated,
    #[error("failed to encrypt value")]
    Seal,
    #[error("failed to decrypt value")]
    Open,
    #[error("decrypted value is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Application-wide encrypter
#[derive(Clone)]
pub struct Encrypter {
    key: [u8; 32],
}

impl std::fmt::Debug for Encrypter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encrypter").finish_non_exhaustive()
    }
}

impl Encrypter {
    /// Derive the cipher key from an application secret
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Random key that only lives as long as the process
    pub fn ephemeral() -> Self {
        let generated = ChaCha20Poly1305::generate_key(&mut OsRng);
        let mut key = [0u8; 32];
        key.copy_from_slice(&generated);
        Self { key }
    }

    /// Seal `plaintext` under a fresh nonce; output is base64(nonce || sealed)
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let aead = self.cipher()?;
        let sealed = aead
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Seal)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let raw = STANDARD.decode(ciphertext.trim())?;
        if raw.len() <= NONCE_LEN {
            return Err(CryptoError::Truncated);
        }
        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let aead = self.cipher()?;
        let opened = aead
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::Open)?;
        Ok(String::from_utf8(opened)?)
    }

    /// Decrypt, or hand back the stored text unchanged when it does not
    /// decrypt under this key.
    pub fn decrypt_or_raw(&self, stored: &str) -> String {
        match self.decrypt(stored) {
            Ok(plain) => plain,
            Err(e) => {
                tracing::warn!(error = %e, "value did not decrypt, returning stored text");
                stored.to_string()
            }
        }
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305, CryptoError> {
        ChaCha20Poly1305::new_from_slice(&self.key).map_err(|_| CryptoError::Seal)
    }
}
