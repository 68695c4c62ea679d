//! At-rest encryption for sender passwords.
//!
//! SMTP passwords have to be recoverable when mail is sent, so they are sealed
//! with AES-256-GCM rather than hashed. The key is the 32-byte value from
//! `SENDER_ENCRYPTION_KEY` (64 hex chars). Every seal uses a fresh random
//! 12-byte nonce; the stored form is `base64(nonce || ciphertext)`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;

use crate::error::{AppError, AppResult};

const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    /// Build a cipher from a 64 hex-char key.
    pub fn from_hex_key(hex_key: &str) -> AppResult<Self> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| AppError::Config(format!("Invalid SENDER_ENCRYPTION_KEY hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(AppError::Config(format!(
                "SENDER_ENCRYPTION_KEY must be 64 hex chars (32 bytes), got {} bytes",
                bytes.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(&bytes)
            .map_err(|e| AppError::Crypto(format!("Failed to create cipher: {}", e)))?;
        Ok(Self { cipher })
    }

    pub fn seal(&self, plaintext: &str) -> AppResult<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AppError::Crypto(format!("Encryption failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    pub fn open(&self, sealed: &str) -> AppResult<String> {
        let raw = STANDARD
            .decode(sealed)
            .map_err(|e| AppError::Crypto(format!("Malformed sealed credential: {}", e)))?;
        if raw.len() <= NONCE_LEN {
            return Err(AppError::Crypto("Sealed credential is too short".to_string()));
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| AppError::Crypto(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|_| AppError::Crypto("Decrypted credential is not UTF-8".to_string()))
    }
}

#[cfg(test)]
pub(crate) const TEST_KEY: &str =
    "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
