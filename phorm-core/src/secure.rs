use crate::Result;
use std::fmt::Debug;

/// Encrypts plaintext for a secure member.
pub trait Encryptor {
    /// Auxiliary bytes consumed by the next operation.
    fn set_authenticator(&mut self, authenticator: &[u8]);
    fn encrypt(&mut self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Decrypts ciphertext read for a secure member.
pub trait Decryptor {
    fn set_authenticator(&mut self, authenticator: &[u8]);
    fn decrypt(&mut self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Answer of a [`SecureValueProvider`] for a classification.
pub enum Cipher<T> {
    /// Use this handler.
    Handler(T),
    /// The classification is deliberately not encrypted, bytes pass through unchanged.
    NoEncryption,
}

/// Classification scoped source of encryptors and decryptors.
///
/// Returning `None` means no handler is available, which fails the operation with
/// [`crate::PhormError::EncryptionUnavailable`]. There is no fallback to plaintext.
pub trait SecureValueProvider: Send + Sync + Debug {
    fn encryptor(&self, classification: &str) -> Option<Cipher<Box<dyn Encryptor>>>;
    /// `data` is the ciphertext about to be decrypted, handlers may read a header from it.
    fn decryptor(&self, classification: &str, data: &[u8])
    -> Option<Cipher<Box<dyn Decryptor>>>;
}

/// Provider answering [`Cipher::NoEncryption`] for every classification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEncryption;

impl SecureValueProvider for NullEncryption {
    fn encryptor(&self, _classification: &str) -> Option<Cipher<Box<dyn Encryptor>>> {
        Some(Cipher::NoEncryption)
    }
    fn decryptor(
        &self,
        _classification: &str,
        _data: &[u8],
    ) -> Option<Cipher<Box<dyn Decryptor>>> {
        Some(Cipher::NoEncryption)
    }
}
