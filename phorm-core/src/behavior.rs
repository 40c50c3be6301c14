use crate::{Cipher, MemberDefinition, PhormError, Result, Settings, Value};
use std::{fmt::Debug, sync::Arc};

/// Outcome of an inbound transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed {
    Value(Value),
    /// Leave the member untouched.
    Ignore,
}

/// Arbitrary two way conversion attached to a member.
///
/// When attached it owns the outbound conversion entirely: its result is sent as is.
pub trait ValueTransform: Send + Sync + Debug {
    fn to_datasource(&self, member: &MemberDefinition, value: Value) -> Result<Value>;
    fn from_datasource(&self, member: &MemberDefinition, value: Value) -> Result<Transformed>;
}

/// Encrypted member, handled by the provider registered for `classification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecureValue {
    pub classification: &'static str,
    /// Member whose value feeds the cipher authenticator.
    pub authenticator: Option<&'static str>,
}

/// Value behavior attached to a member.
#[derive(Debug, Clone)]
pub enum Behavior {
    Secure(SecureValue),
    Transform(Arc<dyn ValueTransform>),
    /// Enum members travel as their integer.
    EnumAsInt,
    /// Enum members travel as their case name.
    EnumAsString,
}

impl Behavior {
    pub fn transform(transform: impl ValueTransform + 'static) -> Self {
        Behavior::Transform(Arc::new(transform))
    }
    pub fn secure(classification: &'static str) -> Self {
        Behavior::Secure(SecureValue {
            classification,
            authenticator: None,
        })
    }
    pub fn secure_with(classification: &'static str, authenticator: &'static str) -> Self {
        Behavior::Secure(SecureValue {
            classification,
            authenticator: Some(authenticator),
        })
    }
    /// Secure and transformed members are applied after every other member.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Behavior::Secure(..) | Behavior::Transform(..))
    }
}

impl PartialEq for Behavior {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Secure(l), Self::Secure(r)) => l == r,
            (Self::Transform(l), Self::Transform(r)) => Arc::ptr_eq(l, r),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl SecureValue {
    fn unavailable(&self, member: &str) -> crate::Error {
        PhormError::EncryptionUnavailable {
            classification: self.classification.into(),
            member: member.into(),
        }
        .into()
    }

    pub fn encrypt(
        &self,
        member: &str,
        settings: &Settings,
        plaintext: &[u8],
        authenticator: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let Some(provider) = &settings.secure_provider else {
            return Err(self.unavailable(member));
        };
        match provider.encryptor(self.classification) {
            Some(Cipher::Handler(mut encryptor)) => {
                encryptor.set_authenticator(authenticator.unwrap_or_default());
                encryptor.encrypt(plaintext)
            }
            Some(Cipher::NoEncryption) => Ok(plaintext.to_vec()),
            None => Err(self.unavailable(member)),
        }
    }

    pub fn decrypt(
        &self,
        member: &str,
        settings: &Settings,
        ciphertext: &[u8],
        authenticator: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let Some(provider) = &settings.secure_provider else {
            return Err(self.unavailable(member));
        };
        match provider.decryptor(self.classification, ciphertext) {
            Some(Cipher::Handler(mut decryptor)) => {
                decryptor.set_authenticator(authenticator.unwrap_or_default());
                decryptor.decrypt(ciphertext)
            }
            Some(Cipher::NoEncryption) => Ok(ciphertext.to_vec()),
            None => Err(self.unavailable(member)),
        }
    }
}
