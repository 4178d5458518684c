//! Key resolution: the seam between the codec and whatever stores keys
//!
//! The encrypting side asks for one `(name, public key)` pair per call; the
//! name travels in the envelope, and the decrypting side asks for the
//! private key under that exact name. Rotation, storage and caching are
//! entirely the provider's business.

use std::collections::BTreeMap;

use pcy_core::KeyError;

use crate::keys::{KeyName, PrivateKeyMaterial, PublicKeyMaterial};

/// Source of key material for [`crate::PayloadCodec`].
pub trait KeyProvider {
    /// Key to encrypt with. Called once per encryption.
    fn provide_public_key(&self) -> Result<(KeyName, PublicKeyMaterial), KeyError>;

    /// Private key registered under `name`. Called once per decryption.
    ///
    /// Must fail with [`KeyError::UnknownKey`] for names it does not know.
    fn provide_private_key(&self, name: &KeyName) -> Result<PrivateKeyMaterial, KeyError>;
}

impl<P: KeyProvider + ?Sized> KeyProvider for &P {
    fn provide_public_key(&self) -> Result<(KeyName, PublicKeyMaterial), KeyError> {
        (**self).provide_public_key()
    }

    fn provide_private_key(&self, name: &KeyName) -> Result<PrivateKeyMaterial, KeyError> {
        (**self).provide_private_key(name)
    }
}

impl<P: KeyProvider + ?Sized> KeyProvider for std::sync::Arc<P> {
    fn provide_public_key(&self) -> Result<(KeyName, PublicKeyMaterial), KeyError> {
        (**self).provide_public_key()
    }

    fn provide_private_key(&self, name: &KeyName) -> Result<PrivateKeyMaterial, KeyError> {
        (**self).provide_private_key(name)
    }
}

/// Provider assembled from two callbacks.
pub struct FnKeyProvider<Pub, Priv> {
    load_public: Pub,
    load_private: Priv,
}

impl<Pub, Priv> FnKeyProvider<Pub, Priv>
where
    Pub: Fn() -> Result<(KeyName, PublicKeyMaterial), KeyError>,
    Priv: Fn(&KeyName) -> Result<PrivateKeyMaterial, KeyError>,
{
    pub fn new(load_public: Pub, load_private: Priv) -> Self {
        Self {
            load_public,
            load_private,
        }
    }
}

impl<Pub, Priv> KeyProvider for FnKeyProvider<Pub, Priv>
where
    Pub: Fn() -> Result<(KeyName, PublicKeyMaterial), KeyError>,
    Priv: Fn(&KeyName) -> Result<PrivateKeyMaterial, KeyError>,
{
    fn provide_public_key(&self) -> Result<(KeyName, PublicKeyMaterial), KeyError> {
        (self.load_public)()
    }

    fn provide_private_key(&self, name: &KeyName) -> Result<PrivateKeyMaterial, KeyError> {
        (self.load_private)(name)
    }
}

/// In-memory keyring: one active public key plus any number of private keys.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    active: Option<(KeyName, PublicKeyMaterial)>,
    private: BTreeMap<KeyName, PrivateKeyMaterial>,
}

impl StaticKeyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyring holding a single pair under `name`, which is also the active key.
    pub fn single(
        name: impl Into<KeyName>,
        public: PublicKeyMaterial,
        private: PrivateKeyMaterial,
    ) -> Self {
        let name = name.into();
        Self::new()
            .with_private_key(name.clone(), private)
            .with_active_key(name, public)
    }

    /// Set the key used for encryption.
    pub fn with_active_key(mut self, name: impl Into<KeyName>, public: PublicKeyMaterial) -> Self {
        self.active = Some((name.into(), public));
        self
    }

    /// Register a private key for decryption (e.g. a retired key).
    pub fn with_private_key(mut self, name: impl Into<KeyName>, private: PrivateKeyMaterial) -> Self {
        self.private.insert(name.into(), private);
        self
    }
}

impl KeyProvider for StaticKeyProvider {
    fn provide_public_key(&self) -> Result<(KeyName, PublicKeyMaterial), KeyError> {
        self.active
            .clone()
            .ok_or_else(|| KeyError::Provider("no active public key configured".into()))
    }

    fn provide_private_key(&self, name: &KeyName) -> Result<PrivateKeyMaterial, KeyError> {
        self.private
            .get(name)
            .cloned()
            .ok_or_else(|| KeyError::UnknownKey(name.to_string()))
    }
}
