//! Key names, PEM key material, and call-scoped RSA key binding
//!
//! Material is opaque PEM text handed over by a [`crate::KeyProvider`].
//! Binding parses it into an OpenSSL RSA handle and derives the chunk
//! capacity for the active padding scheme. Bound keys live for a single
//! encrypt or decrypt call and are never stored on the codec.

use std::num::NonZeroUsize;

use openssl::pkey::{PKey, Private, Public};
use openssl::rsa::{Padding, Rsa};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use pcy_core::{KeyError, PaddingScheme};

/// Identifier carried in cleartext as the first envelope segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyName(String);

impl KeyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for KeyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for KeyName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// PEM-encoded RSA public key (SubjectPublicKeyInfo or PKCS#1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    pem: String,
}

impl PublicKeyMaterial {
    pub fn from_pem(pem: impl Into<String>) -> Self {
        Self { pem: pem.into() }
    }

    /// Parse the PEM and derive the chunk capacity for `padding`.
    pub fn bind(&self, name: &KeyName, padding: PaddingScheme) -> Result<BoundPublicKey, KeyError> {
        let rsa = parse_public_pem(self.pem.as_bytes()).map_err(|reason| KeyError::Unparsable {
            name: name.to_string(),
            kind: "public",
            reason,
        })?;

        let block_size = rsa.size() as usize;
        let capacity = padding
            .capacity(rsa.size() * 8)
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| KeyError::Unusable {
                name: name.to_string(),
                reason: format!(
                    "{}-bit key leaves no room for payload with {padding} padding ({} bytes overhead)",
                    rsa.size() * 8,
                    padding.overhead()
                ),
            })?;

        tracing::trace!(
            key_name = %name,
            block_size,
            capacity = capacity.get(),
            %padding,
            "bound public key"
        );

        Ok(BoundPublicKey {
            rsa,
            padding,
            block_size,
            capacity,
        })
    }
}

/// PEM-encoded RSA private key (PKCS#8 or PKCS#1). Redacted in `Debug`.
#[derive(Clone)]
pub struct PrivateKeyMaterial {
    pem: SecretString,
}

impl PrivateKeyMaterial {
    pub fn from_pem(pem: impl Into<String>) -> Self {
        Self {
            pem: SecretString::from(pem.into()),
        }
    }

    /// Parse the PEM eagerly so corrupt material fails before any chunk is touched.
    pub fn bind(&self, name: &KeyName, padding: PaddingScheme) -> Result<BoundPrivateKey, KeyError> {
        let unparsable = |reason: String| KeyError::Unparsable {
            name: name.to_string(),
            kind: "private",
            reason,
        };

        let pkey = PKey::private_key_from_pem(self.pem.expose_secret().as_bytes())
            .map_err(|e| unparsable(e.to_string()))?;
        let rsa = pkey
            .rsa()
            .map_err(|e| unparsable(format!("not an RSA key: {e}")))?;
        rsa.check_key()
            .map_err(|e| unparsable(format!("consistency check failed: {e}")))?;

        Ok(BoundPrivateKey {
            block_size: rsa.size() as usize,
            rsa,
            padding,
        })
    }
}

impl std::fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("pem", &"[REDACTED]")
            .finish()
    }
}

/// A parsed public key, valid for one encryption call.
pub struct BoundPublicKey {
    rsa: Rsa<Public>,
    padding: PaddingScheme,
    block_size: usize,
    capacity: NonZeroUsize,
}

impl BoundPublicKey {
    /// Maximum plaintext bytes per RSA call.
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Size of every ciphertext block in bytes (modulus size).
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Encrypt one chunk. `chunk.len()` must not exceed [`Self::capacity`].
    pub fn encrypt_block(&self, chunk: &[u8]) -> Result<Vec<u8>, String> {
        if chunk.len() > self.capacity.get() {
            return Err(format!(
                "chunk of {} bytes exceeds capacity {}",
                chunk.len(),
                self.capacity
            ));
        }
        let mut out = vec![0u8; self.block_size];
        let len = self
            .rsa
            .public_encrypt(chunk, &mut out, openssl_padding(self.padding))
            .map_err(|e| e.to_string())?;
        out.truncate(len);
        Ok(out)
    }
}

impl std::fmt::Debug for BoundPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundPublicKey")
            .field("padding", &self.padding)
            .field("block_size", &self.block_size)
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// A parsed private key, valid for one decryption call.
pub struct BoundPrivateKey {
    rsa: Rsa<Private>,
    padding: PaddingScheme,
    block_size: usize,
}

impl BoundPrivateKey {
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Decrypt one ciphertext block of exactly [`Self::block_size`] bytes.
    pub fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, String> {
        if block.len() != self.block_size {
            return Err(format!(
                "ciphertext block is {} bytes, expected {}",
                block.len(),
                self.block_size
            ));
        }
        let mut out = vec![0u8; self.block_size];
        match self
            .rsa
            .private_decrypt(block, &mut out, openssl_padding(self.padding))
        {
            Ok(len) => {
                out.truncate(len);
                Ok(out)
            }
            Err(e) => {
                out.zeroize();
                Err(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for BoundPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundPrivateKey")
            .field("rsa", &"[REDACTED]")
            .field("padding", &self.padding)
            .field("block_size", &self.block_size)
            .finish()
    }
}

fn parse_public_pem(pem: &[u8]) -> Result<Rsa<Public>, String> {
    // SubjectPublicKeyInfo ("BEGIN PUBLIC KEY") first, then bare PKCS#1.
    match PKey::public_key_from_pem(pem) {
        Ok(pkey) => pkey.rsa().map_err(|e| format!("not an RSA key: {e}")),
        Err(spki_err) => Rsa::public_key_from_pem_pkcs1(pem)
            .map_err(|_| spki_err.to_string()),
    }
}

fn openssl_padding(padding: PaddingScheme) -> Padding {
    match padding {
        PaddingScheme::Pkcs1v15 => Padding::PKCS1,
        PaddingScheme::OaepSha1 => Padding::PKCS1_OAEP,
    }
}
