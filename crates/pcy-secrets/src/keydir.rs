//! File-backed key provider
//!
//! Layout:
//! ```text
//! <key_dir>/
//!   2024-q1.pub.pem   public key, selectable for encryption
//!   2024-q1.pem       private key, looked up by name on decryption
//!   2023-q4.pem       retired key: decrypt-only
//! ```
//!
//! With no active key configured, every encryption picks a random key that
//! has a public half, which spreads payloads across rotated keys.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use zeroize::Zeroize;

use pcy_core::{KeyError, KeysConfig};
use pcy_crypto::{KeyName, KeyProvider, PrivateKeyMaterial, PublicKeyMaterial};

use crate::discovery::{find_key_dir, KeyDirLocation};

pub const PUBLIC_SUFFIX: &str = ".pub.pem";
pub const PRIVATE_SUFFIX: &str = ".pem";

/// Directory of PEM files addressed by key name.
#[derive(Debug, Clone)]
pub struct KeyDirectory {
    root: PathBuf,
    active_key: Option<KeyName>,
}

impl KeyDirectory {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            anyhow::bail!("key directory not found: {}", root.display());
        }
        Ok(Self {
            root,
            active_key: None,
        })
    }

    /// Locate the directory via the discovery chain and apply `config.active_key`.
    pub fn from_config(explicit: Option<&Path>, config: &KeysConfig) -> Result<Self> {
        let KeyDirLocation { path, source } = find_key_dir(explicit, config)?;
        tracing::info!(source = %source, "using key directory");
        let dir = Self::open(path)?;
        Ok(match &config.active_key {
            Some(name) => dir.with_active_key(name.as_str()),
            None => dir,
        })
    }

    /// Always encrypt with `name` instead of a random key.
    pub fn with_active_key(mut self, name: impl Into<KeyName>) -> Self {
        self.active_key = Some(name.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn active_key(&self) -> Option<&KeyName> {
        self.active_key.as_ref()
    }

    /// Names with a `<name>.pub.pem` file, sorted.
    pub fn public_key_names(&self) -> Result<Vec<KeyName>> {
        self.names_with(|file| file.strip_suffix(PUBLIC_SUFFIX))
    }

    /// Names with a `<name>.pem` private key file, sorted.
    pub fn private_key_names(&self) -> Result<Vec<KeyName>> {
        self.names_with(|file| {
            if file.ends_with(PUBLIC_SUFFIX) {
                None
            } else {
                file.strip_suffix(PRIVATE_SUFFIX)
            }
        })
    }

    fn names_with(&self, pick: impl Fn(&str) -> Option<&str>) -> Result<Vec<KeyName>> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("listing key directory: {}", self.root.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("reading {}", self.root.display()))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = pick(file_name).filter(|n| check_name(n).is_ok()) {
                names.push(KeyName::from(name));
            }
        }
        names.sort();
        Ok(names)
    }

    fn choose_public_key(&self) -> Result<KeyName, KeyError> {
        if let Some(active) = &self.active_key {
            return Ok(active.clone());
        }
        let names = self
            .public_key_names()
            .map_err(|e| KeyError::Provider(format!("{e:#}")))?;
        names
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| {
                KeyError::Provider(format!(
                    "no *{PUBLIC_SUFFIX} files in {}",
                    self.root.display()
                ))
            })
    }

    fn read_key_file(&self, name: &KeyName, suffix: &str) -> Result<String, KeyError> {
        check_name(name.as_str()).map_err(|reason| KeyError::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        })?;

        let path = self.root.join(format!("{name}{suffix}"));
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => KeyError::UnknownKey(name.to_string()),
            _ => KeyError::Provider(format!("reading {}: {e}", path.display())),
        })
    }
}

impl KeyProvider for KeyDirectory {
    fn provide_public_key(&self) -> Result<(KeyName, PublicKeyMaterial), KeyError> {
        let name = self.choose_public_key()?;
        let pem = self.read_key_file(&name, PUBLIC_SUFFIX)?;
        tracing::debug!(key_name = %name, "public key loaded");
        Ok((name, PublicKeyMaterial::from_pem(pem)))
    }

    fn provide_private_key(&self, name: &KeyName) -> Result<PrivateKeyMaterial, KeyError> {
        let mut pem = self.read_key_file(name, PRIVATE_SUFFIX)?;
        let material = PrivateKeyMaterial::from_pem(pem.as_str());
        pem.zeroize();
        tracing::debug!(key_name = %name, "private key loaded");
        Ok(material)
    }
}

/// Names become file names, so anything that could escape the directory is refused.
fn check_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty name");
    }
    if name.starts_with('.') {
        return Err("names may not start with '.'");
    }
    if name.contains(['/', '\\', '\0']) {
        return Err("names may not contain path separators");
    }
    // `<name>.pub` + ".pem" would be read back as the public half of `<name>`.
    if name.ends_with(".pub") {
        return Err("names may not end in '.pub'");
    }
    Ok(())
}
