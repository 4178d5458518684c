//! End-to-end encrypt/decrypt orchestration
//!
//! Encrypt: provider → bind public key → split → RSA per chunk → armor → join.
//! Decrypt: parse envelope → provider(name) → bind private key → unarmor →
//! RSA per chunk → join.
//!
//! The codec owns only its configuration and the provider. Keys, capacity
//! and partial output are local to each call, so one codec can be shared
//! across threads.

use zeroize::{Zeroize, Zeroizing};

use pcy_core::{CodecConfig, CodecError, CodecResult, KeyError};

use crate::armor::{armor, is_armor_char, unarmor};
use crate::chunk::{chunk_count, join, split};
use crate::envelope::{assemble, Envelope, EnvelopeInfo};
use crate::keys::{BoundPrivateKey, KeyName};
use crate::provider::KeyProvider;

/// Chunked RSA codec producing delimiter-joined, armored envelopes.
#[derive(Debug, Clone)]
pub struct PayloadCodec<P> {
    config: CodecConfig,
    provider: P,
}

impl<P: KeyProvider> PayloadCodec<P> {
    /// Build a codec after checking that `config` can produce unambiguous envelopes.
    pub fn new(config: CodecConfig, provider: P) -> CodecResult<Self> {
        validate_config(&config)?;
        Ok(Self { config, provider })
    }

    /// Codec with the default `_` delimiter, `TMP` fallback name and PKCS#1 v1.5 padding.
    pub fn with_defaults(provider: P) -> Self {
        Self {
            config: CodecConfig::default(),
            provider,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Encrypt `plaintext` into an envelope.
    ///
    /// Either every chunk is encrypted or an error is returned; no partial
    /// envelope ever leaves this function.
    pub fn encrypt(&self, plaintext: &[u8]) -> CodecResult<String> {
        let (name, public) = self.provider.provide_public_key()?;
        let name = self.resolve_name(name)?;
        let key = public.bind(&name, self.config.padding)?;

        let mut armored = Vec::with_capacity(chunk_count(plaintext.len(), key.capacity()));
        for (index, chunk) in split(plaintext, key.capacity()).into_iter().enumerate() {
            let block = key
                .encrypt_block(chunk)
                .map_err(|reason| CodecError::Encryption {
                    chunk: index,
                    reason,
                })?;
            armored.push(armor(&block));
        }

        tracing::debug!(
            key_name = %name,
            bytes = plaintext.len(),
            capacity = key.capacity().get(),
            chunks = armored.len(),
            "payload encrypted"
        );

        Ok(assemble(&name, &armored, &self.config.delimiter))
    }

    /// Decrypt an envelope produced by [`Self::encrypt`].
    ///
    /// The private key is requested under exactly the name found in the
    /// envelope. Any failure discards (and wipes) the plaintext decrypted so far.
    pub fn decrypt(&self, envelope: &str) -> CodecResult<Vec<u8>> {
        let envelope = Envelope::parse(envelope, &self.config.delimiter)?;
        let name = envelope.key_name();

        let private = self.provider.provide_private_key(&name)?;
        let key = private.bind(&name, self.config.padding)?;

        // Blocks are wiped on drop, so an early return leaves no plaintext behind.
        let blocks = envelope
            .chunks()
            .iter()
            .enumerate()
            .map(|(index, segment)| decrypt_segment(&key, index, segment))
            .collect::<CodecResult<Vec<Zeroizing<Vec<u8>>>>>()
            .inspect_err(|e| tracing::debug!(key_name = %name, error = %e, "decryption aborted"))?;

        let slices: Vec<&[u8]> = blocks.iter().map(|block| block.as_slice()).collect();
        let out = join(&slices);

        tracing::debug!(
            key_name = %name,
            chunks = envelope.chunks().len(),
            bytes = out.len(),
            "payload decrypted"
        );

        Ok(out)
    }

    /// Encrypt UTF-8 text.
    pub fn encrypt_str(&self, plaintext: &str) -> CodecResult<String> {
        self.encrypt(plaintext.as_bytes())
    }

    /// Decrypt an envelope whose plaintext must be UTF-8.
    pub fn decrypt_to_string(&self, envelope: &str) -> CodecResult<String> {
        let bytes = self.decrypt(envelope)?;
        String::from_utf8(bytes).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            CodecError::Serialization("decrypted payload is not valid UTF-8".into())
        })
    }

    /// Key name and chunk count of an envelope, without decrypting it.
    pub fn inspect(&self, envelope: &str) -> CodecResult<EnvelopeInfo> {
        Envelope::parse(envelope, &self.config.delimiter).map(|e| e.info())
    }

    fn resolve_name(&self, name: KeyName) -> Result<KeyName, KeyError> {
        let name = if name.is_empty() {
            KeyName::new(self.config.default_key_name.clone())
        } else {
            name
        };
        if !splits_cleanly(name.as_str(), &self.config.delimiter) {
            return Err(KeyError::InvalidName {
                reason: format!(
                    "does not split cleanly from the delimiter {:?}",
                    self.config.delimiter
                ),
                name: name.to_string(),
            });
        }
        Ok(name)
    }
}

fn decrypt_segment(
    key: &BoundPrivateKey,
    index: usize,
    segment: &str,
) -> CodecResult<Zeroizing<Vec<u8>>> {
    let block = unarmor(segment).map_err(|e| match e {
        CodecError::MalformedEnvelope(reason) => {
            CodecError::MalformedEnvelope(format!("ciphertext segment {index}: {reason}"))
        }
        other => other,
    })?;
    key.decrypt_block(&block)
        .map(Zeroizing::new)
        .map_err(|reason| CodecError::Decryption {
            chunk: index,
            reason,
        })
}

/// True when the first delimiter match in `<name><delimiter>` is the one
/// after the name. A name ending in a prefix of a multi-character delimiter
/// (`k-` with `--`) would otherwise shift the split point.
fn splits_cleanly(name: &str, delimiter: &str) -> bool {
    format!("{name}{delimiter}").find(delimiter) == Some(name.len())
}

/// Check that a configuration yields envelopes that split unambiguously.
pub fn validate_config(config: &CodecConfig) -> CodecResult<()> {
    if config.delimiter.is_empty() {
        return Err(CodecError::Config("delimiter must not be empty".into()));
    }
    if let Some(c) = config.delimiter.chars().find(|c| is_armor_char(*c)) {
        return Err(CodecError::Config(format!(
            "delimiter {:?} contains {c:?}, which can appear in armored chunks",
            config.delimiter
        )));
    }
    if config.default_key_name.is_empty() {
        return Err(CodecError::Config("default key name must not be empty".into()));
    }
    if !splits_cleanly(&config.default_key_name, &config.delimiter) {
        return Err(CodecError::Config(format!(
            "default key name {:?} does not split cleanly from the delimiter {:?}",
            config.default_key_name, config.delimiter
        )));
    }
    Ok(())
}
