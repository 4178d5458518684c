//! Cipher envelope wire format
//!
//! ```text
//! <key name><DELIM><armored chunk 0><DELIM><armored chunk 1>...
//! ```
//!
//! Neither the key name nor an armored chunk may contain the delimiter, and
//! the name may not end in a prefix of it, so a plain split recovers the
//! ordered segments.
//!
//! The format carries no chunk count or checksum. Removing or reordering
//! whole ciphertext segments is not detected here: the remaining chunks
//! still decrypt, yielding a shorter or reordered plaintext. Callers that
//! need integrity against that must carry it inside the payload.

use serde::Serialize;

use pcy_core::{CodecError, CodecResult};

use crate::keys::KeyName;

/// A parsed envelope, borrowing from the wire text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<'a> {
    key_name: &'a str,
    chunks: Vec<&'a str>,
}

impl<'a> Envelope<'a> {
    /// Split `text` on `delimiter` into the key name and armored chunks.
    ///
    /// Does not touch any key; chunk contents are validated when unarmored.
    pub fn parse(text: &'a str, delimiter: &str) -> CodecResult<Self> {
        if text.is_empty() {
            return Err(CodecError::MalformedEnvelope("empty envelope".into()));
        }

        let mut segments = text.split(delimiter);
        let key_name = segments.next().unwrap_or_default();
        if key_name.is_empty() {
            return Err(CodecError::MalformedEnvelope("missing key name segment".into()));
        }

        let chunks: Vec<&str> = segments.collect();
        if chunks.is_empty() {
            return Err(CodecError::MalformedEnvelope(format!(
                "no ciphertext segments after key name '{key_name}'"
            )));
        }
        if let Some(index) = chunks.iter().position(|c| c.is_empty()) {
            return Err(CodecError::MalformedEnvelope(format!(
                "ciphertext segment {index} is empty"
            )));
        }

        Ok(Self { key_name, chunks })
    }

    pub fn key_name(&self) -> KeyName {
        KeyName::from(self.key_name)
    }

    /// Armored chunk segments in wire order.
    pub fn chunks(&self) -> &[&'a str] {
        &self.chunks
    }

    pub fn info(&self) -> EnvelopeInfo {
        EnvelopeInfo {
            key_name: self.key_name.to_string(),
            chunks: self.chunks.len(),
            armored_bytes: self.chunks.iter().map(|c| c.len()).sum(),
        }
    }
}

/// Join a key name and armored chunks into wire text.
pub fn assemble(name: &KeyName, chunks: &[String], delimiter: &str) -> String {
    let len = name.as_str().len()
        + chunks.iter().map(|c| c.len() + delimiter.len()).sum::<usize>();
    let mut out = String::with_capacity(len);
    out.push_str(name.as_str());
    for chunk in chunks {
        out.push_str(delimiter);
        out.push_str(chunk);
    }
    out
}

/// Summary of an envelope, available without any key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeInfo {
    pub key_name: String,
    pub chunks: usize,
    /// Total length of the armored chunk text
    pub armored_bytes: usize,
}
