use serde::{Deserialize, Serialize};

/// RSA padding scheme applied to every chunk.
///
/// The scheme fixes how many bytes of each RSA block are lost to padding,
/// which in turn fixes the chunk capacity of a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddingScheme {
    /// PKCS#1 v1.5 encryption padding (11 bytes of overhead)
    #[default]
    #[serde(rename = "pkcs1v15")]
    Pkcs1v15,
    /// OAEP with SHA-1 and MGF1-SHA-1 (2 * 20 + 2 = 42 bytes of overhead)
    #[serde(rename = "oaep-sha1")]
    OaepSha1,
}

impl PaddingScheme {
    /// Bytes of each RSA block consumed by padding.
    pub fn overhead(self) -> usize {
        match self {
            PaddingScheme::Pkcs1v15 => 11,
            PaddingScheme::OaepSha1 => 42,
        }
    }

    /// Maximum plaintext bytes per RSA call for a key of `key_bits` bits.
    ///
    /// Returns `None` when the key is too small to carry any payload.
    pub fn capacity(self, key_bits: u32) -> Option<usize> {
        let block = (key_bits / 8) as usize;
        block
            .checked_sub(self.overhead())
            .filter(|capacity| *capacity > 0)
    }
}

impl std::fmt::Display for PaddingScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaddingScheme::Pkcs1v15 => f.write_str("pkcs1v15"),
            PaddingScheme::OaepSha1 => f.write_str("oaep-sha1"),
        }
    }
}
