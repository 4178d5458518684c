//! pcy-crypto: chunked RSA payload codec
//!
//! Architecture: Split-then-Encrypt with one RSA operation per chunk
//!
//! Pipeline: plaintext → split at key capacity → RSA encrypt → armor → join
//!
//! Envelope:
//! ```text
//! <key name>_<armored block 0>_<armored block 1>_...
//!   key name      cleartext, selects the private key on decryption
//!   capacity      key_bits / 8 - padding overhead (11 for PKCS#1 v1.5)
//!   armored block base64 with '/', '=', '+' replaced by ".x", ".y", ".z"
//! ```

pub mod armor;
pub mod chunk;
pub mod codec;
pub mod envelope;
pub mod keys;
pub mod provider;
pub mod structured;

pub use armor::{armor, unarmor};
pub use codec::{validate_config, PayloadCodec};
pub use envelope::{Envelope, EnvelopeInfo};
pub use keys::{BoundPrivateKey, BoundPublicKey, KeyName, PrivateKeyMaterial, PublicKeyMaterial};
pub use provider::{FnKeyProvider, KeyProvider, StaticKeyProvider};

pub use pcy_core::{CodecConfig, CodecError, CodecResult, ErrorKind, KeyError, PaddingScheme};

#[cfg(test)]
pub(crate) mod test_keys {
    use std::sync::OnceLock;

    use openssl::pkey::PKey;
    use openssl::rsa::Rsa;

    use crate::keys::{PrivateKeyMaterial, PublicKeyMaterial};

    /// Fresh RSA pair: SPKI public PEM, PKCS#8 private PEM.
    pub fn generate_pair(bits: u32) -> (PublicKeyMaterial, PrivateKeyMaterial) {
        let rsa = Rsa::generate(bits).unwrap();
        let public = String::from_utf8(rsa.public_key_to_pem().unwrap()).unwrap();
        let pkey = PKey::from_rsa(rsa).unwrap();
        let private = String::from_utf8(pkey.private_key_to_pem_pkcs8().unwrap()).unwrap();
        (
            PublicKeyMaterial::from_pem(public),
            PrivateKeyMaterial::from_pem(private),
        )
    }

    /// Shared 1024-bit pair (capacity 117 with PKCS#1 v1.5).
    pub fn pair_1024() -> (PublicKeyMaterial, PrivateKeyMaterial) {
        static PAIR: OnceLock<(PublicKeyMaterial, PrivateKeyMaterial)> = OnceLock::new();
        PAIR.get_or_init(|| generate_pair(1024)).clone()
    }
}
