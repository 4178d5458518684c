//! End-to-end codec tests across key sizes, with a rotating key provider.
//!
//! Each key size gets a fresh RSA pair; the public-key provider hands out a
//! random numeric key id per call and the private-key provider records
//! every name it is asked for.

use std::sync::Mutex;

use openssl::rsa::Rsa;
use rand::{Rng, RngCore};
use serde_json::{json, Map, Value};

use pcy_crypto::{
    ErrorKind, FnKeyProvider, KeyError, KeyName, KeyProvider, PayloadCodec, PrivateKeyMaterial,
    PublicKeyMaterial,
};

const UTF8_TEXT: &str = "Ünïcödé ✓ — 漢字かな交じり文, Ελληνικά, 🦀🔐, ﷽";

fn key_pair(bits: u32) -> (PublicKeyMaterial, PrivateKeyMaterial) {
    let rsa = Rsa::generate(bits).unwrap();
    let public = String::from_utf8(rsa.public_key_to_pem().unwrap()).unwrap();
    // Traditional PKCS#1 private key ("BEGIN RSA PRIVATE KEY")
    let private = String::from_utf8(rsa.private_key_to_pem().unwrap()).unwrap();
    (
        PublicKeyMaterial::from_pem(public),
        PrivateKeyMaterial::from_pem(private),
    )
}

struct Rotating {
    public: PublicKeyMaterial,
    private: PrivateKeyMaterial,
    issued: Mutex<Vec<KeyName>>,
    requested: Mutex<Vec<KeyName>>,
}

impl Rotating {
    fn new(bits: u32) -> Self {
        let (public, private) = key_pair(bits);
        Self {
            public,
            private,
            issued: Mutex::new(Vec::new()),
            requested: Mutex::new(Vec::new()),
        }
    }
}

impl KeyProvider for Rotating {
    fn provide_public_key(&self) -> Result<(KeyName, PublicKeyMaterial), KeyError> {
        let name = KeyName::new(rand::thread_rng().gen_range(1000..2000).to_string());
        self.issued.lock().unwrap().push(name.clone());
        Ok((name, self.public.clone()))
    }

    fn provide_private_key(&self, name: &KeyName) -> Result<PrivateKeyMaterial, KeyError> {
        self.requested.lock().unwrap().push(name.clone());
        Ok(self.private.clone())
    }
}

fn random_bytes(max: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut bytes = vec![0u8; rng.gen_range(1..=max)];
    rng.fill_bytes(&mut bytes);
    bytes
}

#[test]
fn binary_payloads_across_key_sizes() {
    for bits in [1024, 2048, 3072] {
        let codec = PayloadCodec::with_defaults(Rotating::new(bits));
        let capacity = (bits / 8) as usize - 11;

        for _ in 1..10 {
            let mut payload = UTF8_TEXT.as_bytes().to_vec();
            payload.extend(random_bytes(200));

            let envelope = codec.encrypt(&payload).unwrap();
            let info = codec.inspect(&envelope).unwrap();
            assert_eq!(info.chunks, payload.len().div_ceil(capacity));
            assert_eq!(codec.decrypt(&envelope).unwrap(), payload, "{bits}-bit key");
        }

        let provider = codec.provider();
        assert_eq!(
            *provider.issued.lock().unwrap(),
            *provider.requested.lock().unwrap(),
            "private keys must be requested under the issued names"
        );
    }
}

#[test]
fn capacity_boundaries_for_1024_bit_key() {
    let codec = PayloadCodec::with_defaults(Rotating::new(1024));
    for (len, chunks) in [(0, 1), (1, 1), (116, 1), (117, 1), (118, 2)] {
        let payload = vec![0xA5u8; len];
        let envelope = codec.encrypt(&payload).unwrap();
        assert_eq!(envelope.split('_').count(), 1 + chunks, "len {len}");
        assert_eq!(codec.decrypt(&envelope).unwrap(), payload);
    }
}

#[test]
fn structured_values_across_key_sizes() {
    for bits in [1024, 2048] {
        let codec = PayloadCodec::with_defaults(Rotating::new(bits));

        for i in 1..10 {
            let object = json!({
                "test0": "hallo",
                "test1": true,
                "test2": 1.12 * f64::from(i),
                "test3": [1, 2, 3],
                "utf8": UTF8_TEXT,
                "invalidUtf8": "\u{c3}.",
                "lossy": String::from_utf8_lossy(&[0xc3, 0x2e, 0xff]),
            });
            let envelope = codec.encode_value(&object).unwrap();
            let decoded: Value = codec.decode_value(&envelope).unwrap();
            assert_eq!(decoded, object);
        }

        for _ in 1..10 {
            let mut map = Map::new();
            map.insert("test1".into(), json!(123));
            map.insert("test2".into(), json!(10.10));
            map.insert("utf8".into(), json!(UTF8_TEXT));

            let envelope = codec.encode_map(&map).unwrap();
            assert_eq!(codec.decode_map(&envelope, None).unwrap(), map);
        }
    }
}

#[test]
fn unknown_name_is_never_guessed() {
    let (public, private) = key_pair(1024);
    let provider = FnKeyProvider::new(
        move || Ok((KeyName::from("current"), public.clone())),
        move |name: &KeyName| {
            if name.as_str() == "current" {
                Ok(private.clone())
            } else {
                Err(KeyError::UnknownKey(name.to_string()))
            }
        },
    );
    let codec = PayloadCodec::with_defaults(provider);

    let envelope = codec.encrypt(b"payload").unwrap();
    assert_eq!(codec.decrypt(&envelope).unwrap(), b"payload");

    let retired = envelope.replacen("current", "retired", 1);
    let err = codec.decrypt(&retired).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Key);
}
