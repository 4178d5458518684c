//! JSON payloads through the codec
//!
//! Two shapes are supported:
//! - any `Serialize`/`Deserialize` type (typed objects, `serde_json::Value`)
//! - string-keyed maps, optionally merged into a caller-supplied base map
//!
//! Text is carried as UTF-8 JSON; serde_json escapes nothing it does not
//! have to, so multi-byte and replacement-character sequences survive as-is.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use zeroize::Zeroize;

use pcy_core::{CodecError, CodecResult};

use crate::codec::PayloadCodec;
use crate::provider::KeyProvider;

impl<P: KeyProvider> PayloadCodec<P> {
    /// Serialize `value` to JSON and encrypt it.
    pub fn encode_value<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<String> {
        let mut json = serde_json::to_vec(value)
            .map_err(|e| CodecError::Serialization(format!("JSON encode: {e}")))?;
        let envelope = self.encrypt(&json);
        json.zeroize();
        envelope
    }

    /// Decrypt an envelope and deserialize the JSON payload into `T`.
    pub fn decode_value<T: DeserializeOwned>(&self, envelope: &str) -> CodecResult<T> {
        let mut json = self.decrypt(envelope)?;
        let value = serde_json::from_slice(&json)
            .map_err(|e| CodecError::Serialization(format!("JSON decode: {e}")));
        json.zeroize();
        value
    }

    /// Encrypt a string-keyed map as a JSON object.
    pub fn encode_map(&self, map: &Map<String, Value>) -> CodecResult<String> {
        self.encode_value(map)
    }

    /// Decrypt a JSON object, merging its fields over `base`.
    ///
    /// Decoded fields win on key collisions; fields only in `base` are kept.
    pub fn decode_map(
        &self,
        envelope: &str,
        base: Option<Map<String, Value>>,
    ) -> CodecResult<Map<String, Value>> {
        let decoded = match self.decode_value::<Value>(envelope)? {
            Value::Object(map) => map,
            other => {
                return Err(CodecError::Serialization(format!(
                    "expected a JSON object, found {}",
                    json_type(&other)
                )))
            }
        };

        let mut merged = base.unwrap_or_default();
        merged.extend(decoded);
        Ok(merged)
    }

    /// Decrypt a JSON envelope and pretty-print it for diagnostics.
    pub fn dump(&self, envelope: &str) -> CodecResult<String> {
        let value: Value = self.decode_value(envelope)?;
        serde_json::to_string_pretty(&value)
            .map_err(|e| CodecError::Serialization(format!("JSON encode: {e}")))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
