use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

/// Failures raised while resolving or binding key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("unknown key name: {0}")]
    UnknownKey(String),

    #[error("unparsable {kind} key material for '{name}': {reason}")]
    Unparsable {
        name: String,
        kind: &'static str,
        reason: String,
    },

    #[error("key '{name}' is unusable: {reason}")]
    Unusable { name: String, reason: String },

    #[error("invalid key name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("key provider failed: {0}")]
    Provider(String),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("encryption failed at chunk {chunk}: {reason}")]
    Encryption { chunk: usize, reason: String },

    #[error("decryption failed at chunk {chunk}: {reason}")]
    Decryption { chunk: usize, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("config error: {0}")]
    Config(String),
}

/// Flat discriminant of [`CodecError`], handy for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Key,
    MalformedEnvelope,
    Encryption,
    Decryption,
    Serialization,
    Config,
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Key(_) => ErrorKind::Key,
            CodecError::MalformedEnvelope(_) => ErrorKind::MalformedEnvelope,
            CodecError::Encryption { .. } => ErrorKind::Encryption,
            CodecError::Decryption { .. } => ErrorKind::Decryption,
            CodecError::Serialization(_) => ErrorKind::Serialization,
            CodecError::Config(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_error_converts_into_codec_error() {
        let err: CodecError = KeyError::UnknownKey("k1".into()).into();
        assert_eq!(err.kind(), ErrorKind::Key);
        assert_eq!(err.to_string(), "key error: unknown key name: k1");
    }

    #[test]
    fn chunk_index_is_reported() {
        let err = CodecError::Decryption {
            chunk: 3,
            reason: "padding check failed".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Decryption);
        assert!(err.to_string().contains("chunk 3"));
    }
}
