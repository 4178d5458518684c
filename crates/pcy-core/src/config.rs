use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::PaddingScheme;

/// Top-level configuration (loaded from payloadcrypt.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PcyConfig {
    pub codec: CodecConfig,
    pub keys: KeysConfig,
    pub log: LogConfig,
}

/// Codec settings. Fixed for the lifetime of a codec instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Separator between the key name and armored chunks (default: "_")
    pub delimiter: String,
    /// Key name used when the public-key provider returns an empty name
    pub default_key_name: String,
    /// RSA padding applied to each chunk
    pub padding: PaddingScheme,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            delimiter: "_".into(),
            default_key_name: "TMP".into(),
            padding: PaddingScheme::default(),
        }
    }
}

/// Key directory settings, used by the file-backed key provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Directory holding `<name>.pub.pem` and `<name>.pem` files
    pub key_dir: Option<PathBuf>,
    /// Key name to encrypt with; unset means a random available key
    pub active_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl PcyConfig {
    /// Parse a TOML document, filling every missing field with its default.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wire_format() {
        let config = PcyConfig::default();
        assert_eq!(config.codec.delimiter, "_");
        assert_eq!(config.codec.default_key_name, "TMP");
        assert_eq!(config.codec.padding, PaddingScheme::Pkcs1v15);
        assert!(config.keys.key_dir.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PcyConfig::from_toml(
            r#"
            [codec]
            delimiter = "~"
            padding = "oaep-sha1"

            [keys]
            key_dir = "/etc/payloadcrypt/keys"
            "#,
        )
        .unwrap();

        assert_eq!(config.codec.delimiter, "~");
        assert_eq!(config.codec.default_key_name, "TMP");
        assert_eq!(config.codec.padding, PaddingScheme::OaepSha1);
        assert_eq!(
            config.keys.key_dir.as_deref(),
            Some(std::path::Path::new("/etc/payloadcrypt/keys"))
        );
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payloadcrypt.toml");

        let mut config = PcyConfig::default();
        config.keys.active_key = Some("2024-q1".into());
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded = PcyConfig::from_toml(&content).unwrap();
        assert_eq!(loaded.keys.active_key.as_deref(), Some("2024-q1"));
        assert_eq!(loaded.codec, config.codec);
    }

    #[test]
    fn unknown_padding_is_rejected() {
        let result = PcyConfig::from_toml("[codec]\npadding = \"none\"\n");
        assert!(result.is_err());
    }
}
