//! Key directory discovery chain

use std::path::{Path, PathBuf};

use anyhow::Result;
use pcy_core::KeysConfig;

/// Environment variable naming the key directory.
pub const KEY_DIR_ENV: &str = "PCY_KEY_DIR";

/// A located key directory and where the location came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDirLocation {
    pub path: PathBuf,
    pub source: String,
}

/// Locate the key directory using the priority chain:
///   1. explicit path (e.g. `--key-dir`)
///   2. $PCY_KEY_DIR
///   3. config.key_dir (from payloadcrypt.toml)
///   4. ~/.config/payloadcrypt/keys  (default XDG location)
///
/// The first candidate that exists as a directory wins.
pub fn find_key_dir(explicit: Option<&Path>, config: &KeysConfig) -> Result<KeyDirLocation> {
    let env_value = std::env::var(KEY_DIR_ENV).ok().filter(|v| !v.is_empty());
    resolve_key_dir(explicit, env_value.as_deref(), config)
}

fn resolve_key_dir(
    explicit: Option<&Path>,
    env_value: Option<&str>,
    config: &KeysConfig,
) -> Result<KeyDirLocation> {
    let mut tried = Vec::new();

    let candidates = [
        explicit.map(|p| (p.to_path_buf(), "argument")),
        env_value.map(|v| (PathBuf::from(v), KEY_DIR_ENV)),
        config.key_dir.as_ref().map(|p| (p.clone(), "config")),
        Some((default_key_dir(), "default")),
    ];

    for (path, source) in candidates.into_iter().flatten() {
        let expanded = expand_tilde(&path);
        if expanded.is_dir() {
            tracing::debug!(path = %expanded.display(), source, "key directory located");
            return Ok(KeyDirLocation {
                source: format!("{source}:{}", expanded.display()),
                path: expanded,
            });
        }
        tried.push(format!("{source} ({})", expanded.display()));
    }

    anyhow::bail!(
        "no key directory found. Tried: {}. \
         Create one holding <name>.pub.pem and <name>.pem files",
        tried.join(", ")
    )
}

pub fn default_key_dir() -> PathBuf {
    home_dir().join(".config/payloadcrypt/keys")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

pub(crate) fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        return home_dir().join(rest);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde(Path::new("~/.config/payloadcrypt/keys"));
        assert!(!expanded.to_str().unwrap().starts_with("~/"));
        assert_eq!(expand_tilde(Path::new("/abs/keys")), PathBuf::from("/abs/keys"));
    }

    #[test]
    fn explicit_path_wins() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let config = KeysConfig {
            key_dir: Some(b.path().to_path_buf()),
            active_key: None,
        };

        let found = resolve_key_dir(Some(a.path()), b.path().to_str(), &config).unwrap();
        assert_eq!(found.path, a.path());
        assert!(found.source.starts_with("argument:"));
    }

    #[test]
    fn env_beats_config() {
        let env_dir = tempfile::tempdir().unwrap();
        let config_dir = tempfile::tempdir().unwrap();
        let config = KeysConfig {
            key_dir: Some(config_dir.path().to_path_buf()),
            active_key: None,
        };

        let found = resolve_key_dir(None, env_dir.path().to_str(), &config).unwrap();
        assert_eq!(found.path, env_dir.path());
        assert!(found.source.starts_with(KEY_DIR_ENV));
    }

    #[test]
    fn missing_candidates_fall_through_to_config() {
        let config_dir = tempfile::tempdir().unwrap();
        let config = KeysConfig {
            key_dir: Some(config_dir.path().to_path_buf()),
            active_key: None,
        };

        let found = resolve_key_dir(
            Some(Path::new("/nonexistent/payloadcrypt/a")),
            Some("/nonexistent/payloadcrypt/b"),
            &config,
        )
        .unwrap();
        assert_eq!(found.path, config_dir.path());
    }
}
