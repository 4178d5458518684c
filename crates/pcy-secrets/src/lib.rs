//! pcy-secrets: file-backed key provider for payloadcrypt
//!
//! Key directory discovery chain (in order of precedence):
//!   1. explicit path (CLI `--key-dir`)
//!   2. $PCY_KEY_DIR
//!   3. `keys.key_dir` from payloadcrypt.toml
//!   4. ~/.config/payloadcrypt/keys (default fallback)

pub mod discovery;
pub mod keydir;

pub use discovery::{default_key_dir, find_key_dir, KeyDirLocation, KEY_DIR_ENV};
pub use keydir::{KeyDirectory, PRIVATE_SUFFIX, PUBLIC_SUFFIX};
