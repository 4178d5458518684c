pub mod config;
pub mod error;
pub mod types;

pub use config::{CodecConfig, KeysConfig, LogConfig, PcyConfig};
pub use error::{CodecError, CodecResult, ErrorKind, KeyError};
pub use types::PaddingScheme;
