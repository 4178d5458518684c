//! pcy: payloadcrypt command-line wrapper
//!
//! Commands:
//!   encrypt / decrypt            - raw payloads (stdin/stdout or files)
//!   encrypt-json / decrypt-json  - JSON documents through the structured codec
//!   inspect                      - key name and chunk count of an envelope
//!   keys list                    - keys available in the key directory
//!   config show                  - effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use pcy_core::PcyConfig;
use pcy_crypto::PayloadCodec;
use pcy_secrets::KeyDirectory;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pcy",
    version,
    about = "Chunked RSA payload encryption",
    long_about = "pcy: encrypt payloads into delimiter-safe text envelopes with named RSA keys"
)]
struct Cli {
    /// Path to payloadcrypt.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "PCY_CONFIG",
        default_value = "~/.config/payloadcrypt/payloadcrypt.toml"
    )]
    config: PathBuf,

    /// Key directory (overrides $PCY_KEY_DIR and config keys.key_dir)
    #[arg(long)]
    key_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to config log.level
    #[arg(long, env = "PCY_LOG")]
    log: Option<String>,

    /// Log format (json, text); defaults to config log.format
    #[arg(long, env = "PCY_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt raw bytes into an envelope
    Encrypt {
        #[command(flatten)]
        io: IoArgs,
        /// Encrypt with this key instead of the configured/random one
        #[arg(long, short = 'k')]
        key: Option<String>,
    },

    /// Decrypt an envelope back into raw bytes
    Decrypt {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Encrypt a JSON document
    #[command(name = "encrypt-json")]
    EncryptJson {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, short = 'k')]
        key: Option<String>,
    },

    /// Decrypt an envelope holding a JSON document
    #[command(name = "decrypt-json")]
    DecryptJson {
        #[command(flatten)]
        io: IoArgs,
        /// Pretty-print the decrypted document
        #[arg(long)]
        pretty: bool,
        /// JSON object file whose fields are kept unless the envelope overrides them
        #[arg(long)]
        merge_into: Option<PathBuf>,
    },

    /// Show the key name and chunk count of an envelope (no key needed)
    Inspect {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Key directory management
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug)]
struct IoArgs {
    /// Input file (default: stdin)
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,
    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum KeysAction {
    /// List key names found in the key directory
    List,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = load_config(&config_path)?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format.clone() {
        Some(format) => format,
        None => LogFormat::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("invalid log.format in config: {e}"))?,
    };
    init_logging(&level, &format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "pcy starting"
    );

    match cli.command {
        Commands::Encrypt { io, key } => {
            cmd_encrypt(&config, cli.key_dir.as_deref(), key.as_deref(), &io)
        }
        Commands::Decrypt { io } => cmd_decrypt(&config, cli.key_dir.as_deref(), &io),
        Commands::EncryptJson { io, key } => {
            cmd_encrypt_json(&config, cli.key_dir.as_deref(), key.as_deref(), &io)
        }
        Commands::DecryptJson { io, pretty, merge_into } => cmd_decrypt_json(
            &config,
            cli.key_dir.as_deref(),
            &io,
            pretty,
            merge_into.as_deref(),
        ),
        Commands::Inspect { io } => cmd_inspect(&config, &io),
        Commands::Keys { action: KeysAction::List } => {
            cmd_keys_list(&config, cli.key_dir.as_deref())
        }
        Commands::Config { action: ConfigAction::Show } => {
            cmd_config_show(&config, &config_path)
        }
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries envelopes and plaintext; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(path: &Path) -> Result<PcyConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        PcyConfig::from_toml(&content).with_context(|| format!("parsing config: {}", path.display()))
    } else {
        Ok(PcyConfig::default())
    }
}

fn build_codec(
    config: &PcyConfig,
    key_dir: Option<&Path>,
    key: Option<&str>,
) -> Result<PayloadCodec<KeyDirectory>> {
    let mut dir = KeyDirectory::from_config(key_dir, &config.keys)?;
    if let Some(key) = key {
        dir = dir.with_active_key(key);
    }
    PayloadCodec::new(config.codec.clone(), dir).context("invalid [codec] configuration")
}

// ── I/O helpers ───────────────────────────────────────────────────────────────

fn read_input(io: &IoArgs) -> Result<Vec<u8>> {
    match &io.input {
        Some(path) => std::fs::read(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

/// Envelopes are single-line text; trailing newlines from shells and editors are dropped.
fn read_envelope(io: &IoArgs) -> Result<String> {
    let raw = read_input(io)?;
    let text = String::from_utf8(raw).context("envelope is not valid UTF-8 text")?;
    Ok(text.trim_end_matches(['\r', '\n']).to_string())
}

fn write_output(io: &IoArgs, data: &[u8], newline: bool) -> Result<()> {
    match &io.output {
        Some(path) => {
            std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = data.len(), "output written");
            Ok(())
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(data).context("writing stdout")?;
            if newline {
                stdout.write_all(b"\n").context("writing stdout")?;
            }
            stdout.flush().context("flushing stdout")
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_encrypt(config: &PcyConfig, key_dir: Option<&Path>, key: Option<&str>, io: &IoArgs) -> Result<()> {
    let codec = build_codec(config, key_dir, key)?;
    let plaintext = read_input(io)?;
    let envelope = codec.encrypt(&plaintext).context("encryption failed")?;
    write_output(io, envelope.as_bytes(), true)
}

fn cmd_decrypt(config: &PcyConfig, key_dir: Option<&Path>, io: &IoArgs) -> Result<()> {
    let codec = build_codec(config, key_dir, None)?;
    let envelope = read_envelope(io)?;
    let plaintext = codec.decrypt(&envelope).context("decryption failed")?;
    write_output(io, &plaintext, false)
}

fn cmd_encrypt_json(
    config: &PcyConfig,
    key_dir: Option<&Path>,
    key: Option<&str>,
    io: &IoArgs,
) -> Result<()> {
    let codec = build_codec(config, key_dir, key)?;
    let input = read_input(io)?;
    let value: serde_json::Value =
        serde_json::from_slice(&input).context("input is not a JSON document")?;
    let envelope = codec.encode_value(&value).context("encryption failed")?;
    write_output(io, envelope.as_bytes(), true)
}

fn cmd_decrypt_json(
    config: &PcyConfig,
    key_dir: Option<&Path>,
    io: &IoArgs,
    pretty: bool,
    merge_into: Option<&Path>,
) -> Result<()> {
    let codec = build_codec(config, key_dir, None)?;
    let envelope = read_envelope(io)?;

    let value = match merge_into {
        Some(path) => {
            let content = std::fs::read(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let base: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&content)
                .with_context(|| format!("{} is not a JSON object", path.display()))?;
            serde_json::Value::Object(
                codec
                    .decode_map(&envelope, Some(base))
                    .context("decryption failed")?,
            )
        }
        None => codec
            .decode_value::<serde_json::Value>(&envelope)
            .context("decryption failed")?,
    };

    let rendered = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    write_output(io, rendered.as_bytes(), true)
}

fn cmd_inspect(config: &PcyConfig, io: &IoArgs) -> Result<()> {
    let envelope = read_envelope(io)?;
    let info = pcy_crypto::Envelope::parse(&envelope, &config.codec.delimiter)
        .context("not a valid envelope")?
        .info();
    let rendered = serde_json::to_string_pretty(&info)?;
    write_output(io, rendered.as_bytes(), true)
}

fn cmd_keys_list(config: &PcyConfig, key_dir: Option<&Path>) -> Result<()> {
    let dir = KeyDirectory::from_config(key_dir, &config.keys)?;
    let public: Vec<String> = dir.public_key_names()?.iter().map(|n| n.to_string()).collect();
    let private = dir.private_key_names()?;

    println!("# Key directory: {}", dir.root().display());
    if let Some(active) = dir.active_key() {
        println!("# Active key: {active}");
    }
    println!("{:<24} {:<8} {:<8}", "NAME", "ENCRYPT", "DECRYPT");

    let mut names: Vec<String> = public.clone();
    names.extend(private.iter().map(|n| n.to_string()));
    names.sort();
    names.dedup();
    for name in names {
        let encrypt = if public.contains(&name) { "yes" } else { "-" };
        let decrypt = if private.iter().any(|n| n.as_str() == name) { "yes" } else { "-" };
        println!("{name:<24} {encrypt:<8} {decrypt:<8}");
    }
    Ok(())
}

fn cmd_config_show(config: &PcyConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_prefix("~/")) {
        Some(rest) => std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join(rest),
        None => path.to_path_buf(),
    }
}
