//! aef: password-based authenticated file encryption
//!
//! Usage:
//!   aef [flags] <path>...
//!
//! Each operand is encrypted in place to a `.crypt` container (or decrypted
//! back, inferred from the extension unless --encrypt/--decrypt forces a
//! mode). Directories are entered with --recursive; encryption skips hidden
//! paths and existing containers, decryption touches only containers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use walkdir::WalkDir;

use aef_container::{decrypt_file, encrypt_file, EncryptOptions, ProgressFn};
use aef_core::config::AefConfig;
use aef_core::{CipherSuite, FORMAT_VERSION};
use aef_crypto::KdfParams;

// ── CLI structure ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "aef",
    about = "Password-based authenticated file encryption",
    disable_version_flag = true
)]
struct Cli {
    /// Files or directories to process
    #[arg(required_unless_present = "version")]
    paths: Vec<PathBuf>,

    /// Force encryption (default: inferred per path from the .crypt extension)
    #[arg(long, short = 'e', conflicts_with = "decrypt")]
    encrypt: bool,

    /// Force decryption
    #[arg(long, short = 'd')]
    decrypt: bool,

    /// Recurse into directories
    #[arg(long, short = 'r')]
    recursive: bool,

    /// Suppress informational output
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Print the container format version and exit
    #[arg(long, short = 'v')]
    version: bool,

    /// Chunk size in MiB (minimum 1)
    #[arg(long)]
    chunk: Option<u32>,

    /// Argon2id memory cost in KiB
    #[arg(long = "m")]
    m_kib: Option<u32>,

    /// Argon2id time cost (iterations)
    #[arg(long = "t")]
    t_cost: Option<u32>,

    /// Argon2id parallelism
    #[arg(long = "p")]
    p_lanes: Option<u32>,

    /// Cipher suite (xchacha20, aes-gcm-siv, twofish-gcm-siv,
    /// serpent-gcm-siv, camellia-gcm-siv, aurora-siv)
    #[arg(long, short = 'c')]
    cipher: Option<String>,

    /// Path to aef.toml configuration file
    #[arg(long, env = "AEF_CONFIG")]
    config: Option<PathBuf>,

    /// Password (non-interactive use; prompted twice otherwise)
    #[arg(long, env = "AEF_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Encrypt,
    Decrypt,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("AEF_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.version {
        println!("{FORMAT_VERSION}");
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let opts = build_options(&cli, &config)?;
    let password = resolve_password(cli.password.clone())?;

    let mut failures = 0usize;
    for path in &cli.paths {
        failures += process_path(path, &cli, &opts, &password);
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── Config loading ────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<AefConfig> {
    match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)
                .with_context(|| format!("reading config: {}", p.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing config: {}", p.display()))
        }
        None => Ok(AefConfig::default()),
    }
}

/// Merge config defaults and CLI flags into pipeline options.
fn build_options(cli: &Cli, config: &AefConfig) -> Result<EncryptOptions> {
    let cipher_name = cli.cipher.as_deref().unwrap_or(&config.cipher);
    let suite = CipherSuite::from_name(cipher_name)
        .with_context(|| format!("unknown cipher '{cipher_name}'"))?;

    let chunk_mib = cli.chunk.unwrap_or(config.chunk_mib).max(1);
    let chunk_size: u32 = chunk_mib
        .checked_mul(1 << 20)
        .with_context(|| format!("chunk size too large: {chunk_mib} MiB"))?;

    Ok(EncryptOptions {
        suite,
        chunk_size,
        kdf: KdfParams {
            mem_cost_kib: cli.m_kib.unwrap_or(config.kdf.m_kib),
            time_cost: cli.t_cost.unwrap_or(config.kdf.t),
            parallelism: cli.p_lanes.unwrap_or(config.kdf.p),
        },
        with_meta: true,
    })
}

// ── Password prompt ───────────────────────────────────────────────────────────

/// Use the provided password, or prompt twice and require a match.
fn resolve_password(password: Option<String>) -> Result<SecretString> {
    if let Some(p) = password {
        return Ok(SecretString::from(p));
    }
    let first =
        rpassword::prompt_password("Password: ").context("failed to read password from terminal")?;
    let second =
        rpassword::prompt_password("Confirm password: ").context("failed to read confirmation")?;
    if first != second {
        bail!("passwords do not match");
    }
    Ok(SecretString::from(first))
}

// ── Path collection ───────────────────────────────────────────────────────────

fn is_container(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e == aef_crypto::names::CONTAINER_EXT)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn infer_mode(cli: &Cli, path: &Path) -> Mode {
    if cli.encrypt {
        Mode::Encrypt
    } else if cli.decrypt {
        Mode::Decrypt
    } else if is_container(path) {
        Mode::Decrypt
    } else {
        Mode::Encrypt
    }
}

/// Process one operand; returns the number of failed files.
fn process_path(path: &Path, cli: &Cli, opts: &EncryptOptions, password: &SecretString) -> usize {
    if path.is_dir() {
        if !cli.recursive {
            eprintln!("error: {}: is a directory (use --recursive)", path.display());
            return 1;
        }
        return process_dir(path, cli, opts, password);
    }

    let mode = infer_mode(cli, path);
    match run_one(path, mode, cli, opts, password) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {}: {e:#}", path.display());
            1
        }
    }
}

/// Walk a directory tree, filtering per mode. Failures are reported per
/// file and the walk continues.
fn process_dir(dir: &Path, cli: &Cli, opts: &EncryptOptions, password: &SecretString) -> usize {
    // Forced --encrypt/--decrypt applies inside directories too; otherwise
    // the walk encrypts plain files and leaves containers alone.
    let decrypting = cli.decrypt;

    let mut failures = 0usize;
    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        // Never descend into hidden directories; hidden files are also
        // filtered here when encrypting.
        entry.path() == dir || decrypting || !is_hidden(entry.path())
    });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                eprintln!("error: {}: {e}", dir.display());
                failures += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        let mode = if decrypting {
            Mode::Decrypt
        } else {
            Mode::Encrypt
        };

        // Walk filters: encryption skips containers, decryption is
        // container-only.
        match mode {
            Mode::Encrypt if is_container(path) => continue,
            Mode::Decrypt if !is_container(path) => continue,
            _ => {}
        }

        if let Err(e) = run_one(path, mode, cli, opts, password) {
            eprintln!("error: {}: {e:#}", path.display());
            failures += 1;
        }
    }
    failures
}

// ── Single-file processing ────────────────────────────────────────────────────

fn run_one(
    path: &Path,
    mode: Mode,
    cli: &Cli,
    opts: &EncryptOptions,
    password: &SecretString,
) -> Result<()> {
    let bar = if cli.quiet {
        None
    } else {
        Some(make_progress_bar(path))
    };

    let progress: Option<ProgressFn> = bar.as_ref().map(|pb| {
        let pb = pb.clone();
        Box::new(move |done: u64, total: u64, _msg: &str| {
            pb.set_length(total);
            pb.set_position(done);
        }) as ProgressFn
    });

    let result = match mode {
        Mode::Encrypt => encrypt_file(path, password, opts, progress.as_ref()).map(|outcome| {
            (
                outcome.container,
                outcome.plaintext_bytes,
                "encrypted",
            )
        }),
        Mode::Decrypt => decrypt_file(path, password, progress.as_ref()).map(|outcome| {
            (
                outcome.plaintext,
                outcome.plaintext_bytes,
                "decrypted",
            )
        }),
    };

    if let Some(pb) = &bar {
        pb.finish_and_clear();
    }

    let (produced, bytes, verb) = result?;
    if !cli.quiet {
        println!(
            "{verb}: {} → {} ({})",
            path.display(),
            produced
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| produced.display().to_string()),
            fmt_bytes(bytes)
        );
    }
    Ok(())
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn make_progress_bar(path: &Path) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
            .expect("static template")
            .progress_chars("=>-"),
    );
    pb.set_prefix(
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
