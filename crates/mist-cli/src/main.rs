//! mist: scatter a file into encrypted content-addressed blocks, and gather it back
//!
//! Commands:
//!   vaporize <file>   - publish a file, print its archive ID
//!   condense <id>     - recover the bytes behind an archive ID
//!   config show       - display the effective configuration
//!
//! Exit codes: 1 = missing FILE, 2 = missing ID, 3 = any other failure,
//! 64 = any other usage error (bad flag value, malformed archive ID).

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

use mist_archive::{ArchiveOptions, Condenser, ProgressFn, Vaporizer};
use mist_core::config::expand_tilde;
use mist_core::{Address, ArchiveFormat, MistConfig, MistError};

const EXIT_MISSING_FILE: u8 = 1;
const EXIT_MISSING_ID: u8 = 2;
const EXIT_FAILURE: u8 = 3;
const EXIT_USAGE: u8 = 64;

const DEFAULT_CONFIG_PATH: &str = "~/.config/mist/config.toml";

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "mist",
    version,
    about = "Passphrase-encrypted file archives on content-addressed block stores",
    long_about = "mist: vaporize a file into encrypted blocks on IPFS (or OpenDAL storage) \
                  and condense it back with the passphrase and archive ID"
)]
struct Cli {
    /// Path to config.toml (default: ~/.config/mist/config.toml)
    #[arg(long, short = 'c', env = "MIST_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive (RUST_LOG wins when set)
    #[arg(long, global = true)]
    log: Option<String>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file into blocks and print its archive ID
    #[command(visible_alias = "v")]
    Vaporize {
        /// File to publish
        file: Option<PathBuf>,
        /// Passphrase (prompted for when absent)
        #[arg(long, short = 'p', env = "MIST_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
        /// Chunk size in bytes (overrides archive.block_size)
        #[arg(long, short = 'b')]
        blocksize: Option<NonZeroUsize>,
        /// Archive layout (overrides archive.format)
        #[arg(long)]
        format: Option<ArchiveFormat>,
    },

    /// Recover a file from its archive ID
    #[command(visible_alias = "c")]
    Condense {
        /// Archive ID printed by `vaporize`
        id: Option<String>,
        /// Passphrase (prompted for when absent)
        #[arg(long, short = 'p', env = "MIST_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = usage_exit_code(&e);
            if code == 0 {
                e.exit();
            }
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match &cli.command {
        Commands::Vaporize { file: None, .. } => {
            eprintln!("mist: missing FILE argument\nusage: mist vaporize <FILE> [-p PASSPHRASE] [-b BLOCKSIZE]");
            return ExitCode::from(EXIT_MISSING_FILE);
        }
        Commands::Condense { id: None, .. } => {
            eprintln!("mist: missing ID argument\nusage: mist condense <ID> [-p PASSPHRASE] [-o OUTPUT]");
            return ExitCode::from(EXIT_MISSING_ID);
        }
        _ => {}
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mist: {e:#}");
            ExitCode::from(failure_exit_code(&e))
        }
    }
}

/// Help and version requests exit 0; every other parse error is a usage error.
fn usage_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => EXIT_USAGE,
    }
}

/// A malformed archive ID is bad input, not a failed operation.
fn failure_exit_code(err: &anyhow::Error) -> u8 {
    let bad_input = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<MistError>(),
            Some(MistError::InvalidIdentifier(_))
        )
    });
    if bad_input {
        EXIT_USAGE
    } else {
        EXIT_FAILURE
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| expand_tilde(Path::new(DEFAULT_CONFIG_PATH)));
    let config = MistConfig::load(&config_path)
        .with_context(|| format!("loading config: {}", config_path.display()))?;

    let level = cli.log.as_deref().unwrap_or(&config.log.level);
    let format = cli.log_format.unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(level, format);
    debug!(
        path = %config_path.display(),
        backend = ?config.store.backend,
        "config loaded"
    );

    match cli.command {
        Commands::Vaporize {
            file,
            passphrase,
            blocksize,
            format,
        } => {
            let file = file.context("missing FILE argument")?;
            cmd_vaporize(&config, &file, passphrase, blocksize, format).await
        }
        Commands::Condense {
            id,
            passphrase,
            output,
        } => {
            let id = id.context("missing ID argument")?;
            cmd_condense(&config, &id, passphrase, output.as_deref()).await
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path),
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// Install the tracing subscriber on stderr so stdout carries only output.
fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

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

// ── Passphrase ────────────────────────────────────────────────────────────────

/// `--passphrase` / `MIST_PASSPHRASE`, else an interactive prompt.
fn resolve_passphrase(given: Option<String>, confirm: bool) -> Result<SecretString> {
    if let Some(p) = given {
        return Ok(SecretString::from(p));
    }

    let first = SecretString::from(
        rpassword::prompt_password("Passphrase: ").context("reading passphrase")?,
    );
    if confirm {
        let second = SecretString::from(
            rpassword::prompt_password("Confirm passphrase: ").context("reading passphrase")?,
        );
        if first.expose_secret() != second.expose_secret() {
            anyhow::bail!("passphrases do not match");
        }
    }
    Ok(first)
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn make_progress_bar(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn progress_callback(pb: &ProgressBar) -> ProgressFn {
    let pb = pb.clone();
    Box::new(move |done: u64, total: u64, msg: &str| {
        if total > 0 {
            pb.set_length(total);
        }
        pb.set_position(done);
        pb.set_message(msg.to_string());
    })
}

// ── `mist vaporize` ───────────────────────────────────────────────────────────

async fn cmd_vaporize(
    config: &MistConfig,
    file: &Path,
    passphrase: Option<String>,
    blocksize: Option<NonZeroUsize>,
    format: Option<ArchiveFormat>,
) -> Result<()> {
    let mut options = ArchiveOptions::from_config(&config.archive)?;
    if let Some(bs) = blocksize {
        options = options.with_block_size(bs);
    }
    if let Some(f) = format {
        options = options.with_format(f);
    }

    tokio::fs::metadata(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let passphrase = resolve_passphrase(passphrase, true)?;
    let store = mist_store::open_store(&config.store).context("opening block store")?;

    let pb = make_progress_bar("vaporize");
    let mut vaporizer = Vaporizer::new(store.as_ref(), options).with_progress(progress_callback(&pb));
    let result = vaporizer.run_file(&passphrase, file).await;
    pb.finish_and_clear();

    let report = result.with_context(|| {
        format!(
            "vaporizing {} ({} blocks already written are orphaned)",
            file.display(),
            vaporizer.orphans().len()
        )
    })?;

    println!("ID: {}", report.header);
    Ok(())
}

// ── `mist condense` ───────────────────────────────────────────────────────────

async fn cmd_condense(
    config: &MistConfig,
    id: &str,
    passphrase: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let id: Address = id.parse()?;
    let options = ArchiveOptions::from_config(&config.archive)?;
    let passphrase = resolve_passphrase(passphrase, false)?;
    let store = mist_store::open_store(&config.store).context("opening block store")?;

    let pb = make_progress_bar("condense");
    let condenser = Condenser::new(store.as_ref(), options).with_progress(progress_callback(&pb));

    match output {
        Some(path) => {
            let result = condenser.run_to_file(&passphrase, &id, path).await;
            pb.finish_and_clear();
            let written =
                result.with_context(|| format!("condensing {id} to {}", path.display()))?;
            eprintln!("{written} bytes written to {}", path.display());
        }
        None => {
            let result = condenser.run(&passphrase, &id).await;
            pb.finish_and_clear();
            let data = result.with_context(|| format!("condensing {id}"))?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data).context("writing to stdout")?;
            stdout.flush().context("flushing stdout")?;
        }
    }
    Ok(())
}

// ── `mist config show` ────────────────────────────────────────────────────────

fn cmd_config_show(config: &MistConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}
