//! kinseal: seal and open family-identity documents on the client
//!
//! Commands:
//!   keygen                 - generate a sealing key and store it as base64
//!   encrypt <files>...     - seal files into <name>.<extension>
//!   decrypt <files>...     - open sealed files, rejecting anything tampered
//!   config show            - display current configuration

mod files;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use kinseal_core::config::{expand_tilde, KinsealConfig};
use kinseal_core::keyfile::{resolve_key, write_key_file};
use kinseal_crypto::generate_key;

use crate::files::{ensure_distinct_outputs, opened_path, sealed_path, FileOutcome, Job};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "kinseal",
    version,
    about = "Client-side sealing for family-identity documents",
    long_about = "kinseal: AES-256-GCM sealing of certificates, profile images and other uploads"
)]
struct Cli {
    /// Path to kinseal.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "KINSEAL_CONFIG",
        default_value = "~/.config/kinseal/config.toml"
    )]
    config: PathBuf,

    /// Key file to use instead of the configured one
    #[arg(long, global = true, env = "KINSEAL_KEY_FILE")]
    key_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides logging.level
    #[arg(long, global = true, env = "KINSEAL_LOG")]
    log: Option<String>,

    /// Log format; overrides logging.format
    #[arg(long, global = true, env = "KINSEAL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new sealing key
    Keygen {
        /// Where to write the key (default: key.file from config)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// Replace an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Seal one or more files
    Encrypt {
        /// Files to seal
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory for sealed outputs (default: next to each input)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Context bound into the authentication tag (e.g. owner id)
        #[arg(long)]
        context: Option<String>,
    },

    /// Open one or more sealed files
    Decrypt {
        /// Sealed files to open
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory for opened outputs (default: next to each input)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Context the files were sealed with
        #[arg(long)]
        context: Option<String>,
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

#[derive(Clone, Copy, Debug)]
enum Direction {
    Seal,
    Open,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let loaded = load_config(&config_path).await?;
    let config = loaded.clone().unwrap_or_default();

    let level = cli.log.clone().unwrap_or_else(|| config.logging.level.clone());
    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| LogFormat::from_config(&config.logging.format));
    init_logging(&level, &format);

    if loaded.is_none() {
        warn!(
            "config file not found: {}  (using defaults)",
            config_path.display()
        );
    }

    match cli.command {
        Commands::Keygen { out, force } => cmd_keygen(&config, out.as_deref(), force),
        Commands::Encrypt { files, out_dir, context } => {
            cmd_batch(
                &config,
                cli.key_file.as_deref(),
                Direction::Seal,
                files,
                out_dir,
                context,
            )
            .await
        }
        Commands::Decrypt { files, out_dir, context } => {
            cmd_batch(
                &config,
                cli.key_file.as_deref(),
                Direction::Open,
                files,
                out_dir,
                context,
            )
            .await
        }
        Commands::Config { action: ConfigAction::Show } => {
            cmd_config_show(&config, &config_path, loaded.is_some())
        }
    }
}

/// Returns `None` when the file does not exist.
async fn load_config(path: &Path) -> Result<Option<KinsealConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config: {}", path.display()))?;
    let config = KinsealConfig::from_toml_str(&content)
        .with_context(|| format!("parsing config: {}", path.display()))?;
    Ok(Some(config))
}

fn init_logging(level: &str, format: &LogFormat) {
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

// ── `kinseal keygen` ──────────────────────────────────────────────────────────

fn cmd_keygen(config: &KinsealConfig, out: Option<&Path>, force: bool) -> Result<()> {
    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| expand_tilde(&config.key.file));

    let key = generate_key().context("generating key")?;
    write_key_file(&path, &key, force)
        .with_context(|| format!("writing key file {}", path.display()))?;

    info!(path = %path.display(), "generated new sealing key");
    println!("Key written to {}", path.display());
    println!("Keep a copy in your secret store: files sealed with it cannot be opened without it.");
    Ok(())
}

// ── `kinseal encrypt` / `kinseal decrypt` ─────────────────────────────────────

async fn cmd_batch(
    config: &KinsealConfig,
    key_file: Option<&Path>,
    direction: Direction,
    inputs: Vec<PathBuf>,
    out_dir: Option<PathBuf>,
    context: Option<String>,
) -> Result<()> {
    let plan = plan_outputs(direction, inputs, out_dir.as_deref(), &config.output.extension)?;

    let (key, source) = resolve_key(key_file, &config.key).context("loading sealing key")?;
    info!(source = %source, files = plan.len(), ?direction, "key loaded");

    let job = Job {
        key: Arc::new(key),
        context: Arc::from(context.unwrap_or_default().into_bytes()),
        overwrite: config.output.overwrite,
    };

    let label = match direction {
        Direction::Seal => "sealing",
        Direction::Open => "opening",
    };
    let pb = make_progress_bar(plan.len() as u64, label);

    let mut tasks = JoinSet::new();
    for (input, output) in plan {
        let job = job.clone();
        tasks.spawn(async move {
            let result = match direction {
                Direction::Seal => job.seal(input.clone(), output).await,
                Direction::Open => job.open(input.clone(), output).await,
            };
            (input, result)
        });
    }

    let mut done: Vec<FileOutcome> = Vec::new();
    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        let (input, result) = joined.context("file task panicked")?;
        match result {
            Ok(outcome) => {
                pb.set_message(display_name(&outcome.input));
                done.push(outcome);
            }
            Err(e) => {
                failed += 1;
                error!(input = %input.display(), "{e:#}");
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    done.sort_by(|a, b| a.input.cmp(&b.input));
    for outcome in &done {
        println!(
            "{} -> {} ({} -> {})",
            outcome.input.display(),
            outcome.output.display(),
            fmt_bytes(outcome.bytes_in),
            fmt_bytes(outcome.bytes_out)
        );
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} file(s) failed", failed + done.len());
    }
    Ok(())
}

/// Pair each input with its output path, refusing batches where two inputs
/// collide (same file twice, or the same name from two dirs into `--out-dir`).
fn plan_outputs(
    direction: Direction,
    inputs: Vec<PathBuf>,
    out_dir: Option<&Path>,
    extension: &str,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let plan: Vec<(PathBuf, PathBuf)> = inputs
        .into_iter()
        .map(|input| {
            let output = match direction {
                Direction::Seal => sealed_path(&input, out_dir, extension),
                Direction::Open => opened_path(&input, out_dir, extension),
            };
            (input, output)
        })
        .collect();
    ensure_distinct_outputs(plan.iter().map(|(i, o)| (i.as_path(), o.as_path())))?;
    Ok(plan)
}

// ── `kinseal config show` ─────────────────────────────────────────────────────

fn cmd_config_show(config: &KinsealConfig, config_path: &Path, from_file: bool) -> Result<()> {
    if from_file {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = config
        .to_toml_string()
        .context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn make_progress_bar(total: u64, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

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
        format!("{} B", bytes)
    }
}
