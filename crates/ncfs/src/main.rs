//! NCFS command-line interface.
//!
//! Mounts a numeric-array dataset as a read-only filesystem, and offers
//! `ls`/`stat`/`cat` to inspect the same namespace without a kernel mount.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use daemonize::Daemonize;
use ncfs_core::DataRepresentation;
use ncfs_fuse::NcFs;
use ncfs_namespace::{MountContext, NamespaceCore, StatRecord};
use ncfs_repr::{AttrTextRepr, DataReprKind};
use serde::Serialize;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::filter::LevelFilter;

mod config;

use config::{Config, ReprConfig, cache_dir};

#[derive(Parser)]
#[command(name = "ncfs")]
#[command(about = "Mount numeric-array datasets as a read-only filesystem")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/ncfs/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ReprArg {
    Text,
    Binary,
}

impl From<ReprArg> for DataReprKind {
    fn from(arg: ReprArg) -> Self {
        match arg {
            ReprArg::Text => DataReprKind::Text,
            ReprArg::Binary => DataReprKind::Binary,
        }
    }
}

/// Representation overrides shared by the commands that render payloads.
#[derive(Args, Clone, Debug, Default)]
struct ReprArgs {
    /// Payload representation (overrides representation.data)
    #[arg(long, value_enum)]
    repr: Option<ReprArg>,

    /// printf-style format for text payloads (overrides representation.float_format)
    #[arg(long)]
    float_format: Option<String>,
}

impl ReprArgs {
    fn resolve(&self, config: &ReprConfig) -> Result<Box<dyn DataRepresentation>> {
        let merged = ReprConfig {
            data: self
                .repr
                .map_or_else(|| config.data.clone(), |arg| DataReprKind::from(arg).to_string()),
            float_format: self
                .float_format
                .clone()
                .unwrap_or_else(|| config.float_format.clone()),
        };
        merged.build()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a dataset
    Mount {
        /// Dataset file (.nc, or .json description)
        dataset: PathBuf,

        /// Mount point
        mountpoint: PathBuf,

        /// Run in foreground (don't daemonize)
        #[arg(short, long)]
        foreground: bool,

        /// Allow other users to access the mount
        #[arg(long)]
        allow_other: bool,

        #[command(flatten)]
        repr: ReprArgs,
    },

    /// List a namespace directory
    Ls {
        /// Dataset file
        dataset: PathBuf,

        /// Directory inside the namespace
        #[arg(default_value = "/")]
        path: String,
    },

    /// Print the stat record of a namespace entry
    Stat {
        /// Dataset file
        dataset: PathBuf,

        /// Entry inside the namespace
        path: String,

        #[command(flatten)]
        repr: ReprArgs,
    },

    /// Write a namespace file's content to stdout
    Cat {
        /// Dataset file
        dataset: PathBuf,

        /// File inside the namespace
        path: String,

        #[command(flatten)]
        repr: ReprArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for `stat`.
#[derive(Serialize)]
struct StatOutput {
    path: String,
    kind: &'static str,
    size: u64,
    mode: String,
    nlink: u32,
    uid: u32,
    gid: u32,
    mtime: u64,
}

impl StatOutput {
    fn new(path: &str, record: &StatRecord) -> Self {
        Self {
            path: path.to_string(),
            kind: if record.is_dir { "directory" } else { "file" },
            size: record.size,
            mode: format!("{:o}", record.mode),
            nlink: record.nlink,
            uid: record.uid,
            gid: record.gid,
            mtime: unix_seconds(record.mtime),
        }
    }
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// First 16 hex chars of the blake3 hash of the dataset path.
fn dataset_key(dataset: &Path) -> String {
    let hash = blake3::hash(dataset.to_string_lossy().as_bytes());
    hash.to_hex()[..16].to_string()
}

/// Get the PID file path for a mounted dataset.
///
/// Uses `$XDG_RUNTIME_DIR/ncfs/` if available, otherwise falls back to
/// `$XDG_CACHE_HOME/ncfs/run/`.
fn get_pid_path(dataset: &Path) -> Result<PathBuf> {
    let key = dataset_key(dataset);

    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        let dir = PathBuf::from(runtime_dir).join("ncfs");
        if std::fs::create_dir_all(&dir).is_ok() {
            return Ok(dir.join(format!("{key}.pid")));
        }
    }

    let dir = cache_dir()
        .context("Failed to get project directories")?
        .join("run");
    std::fs::create_dir_all(&dir).context("Failed to create PID directory")?;
    Ok(dir.join(format!("{key}.pid")))
}

/// Get the log file path for daemon output.
fn get_log_path(dataset: &Path) -> Result<PathBuf> {
    let dir = cache_dir()
        .context("Failed to get project directories")?
        .join("logs");
    std::fs::create_dir_all(&dir).context("Failed to create log directory")?;
    Ok(dir.join(format!("{}.log", dataset_key(dataset))))
}

/// Level used when `RUST_LOG` is unset.
fn log_level(verbose: u8, configured: &str) -> Level {
    match verbose {
        0 => configured.parse().unwrap_or(Level::WARN),
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

fn init_logging(level: Level) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Build the namespace for `dataset`.
///
/// The representation is built first so a bad format fails before the
/// dataset is opened.
fn open_namespace(dataset: &Path, data_repr: Box<dyn DataRepresentation>) -> Result<NamespaceCore> {
    let dataset = ncfs_dataset::open(dataset)
        .with_context(|| format!("Failed to open dataset {}", dataset.display()))?;
    Ok(NamespaceCore::new(
        dataset,
        data_repr,
        Box::new(AttrTextRepr::new()),
        MountContext::capture(),
    ))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(Some(path.clone()))
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    init_logging(log_level(cli.verbose, &config.logging.level))?;

    match cli.command {
        Commands::Mount {
            dataset,
            mountpoint,
            foreground,
            allow_other,
            repr,
        } => {
            if !mountpoint.is_dir() {
                anyhow::bail!("Mount point is not a directory: {}", mountpoint.display());
            }
            let dataset = dataset
                .canonicalize()
                .with_context(|| format!("Dataset not found: {}", dataset.display()))?;

            let data_repr = repr.resolve(&config.representation)?;
            let core = open_namespace(&dataset, data_repr)?;
            info!(
                "Mounting {} at {} ({} representation)",
                dataset.display(),
                mountpoint.display(),
                core.data_repr_name()
            );
            let fs = NcFs::new(core);

            let options = ncfs_fuse::mount_options(
                &config.mount.fs_name,
                allow_other || config.mount.allow_other,
            );

            if foreground {
                info!("Running in foreground (Ctrl+C to unmount)");
                fuser::mount2(fs, &mountpoint, &options)?;
            } else {
                let pid_path = get_pid_path(&dataset)?;
                let log_path = get_log_path(&dataset)?;

                println!("Mounting in background...");
                println!("PID file: {}", pid_path.display());
                println!("Log file: {}", log_path.display());
                println!("Unmount: fusermount -u {}", mountpoint.display());

                let stdout = File::create(&log_path).context("Failed to create log file")?;
                let stderr = stdout
                    .try_clone()
                    .context("Failed to duplicate log file handle")?;

                Daemonize::new()
                    .pid_file(&pid_path)
                    .chown_pid_file(true)
                    .working_directory("/")
                    .stdout(stdout)
                    .stderr(stderr)
                    .start()
                    .map_err(|e| anyhow::anyhow!("Failed to daemonize: {e}"))?;

                fuser::mount2(fs, &mountpoint, &options)?;
            }
            info!("Unmounted {}", mountpoint.display());
        }

        Commands::Ls { dataset, path } => {
            let data_repr = ReprArgs::default().resolve(&config.representation)?;
            let core = open_namespace(&dataset, data_repr)?;
            let entries = core.list(&path)?;

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&entries)
                            .context("Failed to serialize listing")?
                    );
                }
                OutputFormat::Text => {
                    for entry in entries {
                        println!("{entry}");
                    }
                }
            }
        }

        Commands::Stat {
            dataset,
            path,
            repr,
        } => {
            let core = open_namespace(&dataset, repr.resolve(&config.representation)?)?;
            let record = core.attributes_of(&path)?;
            let output = StatOutput::new(&path, &record);

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&output)
                            .context("Failed to serialize stat record")?
                    );
                }
                OutputFormat::Text => {
                    println!("  Path:  {}", output.path);
                    println!("  Type:  {}", output.kind);
                    println!("  Size:  {}", output.size);
                    println!("  Mode:  {}", output.mode);
                    println!("  Links: {}", output.nlink);
                    println!("  Owner: {}:{}", output.uid, output.gid);
                    println!("  Mtime: {}", output.mtime);
                }
            }
        }

        Commands::Cat {
            dataset,
            path,
            repr,
        } => {
            if matches!(cli.format, OutputFormat::Json) {
                warn!("--format json has no effect on cat");
            }
            let core = open_namespace(&dataset, repr.resolve(&config.representation)?)?;
            core.open(&path)?;
            let content = core.read(&path, 0, usize::MAX)?;
            core.close(&path);

            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&content)
                .context("Failed to write to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}
