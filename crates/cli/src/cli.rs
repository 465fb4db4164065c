//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::Compression;

/// CCD Streamer - simulated camera exposure transfer harness
#[derive(Parser, Debug)]
#[command(
    name = "ccd-streamer",
    author,
    version,
    about = "Transfer a stream of simulated CCD images",
    long_about = "Simulates a camera acquiring exposures on a fixed real-time cadence \n\
                  and transfers each staged image file to a remote destination, for \n\
                  load-testing data-transfer infrastructure without a telescope."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CCD_STREAMER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CCD_STREAMER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the exposure simulation
    Run(RunArgs),

    /// Validate a run configuration without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Run configuration file (TOML or JSON); flags override file values
    #[arg(long, env = "CCD_STREAMER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Destination URL with gsapi, boto, minio, https, http, bbcp, or scp
    /// scheme
    #[arg(short, long, value_name = "URL", env = "CCD_STREAMER_DESTINATION")]
    pub destination: Option<String>,

    /// Local time to start the simulation
    #[arg(short, long, value_name = "HH:MM")]
    pub starttime: Option<String>,

    /// Number of exposures to simulate per sensor
    #[arg(short, long, value_name = "EXPOSURES")]
    pub numexp: Option<u32>,

    /// Number of homogeneous CCDs to simulate, named from the node number
    #[arg(short, long, value_name = "CCDS", conflicts_with = "sensors")]
    pub ccds: Option<u32>,

    /// Explicit sensor identifiers, one worker each
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub sensors: Vec<String>,

    /// Interval between exposures in seconds
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Source image used for every exposure
    #[arg(short = 'I', long, value_name = "PATH")]
    pub inputfile: Option<PathBuf>,

    /// Directory searched for per-sensor source images
    #[arg(long, value_name = "PATH")]
    pub inputdir: Option<PathBuf>,

    /// Scratch root under which workers create their staging directories
    #[arg(short, long, value_name = "PATH")]
    pub tempdir: Option<PathBuf>,

    /// Compress images while staging
    #[arg(short = 'z', long)]
    pub compress: bool,

    /// Compression strategy used with --compress
    #[arg(long, value_enum, default_value = "gzip")]
    pub compressor: Compressor,

    /// Route object-store traffic over the private interconnect
    #[arg(short = 'P', long)]
    pub private: bool,

    /// Hosts file receiving the private-network override
    #[arg(long, value_name = "PATH", default_value = "/etc/hosts")]
    pub hosts_file: PathBuf,

    /// Object-store endpoint
    #[arg(long, value_name = "URL", env = "CCD_STREAMER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Environment variable holding credential material
    #[arg(long, value_name = "VAR", default_value = "CCD_STREAMER_KEY")]
    pub credential_env: String,

    /// File the credential material is written to
    #[arg(long, value_name = "PATH")]
    pub credential_file: Option<PathBuf>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "CCD_STREAMER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Run configuration file to validate
    #[arg(short, long, default_value = "run.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Staging-time compression strategy flag
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum Compressor {
    /// In-process gzip, staged as .fits.gz
    #[default]
    Gzip,
    /// External astronomy packer, staged as .fits.fz
    Fpack,
}

impl From<Compressor> for Compression {
    fn from(compressor: Compressor) -> Self {
        match compressor {
            Compressor::Gzip => Compression::Gzip,
            Compressor::Fpack => Compression::Fpack,
        }
    }
}
