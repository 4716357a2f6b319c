mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_ensure_binary, cmd_pki, cmd_run};
use output::print_error;

/// provkit - replay provisioning steps for real or as a shell transcript
#[derive(Parser)]
#[command(name = "provkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Flags shared by every command that opens a session.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
  /// Print what would be done instead of doing it
  #[arg(long)]
  pub dry_run: bool,

  /// Download for real even with --dry-run
  #[arg(long)]
  pub allow_real_download: bool,

  /// Working directory; binaries land in <workdir>/bin
  #[arg(long, default_value = ".")]
  pub workdir: PathBuf,

  /// JSON config file (default: the user's provkit config, if present)
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Append the dry-run transcript to this file instead of stdout
  #[arg(long)]
  pub transcript: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a JSON provisioning plan
  Run {
    /// Path to the plan file
    plan: PathBuf,

    #[command(flatten)]
    session: SessionArgs,
  },

  /// Make sure a binary is present and print its path
  EnsureBinary {
    /// Binary name, without platform suffix
    name: String,

    /// Download source, optionally `ARCHIVE#MEMBER`
    source: String,

    #[command(flatten)]
    session: SessionArgs,
  },

  /// Generate a CA and admin certificate
  Pki {
    /// Output directory
    path: PathBuf,

    /// Additional subject alternative name (repeatable)
    #[arg(long = "san")]
    sans: Vec<String>,

    #[command(flatten)]
    session: SessionArgs,
  },
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Run { plan, session } => cmd_run(&plan, &session),
    Commands::EnsureBinary { name, source, session } => cmd_ensure_binary(&name, &source, &session),
    Commands::Pki { path, sans, session } => cmd_pki(&path, &sans, &session),
  };

  if let Err(err) = result {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}
