use anyhow::{Context, Result};
use clap::Parser;
use conduit::config::CONFIG_FILE_NAME;
use conduit::utils::{default_conduit_dir, ensure_dir};
use conduit::{init_logging, ConduitConfig, Orchestrator, RunOutcome, Severity, ShutdownSignal};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "conduit")]
#[command(about = "Supervisor for an lnd node daemon")]
#[command(long_about = "Conduit starts an lnd node daemon, forwards its log output into \
structured logs, and stops it gracefully on SIGINT or SIGTERM. Options can come from the \
config file, CONDUIT_* environment variables, or the command line, in increasing priority.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", help = "Path to configuration file [default: <conduit-dir>/conduit.toml]")]
    config: Option<PathBuf>,

    /// Directory for the config file and logfile
    #[arg(long, value_name = "DIR", help = "Directory holding conduit.toml and logfile.log")]
    conduit_dir: Option<PathBuf>,

    /// Mirror logs to the console
    #[arg(long, value_name = "BOOL", help = "Mirror logs to stderr (true or false)")]
    console_output: Option<bool>,

    /// Minimum log severity
    #[arg(long, value_name = "LEVEL", help = "Log level: trace, debug, info, warn, error or fatal")]
    log_level: Option<Severity>,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Print conduit's version and exit
    #[arg(short = 'v', long, help = "Print conduit version and exit")]
    version: bool,

    /// Print lnd's version and exit
    #[arg(short = 'V', long, help = "Print the lnd version and exit")]
    lnd_version: bool,

    /// Extra argument for lnd
    #[arg(long = "lnd-arg", value_name = "ARG", allow_hyphen_values = true, help = "Additional argument passed to lnd (repeatable)")]
    lnd_args: Vec<String>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit without starting lnd")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Write default configuration and exit
    #[arg(long, help = "Write a default conduit.toml into the conduit directory and exit")]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.version {
        println!("conduit {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.print_config {
        print!("{}", ConduitConfig::default_toml()?);
        return Ok(());
    }

    let config = load_config(&args)?;

    if args.init_config {
        ensure_dir(&config.conduit_dir)
            .with_context(|| format!("creating {}", config.conduit_dir.display()))?;
        let path = ConduitConfig::write_default(&config.conduit_dir)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    // Validate configuration if requested
    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }
    config.validate().context("invalid configuration")?;

    let exit_code = run(config).await?;
    std::process::exit(exit_code);
}

/// Resolve the config file, load it, and apply command line overrides
fn load_config(args: &Args) -> Result<ConduitConfig> {
    let conduit_dir = args.conduit_dir.clone().unwrap_or_else(default_conduit_dir);
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| conduit_dir.join(CONFIG_FILE_NAME));

    let mut config = ConduitConfig::load_from_file(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    if let Some(dir) = &args.conduit_dir {
        config.conduit_dir = dir.clone();
    }
    if let Some(console_output) = args.console_output {
        config.console_output = console_output;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if let Some(format) = &args.log_format {
        config.log_format = Some(format.clone());
    }
    config.lnd.show_version = args.lnd_version;
    config.lnd.args.extend(args.lnd_args.iter().cloned());

    Ok(config)
}

/// Supervise lnd until shutdown; returns the process exit code.
///
/// The logging guard lives for the whole call so the logfile is flushed
/// before the process exits.
async fn run(config: ConduitConfig) -> Result<i32> {
    let _log_guard = init_logging(&config)?;

    info!("Starting Conduit v{}", env!("CARGO_PKG_VERSION"));
    info!("Conduit directory: {}", config.conduit_dir.display());

    let shutdown = ShutdownSignal::new();
    shutdown.install_os_handlers();

    let mut orchestrator = Orchestrator::new(config.lnd.clone(), shutdown);
    let exit_code = match orchestrator.run().await {
        Ok(RunOutcome::VersionRequested { .. }) => 0,
        Ok(RunOutcome::Stopped { reason, outcome }) => {
            info!("lnd {} after shutdown ({})", outcome, reason);
            0
        }
        Err(e) => {
            error!("Conduit stopped: {}", e);
            if !config.console_output {
                eprintln!("Error: {}", e);
            }
            e.exit_code()
        }
    };

    info!("Conduit exited with code: {}", exit_code);
    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_command_line_overrides_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("absent.toml");
        let config_path = config_path.to_string_lossy().into_owned();
        let conduit_dir = dir.path().to_string_lossy().into_owned();
        let args = Args::try_parse_from([
            "conduit",
            "--config",
            config_path.as_str(),
            "--conduit-dir",
            conduit_dir.as_str(),
            "--console-output",
            "false",
            "--log-level",
            "debug",
            "-V",
            "--lnd-arg",
            "--debuglevel=debug",
        ])
        .unwrap();

        let config = load_config(&args).unwrap();
        assert_eq!(config.conduit_dir, dir.path());
        assert!(!config.console_output);
        assert_eq!(config.log_level, Severity::Debug);
        assert!(config.lnd.show_version);
        assert_eq!(
            config.lnd.args.last().map(String::as_str),
            Some("--debuglevel=debug")
        );
    }

    #[test]
    fn test_version_flags_are_distinct() {
        let args = Args::try_parse_from(["conduit", "-v"]).unwrap();
        assert!(args.version && !args.lnd_version);

        let args = Args::try_parse_from(["conduit", "--lnd-version"]).unwrap();
        assert!(args.lnd_version && !args.version);
    }
}
