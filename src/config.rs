use crate::error::Result as ConduitResult;
use crate::lnd_log::Severity;
use crate::utils::{default_conduit_dir, unique_file_name};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Name of the configuration file inside the conduit directory
pub const CONFIG_FILE_NAME: &str = "conduit.toml";

/// Name of the log file inside the conduit directory
pub const LOG_FILE_NAME: &str = "logfile.log";

const DEFAULT_CONFIG_HEADER: &str = "# Conduit Configuration File\n\
# Unset options fall back to built-in defaults. Any option can also be set\n\
# through CONDUIT_* environment variables (e.g. CONDUIT_LND__BINARY).\n\n";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConduitConfig {
    /// Directory holding the config file and logfile
    #[serde(default = "default_conduit_dir")]
    pub conduit_dir: PathBuf,

    /// Mirror logs to the console as well as the logfile
    #[serde(default = "default_console_output")]
    pub console_output: bool,

    /// Minimum severity written to any log output
    #[serde(default = "default_log_level")]
    pub log_level: Severity,

    /// Console format: pretty, compact or json
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,

    #[serde(default)]
    pub lnd: LndConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LndConfig {
    /// Executable name or path of the node daemon
    #[serde(default = "default_lnd_binary")]
    pub binary: String,

    /// Arguments always passed to the daemon
    #[serde(default = "default_lnd_args")]
    pub args: Vec<String>,

    /// Arguments used for the one-shot version query
    #[serde(default = "default_version_args")]
    pub version_args: Vec<String>,

    /// Seconds to wait for the daemon after asking it to stop
    #[serde(default = "default_stop_timeout_seconds")]
    pub stop_timeout_seconds: u64,

    /// Flat pass-through options, rendered as `--key=value`
    #[serde(default)]
    pub extra: BTreeMap<String, String>,

    /// Print the daemon's version and exit instead of supervising
    #[serde(skip)]
    pub show_version: bool,
}

impl LndConfig {
    /// Finished argument list for the long-running daemon.
    ///
    /// `args` first, then `extra` in key order. An empty or `"true"` value
    /// renders a bare flag; `"false"` drops it.
    pub fn command_args(&self) -> Vec<String> {
        let mut command_args = self.args.clone();
        for (key, value) in &self.extra {
            match value.trim() {
                "" | "true" => command_args.push(format!("--{}", key)),
                "false" => {}
                value => command_args.push(format!("--{}={}", key, value)),
            }
        }
        command_args
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_seconds)
    }
}

impl ConduitConfig {
    /// Load configuration from the default file in the default directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file(default_conduit_dir().join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default(
                "conduit_dir",
                default_conduit_dir().to_string_lossy().into_owned(),
            )?
            .set_default("console_output", default_console_output())?
            .set_default("log_level", default_log_level().as_str())?
            .set_default("lnd.binary", default_lnd_binary())?
            .set_default("lnd.args", default_lnd_args())?
            .set_default("lnd.version_args", default_version_args())?
            .set_default(
                "lnd.stop_timeout_seconds",
                default_stop_timeout_seconds() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with CONDUIT_ prefix
            .add_source(
                Environment::with_prefix("CONDUIT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut config: ConduitConfig = settings.try_deserialize()?;

        if config.conduit_dir.as_os_str().is_empty() {
            config.conduit_dir = default_conduit_dir();
        }

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lnd.binary.trim().is_empty() {
            return Err(ConfigError::Message(
                "lnd.binary must not be empty".to_string(),
            ));
        }

        if self.lnd.stop_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "lnd.stop_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        for key in self.lnd.extra.keys() {
            if key.trim().is_empty() {
                return Err(ConfigError::Message(
                    "lnd.extra contains an empty option name".to_string(),
                ));
            }
            if key.starts_with('-') {
                return Err(ConfigError::Message(format!(
                    "lnd.extra option '{}' must be given without leading dashes",
                    key
                )));
            }
        }

        if let Some(format) = &self.log_format {
            if !matches!(format.as_str(), "pretty" | "compact" | "json") {
                return Err(ConfigError::Message(format!(
                    "log_format must be pretty, compact or json, got '{}'",
                    format
                )));
            }
        }

        Ok(())
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.conduit_dir.join(LOG_FILE_NAME)
    }

    /// Default configuration rendered as a commented TOML document
    pub fn default_toml() -> ConduitResult<String> {
        let body = toml::to_string_pretty(&ConduitConfig::default())?;
        Ok(format!("{}{}", DEFAULT_CONFIG_HEADER, body))
    }

    /// Write the default configuration into `dir` without overwriting
    /// anything; returns the path actually written.
    pub fn write_default<P: AsRef<Path>>(dir: P) -> ConduitResult<PathBuf> {
        let path = unique_file_name(dir.as_ref().join(CONFIG_FILE_NAME));
        fs::write(&path, Self::default_toml()?)?;
        info!("Wrote default configuration to {}", path.display());
        Ok(path)
    }
}

impl Default for ConduitConfig {
    fn default() -> Self {
        Self {
            conduit_dir: default_conduit_dir(),
            console_output: default_console_output(),
            log_level: default_log_level(),
            log_format: None,
            lnd: LndConfig::default(),
        }
    }
}

impl Default for LndConfig {
    fn default() -> Self {
        Self {
            binary: default_lnd_binary(),
            args: default_lnd_args(),
            version_args: default_version_args(),
            stop_timeout_seconds: default_stop_timeout_seconds(),
            extra: BTreeMap::new(),
            show_version: false,
        }
    }
}

// Default value functions
fn default_console_output() -> bool {
    true
}
fn default_log_level() -> Severity {
    Severity::Info
}

fn default_lnd_binary() -> String {
    "lnd".to_string()
}
fn default_lnd_args() -> Vec<String> {
    vec![
        "--bitcoin.simnet".to_string(),
        "--bitcoin.active".to_string(),
        "--bitcoin.node=btcd".to_string(),
    ]
}
fn default_version_args() -> Vec<String> {
    vec!["--version".to_string()]
}
fn default_stop_timeout_seconds() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ConduitConfig::default();

        assert!(config.validate().is_ok());
        assert!(config.console_output);
        assert_eq!(config.log_level, Severity::Info);
        assert_eq!(config.lnd.binary, "lnd");
        assert_eq!(config.lnd.stop_timeout(), Duration::from_secs(30));
        assert!(!config.lnd.show_version);
        assert_eq!(config.log_file_path().file_name().unwrap(), LOG_FILE_NAME);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = ConduitConfig::load_from_file(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.lnd.binary, "lnd");
        assert_eq!(config.lnd.args, default_lnd_args());
        assert_eq!(config.lnd.version_args, vec!["--version".to_string()]);
        assert!(config.lnd.extra.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            format!(
                r#"
conduit_dir = "{}"
console_output = false
log_level = "debug"

[lnd]
binary = "/opt/lnd/bin/lnd"
args = ["--bitcoin.testnet"]

[lnd.extra]
alias = "conduit-node"
"#,
                dir.path().display()
            ),
        )
        .unwrap();

        let config = ConduitConfig::load_from_file(&path).unwrap();
        assert_eq!(config.conduit_dir, dir.path());
        assert!(!config.console_output);
        assert_eq!(config.log_level, Severity::Debug);
        assert_eq!(config.lnd.binary, "/opt/lnd/bin/lnd");
        assert_eq!(
            config.lnd.command_args(),
            vec![
                "--bitcoin.testnet".to_string(),
                "--alias=conduit-node".to_string()
            ]
        );
        // untouched sections keep their defaults
        assert_eq!(config.lnd.stop_timeout_seconds, 30);
    }

    #[test]
    fn test_yaml_file_is_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "console_output: false\nconduit_dir: \"\"\n").unwrap();

        let config = ConduitConfig::load_from_file(&path).unwrap();
        assert!(!config.console_output);
        // empty directory falls back to the default
        assert_eq!(config.conduit_dir, default_conduit_dir());
    }

    #[test]
    fn test_environment_variable_override() {
        env::set_var("CONDUIT_LOG_FORMAT", "json");

        let dir = tempdir().unwrap();
        let config = ConduitConfig::load_from_file(dir.path().join("absent.toml")).unwrap();

        env::remove_var("CONDUIT_LOG_FORMAT");
        assert_eq!(config.log_format.as_deref(), Some("json"));
    }

    #[test]
    fn test_command_args_rendering() {
        let mut lnd = LndConfig {
            args: vec!["--bitcoin.active".to_string()],
            ..LndConfig::default()
        };
        lnd.extra.insert("norest".to_string(), "true".to_string());
        lnd.extra.insert("nolisten".to_string(), "".to_string());
        lnd.extra.insert("rejectpush".to_string(), "false".to_string());
        lnd.extra.insert("debuglevel".to_string(), "debug".to_string());

        assert_eq!(
            lnd.command_args(),
            vec![
                "--bitcoin.active".to_string(),
                "--debuglevel=debug".to_string(),
                "--nolisten".to_string(),
                "--norest".to_string(),
            ]
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = ConduitConfig::default();
        config.lnd.binary = "  ".to_string();
        assert!(config.validate().is_err());

        config.lnd.binary = "lnd".to_string();
        config.lnd.stop_timeout_seconds = 0;
        assert!(config.validate().is_err());

        config.lnd.stop_timeout_seconds = 5;
        config
            .lnd
            .extra
            .insert("--alias".to_string(), "x".to_string());
        assert!(config.validate().is_err());

        config.lnd.extra.clear();
        config.log_format = Some("xml".to_string());
        assert!(config.validate().is_err());

        config.log_format = Some("compact".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_write_default_never_overwrites() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&existing, "console_output = false\n").unwrap();

        let written = ConduitConfig::write_default(dir.path()).unwrap();
        assert_ne!(written, existing);
        assert_eq!(
            fs::read_to_string(&existing).unwrap(),
            "console_output = false\n"
        );

        let loaded = ConduitConfig::load_from_file(&written).unwrap();
        assert_eq!(loaded.lnd, LndConfig::default());
        assert_eq!(loaded.log_level, Severity::Info);
    }
}
