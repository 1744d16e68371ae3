//! Boot Configuration
//!
//! Decides which kernel config, asset directory and command script the
//! runtime starts with.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Command line: `--config PATH`, `--assets DIR`, `--tracking`, `[SCRIPT]`
//! 2. Environment variables: `STAGEHAND_CONFIG`, `STAGEHAND_ASSETS`
//! 3. `stagehand.toml` in the working directory
//! 4. Built-in defaults
//!
//! With no script argument (or `-`), commands are read from stdin.

use stage_kernel::{ConfigError, KernelConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_ENV: &str = "STAGEHAND_CONFIG";
const ASSETS_ENV: &str = "STAGEHAND_ASSETS";
const LOCAL_CONFIG: &str = "stagehand.toml";

pub const USAGE: &str = "usage: stagehand [--config PATH] [--assets DIR] [--tracking] [SCRIPT|-]";

/// Errors while assembling the boot configuration
#[derive(Debug, Error)]
pub enum BootError {
    #[error("Unknown option: {0}\n{USAGE}")]
    UnknownOption(String),

    #[error("Option {0} needs a value\n{USAGE}")]
    MissingValue(&'static str),

    #[error("Unexpected argument: {0}\n{USAGE}")]
    UnexpectedArgument(String),

    #[error("Config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Parsed command line
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub assets: Option<PathBuf>,
    pub tracking: bool,
    pub script: Option<PathBuf>,
    pub help: bool,
}

impl Args {
    /// Parse arguments (without the program name)
    pub fn parse<I, S>(args: I) -> Result<Self, BootError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let value = args.next().ok_or(BootError::MissingValue("--config"))?;
                    parsed.config = Some(value.into());
                }
                "--assets" | "-a" => {
                    let value = args.next().ok_or(BootError::MissingValue("--assets"))?;
                    parsed.assets = Some(value.into());
                }
                "--tracking" => parsed.tracking = true,
                "--help" | "-h" => parsed.help = true,
                "-" => {}
                other if other.starts_with('-') => {
                    return Err(BootError::UnknownOption(other.to_string()))
                }
                _ if parsed.script.is_some() => return Err(BootError::UnexpectedArgument(arg)),
                _ => parsed.script = Some(arg.into()),
            }
        }

        Ok(parsed)
    }
}

/// Where the kernel config came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Complete boot configuration
#[derive(Debug, Clone)]
pub struct BootConfig {
    pub kernel: KernelConfig,
    pub source: ConfigSource,
    /// Asset directory for the headless runtime
    pub asset_dir: Option<PathBuf>,
    /// Pretend face/image tracking is available
    pub tracking: bool,
    /// Script file, `None` for stdin
    pub script: Option<PathBuf>,
}

impl BootConfig {
    /// Load boot configuration from all sources
    pub fn load(args: &Args) -> Result<Self, BootError> {
        let env_config = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let env_assets = std::env::var_os(ASSETS_ENV).map(PathBuf::from);
        Self::resolve(args, env_config, env_assets, Path::new(LOCAL_CONFIG))
    }

    fn resolve(
        args: &Args,
        env_config: Option<PathBuf>,
        env_assets: Option<PathBuf>,
        local_config: &Path,
    ) -> Result<Self, BootError> {
        // An explicitly named file must exist; the local file is optional.
        let explicit = args.config.clone().or(env_config);
        let path = match explicit {
            Some(path) => Some(path),
            None if local_config.is_file() => Some(local_config.to_path_buf()),
            None => None,
        };

        let (kernel, source) = match path {
            Some(path) => {
                let kernel = KernelConfig::load(&path).map_err(|source| BootError::Config {
                    path: path.clone(),
                    source,
                })?;
                (kernel, ConfigSource::File(path))
            }
            None => (KernelConfig::default(), ConfigSource::Defaults),
        };

        Ok(Self {
            kernel,
            source,
            asset_dir: args.assets.clone().or(env_assets),
            tracking: args.tracking,
            script: args.script.clone(),
        })
    }

    /// Log the configuration
    pub fn print_summary(&self) {
        match &self.source {
            ConfigSource::File(path) => log::info!("Config: {}", path.display()),
            ConfigSource::Defaults => log::info!("Config: built-in defaults"),
        }
        match self.kernel.stream.capacity {
            Some(capacity) => log::info!(
                "Stream: bounded({}), {:?} when full",
                capacity,
                self.kernel.stream.backpressure
            ),
            None => log::info!("Stream: unbounded"),
        }
        log::info!(
            "Scenes: {} registered, caching {}",
            self.kernel.scenes.len(),
            if self.kernel.cache_scenes { "on" } else { "off" }
        );
        match &self.asset_dir {
            Some(dir) => log::info!("Assets: {}", dir.display()),
            None => log::info!("Assets: in-memory (configured scene assets only)"),
        }
        match &self.script {
            Some(path) => log::info!("Script: {}", path.display()),
            None => log::info!("Script: stdin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse([
            "--config",
            "a.toml",
            "--assets",
            "assets",
            "--tracking",
            "demo.jsonl",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("a.toml")));
        assert_eq!(args.assets, Some(PathBuf::from("assets")));
        assert!(args.tracking);
        assert_eq!(args.script, Some(PathBuf::from("demo.jsonl")));

        let args = Args::parse(["-"]).unwrap();
        assert_eq!(args.script, None);

        assert!(matches!(Args::parse(["--config"]), Err(BootError::MissingValue("--config"))));
        assert!(matches!(Args::parse(["--frobnicate"]), Err(BootError::UnknownOption(_))));
        assert!(matches!(Args::parse(["a", "b"]), Err(BootError::UnexpectedArgument(_))));
    }

    #[test]
    fn test_resolve_priority() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("stagehand.toml");
        let explicit = dir.path().join("explicit.toml");
        std::fs::write(&local, "debug = true\n").unwrap();
        std::fs::write(&explicit, "[registry]\ncache = false\n").unwrap();

        // Local file when nothing else is given
        let boot = BootConfig::resolve(&Args::default(), None, None, &local).unwrap();
        assert_eq!(boot.source, ConfigSource::File(local.clone()));
        assert!(boot.kernel.debug);

        // Environment beats the local file
        let boot =
            BootConfig::resolve(&Args::default(), Some(explicit.clone()), None, &local).unwrap();
        assert_eq!(boot.source, ConfigSource::File(explicit.clone()));
        assert!(!boot.kernel.cache_scenes);

        // Command line beats the environment
        let args = Args {
            config: Some(local.clone()),
            assets: Some(PathBuf::from("cli-assets")),
            ..Args::default()
        };
        let env_assets = Some(PathBuf::from("env-assets"));
        let boot = BootConfig::resolve(&args, Some(explicit), env_assets, &local).unwrap();
        assert_eq!(boot.source, ConfigSource::File(local));
        assert_eq!(boot.asset_dir, Some(PathBuf::from("cli-assets")));

        // Nothing at all
        let missing = dir.path().join("none.toml");
        let boot = BootConfig::resolve(&Args::default(), None, None, &missing).unwrap();
        assert_eq!(boot.source, ConfigSource::Defaults);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let args = Args {
            config: Some(PathBuf::from("/definitely/not/here.toml")),
            ..Args::default()
        };
        assert!(matches!(
            BootConfig::resolve(&args, None, None, Path::new("unused.toml")),
            Err(BootError::Config { .. })
        ));
    }
}
