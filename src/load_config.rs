/// `load_config` module: reads the optional YAML run configuration and applies environment overrides.
///
/// Every key is optional; missing keys fall back to [`Config::default`], which
/// describes the fixed pipeline. Environment variables are applied last:
/// - `SERIFIAN_TEMPLATES_ROOT` replaces `templates_root`
/// - `SERIFIAN_TOOL_TIMEOUT_SECS` replaces `tools.timeout_secs`
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Config;

pub const TEMPLATES_ROOT_ENV: &str = "SERIFIAN_TEMPLATES_ROOT";
pub const TOOL_TIMEOUT_ENV: &str = "SERIFIAN_TOOL_TIMEOUT_SECS";

/// Loads the config file at `path` and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // serde_yaml rejects an empty document, which should mean "all defaults".
    let config: Config = if config_content.trim().is_empty() {
        Config::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    apply_env_overrides(config)
}

/// Resolves the run configuration: the file at `path` if given, defaults otherwise.
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => {
            info!("No config file given, using the default pipeline");
            apply_env_overrides(Config::default())?
        }
    };
    config.trace_loaded();
    Ok(config)
}

fn apply_env_overrides(mut config: Config) -> Result<Config> {
    if let Ok(root) = std::env::var(TEMPLATES_ROOT_ENV) {
        info!(templates_root = %root, "{TEMPLATES_ROOT_ENV} found in env");
        config.templates_root = PathBuf::from(root);
    }

    if let Ok(var) = std::env::var(TOOL_TIMEOUT_ENV) {
        match var.parse::<u64>() {
            Ok(secs) => {
                info!(timeout_secs = secs, "{TOOL_TIMEOUT_ENV} found in env");
                config.tools.timeout_secs = Some(secs);
            }
            Err(e) => {
                error!(error = ?e, var = ?var, "{TOOL_TIMEOUT_ENV} must be a valid integer");
                anyhow::bail!("{TOOL_TIMEOUT_ENV} must be a valid integer: {e}");
            }
        }
    }

    Ok(config)
}
