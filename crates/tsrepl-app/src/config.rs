//! Loading the session config from disk and applying command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tsrepl_session::SessionConfig;

use crate::Cli;

/// Default location: `<config dir>/tsrepl/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tsrepl").join("config.toml"))
}

/// Read a config file. A missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<SessionConfig> {
    if !path.exists() {
        return Ok(SessionConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: SessionConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Resolve the config for this run: the `--config` file (which must exist)
/// or the default file, then the individual flags on top.
pub fn resolve(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            load_from(path)?
        }
        None => match default_config_path() {
            Some(path) => load_from(&path)?,
            None => SessionConfig::default(),
        },
    };

    if let Some(program) = &cli.program {
        config.program = program.clone();
    }
    if !cli.args.is_empty() {
        config.args = cli.args.clone();
    }
    if cli.no_ansi {
        config.ansi_color = false;
    }
    if let Some(name) = &cli.buffer_name {
        config.buffer_name = name.clone();
    }

    Ok(config)
}
