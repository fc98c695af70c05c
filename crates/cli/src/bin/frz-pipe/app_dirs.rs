//! Location of the per-user `frz-pipe` configuration.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use directories::ProjectDirs;

const CONFIG_DIR_ENV: &str = "FRZ_PIPE_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// `FRZ_PIPE_CONFIG_DIR` when set and non-empty, otherwise the platform's
/// local config directory for the application.
pub(crate) fn config_dir() -> Result<PathBuf> {
	pick_config_dir(env::var_os(CONFIG_DIR_ENV), || {
		ProjectDirs::from("io", "albo", "frz-pipe")
			.map(|dirs| dirs.config_local_dir().to_path_buf())
			.ok_or_else(|| anyhow!("no home directory to place frz-pipe configuration in"))
	})
}

/// The `config.toml` inside [`config_dir`].
pub(crate) fn user_config_file() -> Result<PathBuf> {
	Ok(config_dir()?.join(CONFIG_FILE))
}

fn pick_config_dir(overridden: Option<OsString>, platform: impl FnOnce() -> Result<PathBuf>) -> Result<PathBuf> {
	match overridden {
		Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
		_ => platform(),
	}
}
