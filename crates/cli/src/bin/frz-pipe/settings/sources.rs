use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use config::{Config, ConfigError, Environment, File};

use crate::app_dirs;
use crate::cli::CliArgs;

const ENV_PREFIX: &str = "FRZ_PIPE";

/// Build a [`Config`] from the default locations, `--config` files and
/// `FRZ_PIPE__SECTION__KEY` environment variables, in increasing priority.
pub(super) fn build_config(cli: &CliArgs) -> Result<Config> {
	let mut builder = Config::builder();

	if !cli.no_config {
		for path in default_config_files() {
			builder = builder.add_source(File::from(path).required(false));
		}
	}

	for path in &cli.config {
		builder = builder.add_source(File::from(path.clone()).required(true));
	}

	builder = builder.add_source(
		Environment::with_prefix(ENV_PREFIX)
			.separator("__")
			.try_parsing(true)
			.list_separator(",")
			.with_list_parse_key("source.includes")
			.with_list_parse_key("source.excludes"),
	);

	builder.build().map_err(|err| match err {
		ConfigError::Frozen => anyhow!("configuration builder is frozen"),
		other => other.into(),
	})
}

/// Default configuration file locations, lowest priority first.
pub(super) fn default_config_files() -> Vec<PathBuf> {
	let mut files = Vec::new();

	if let Ok(file) = app_dirs::user_config_file() {
		files.push(file);
	}

	if let Ok(current_dir) = env::current_dir() {
		files.push(current_dir.join(".frz-pipe.toml"));
		files.push(current_dir.join("frz-pipe.toml"));
	}

	files
}

#[cfg(test)]
mod tests {
	use std::fs;

	use clap::Parser;
	use tempfile::tempdir;

	use super::*;

	#[test]
	fn default_files_include_current_directory_variants() {
		let files = default_config_files();
		assert!(files.iter().any(|path| path.ends_with(".frz-pipe.toml")));
		assert!(files.iter().any(|path| path.ends_with("frz-pipe.toml")));
	}

	#[test]
	fn later_files_take_precedence() {
		let dir = tempdir().unwrap();
		let first = dir.path().join("first.toml");
		let second = dir.path().join("second.toml");
		fs::write(&first, "[grep]\ntool = \"rg\"\n[source]\nhidden = false\n").unwrap();
		fs::write(&second, "[grep]\ntool = \"git-grep\"\n").unwrap();

		let cli = CliArgs::parse_from([
			"frz-pipe",
			"-n",
			"-c",
			first.to_str().unwrap(),
			"-c",
			second.to_str().unwrap(),
		]);
		let config = build_config(&cli).unwrap();
		assert_eq!(config.get_string("grep.tool").unwrap(), "git-grep");
		assert!(!config.get_bool("source.hidden").unwrap());
	}

	#[test]
	fn explicit_files_must_exist() {
		let dir = tempdir().unwrap();
		let missing = dir.path().join("missing.toml");
		let cli = CliArgs::parse_from(["frz-pipe", "-n", "-c", missing.to_str().unwrap()]);
		assert!(build_config(&cli).is_err());
	}
}
