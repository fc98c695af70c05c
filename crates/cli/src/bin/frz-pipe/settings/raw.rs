use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use frz_pipeline_builtins::curators::GrepTool;
use frz_pipeline_builtins::matchers::CaseMode;
use frz_pipeline_builtins::sources::FileOptions;
use regex::Regex;
use serde::Deserialize;

use super::resolved::{ProducerConfig, ResolvedConfig};
use crate::cli::{CliArgs, MatcherKind, OutputFormat, SorterKind};

/// Mirror of the configuration file representation before CLI overrides and
/// validation are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawConfig {
	source: SourceSection,
	grep: GrepSection,
	matcher: MatcherSection,
	sorter: SorterSection,
	render: RenderSection,
	output: OutputSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SourceSection {
	root: Option<PathBuf>,
	hidden: Option<bool>,
	follow_symlinks: Option<bool>,
	respect_ignore_files: Option<bool>,
	max_depth: Option<usize>,
	includes: Option<Vec<String>>,
	excludes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GrepSection {
	enabled: Option<bool>,
	tool: Option<GrepTool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct MatcherSection {
	kind: Option<MatcherKind>,
	case: Option<CaseMode>,
	sort: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SorterSection {
	kind: Option<SorterKind>,
	reverse: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RenderSection {
	smart_path: Option<bool>,
	relative: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct OutputSection {
	format: Option<OutputFormat>,
	limit: Option<usize>,
	preview: Option<bool>,
}

impl RawConfig {
	/// Apply CLI overrides on top of the raw configuration values.
	pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
		if let Some(root) = cli.root.clone() {
			self.source.root = Some(root);
		}
		if let Some(value) = cli.hidden {
			self.source.hidden = Some(value);
		}
		if let Some(value) = cli.follow_symlinks {
			self.source.follow_symlinks = Some(value);
		}
		if let Some(value) = cli.respect_ignore_files {
			self.source.respect_ignore_files = Some(value);
		}
		if let Some(value) = cli.max_depth {
			self.source.max_depth = Some(value);
		}
		if let Some(value) = &cli.includes {
			self.source.includes = Some(value.clone());
		}
		if let Some(value) = &cli.excludes {
			self.source.excludes = Some(value.clone());
		}

		if cli.grep {
			self.grep.enabled = Some(true);
		}
		if let Some(tool) = cli.grep_tool {
			self.grep.tool = Some(tool.into());
		}

		if let Some(kind) = cli.matcher {
			self.matcher.kind = Some(kind);
		}
		if let Some(case) = cli.case {
			self.matcher.case = Some(case.into());
		}

		if let Some(kind) = cli.sorter {
			self.sorter.kind = Some(kind);
		}
		if cli.reverse {
			self.sorter.reverse = Some(true);
		}

		if cli.smart_path {
			self.render.smart_path = Some(true);
		}
		if cli.absolute {
			self.render.relative = Some(false);
		}

		if let Some(format) = cli.format {
			self.output.format = Some(format);
		}
		if let Some(limit) = cli.limit {
			self.output.limit = Some(limit);
		}
		if cli.preview {
			self.output.preview = Some(true);
		}
	}

	/// Validate the merged values and fill in defaults.
	pub(super) fn resolve(self, cli: &CliArgs) -> Result<ResolvedConfig> {
		let mut root = match self.source.root {
			Some(path) => path,
			None => env::current_dir().context("failed to determine working directory")?,
		};
		if root.is_relative() {
			root = env::current_dir()
				.context("failed to resolve current directory for root")?
				.join(root);
		}
		root = fs::canonicalize(&root).with_context(|| format!("failed to canonicalize root {}", root.display()))?;
		let metadata = fs::metadata(&root).with_context(|| format!("failed to inspect root {}", root.display()))?;
		ensure!(metadata.is_dir(), "root must be a directory: {}", root.display());

		ensure!(self.source.max_depth != Some(0), "source.max_depth must be at least 1");
		ensure!(self.output.limit != Some(0), "output.limit must be at least 1");

		let producer = if self.grep.enabled.unwrap_or(false) {
			ProducerConfig::Grep(self.grep.tool.unwrap_or_default())
		} else {
			let defaults = FileOptions::default();
			ProducerConfig::Files(FileOptions {
				includes: compile_patterns("source.includes", self.source.includes)?,
				excludes: compile_patterns("source.excludes", self.source.excludes)?,
				hidden: self.source.hidden.unwrap_or(defaults.hidden),
				follow_symlinks: self.source.follow_symlinks.unwrap_or(defaults.follow_symlinks),
				respect_ignore_files: self
					.source
					.respect_ignore_files
					.unwrap_or(defaults.respect_ignore_files),
				max_depth: self.source.max_depth,
			})
		};

		Ok(ResolvedConfig {
			root,
			query: cli.query.clone().unwrap_or_default(),
			producer,
			matcher: self.matcher.kind.unwrap_or_default(),
			case: self.matcher.case.unwrap_or_default(),
			fzf_sort: self.matcher.sort.unwrap_or(true),
			sorter: self.sorter.kind.unwrap_or_default(),
			reverse: self.sorter.reverse.unwrap_or(false),
			smart_path: self.render.smart_path.unwrap_or(false),
			relative: self.render.relative.unwrap_or(true),
			format: self.output.format.unwrap_or_default(),
			limit: self.output.limit,
			preview: self.output.preview.unwrap_or(false),
			action: cli.action.clone(),
		})
	}
}

/// Compile the non-blank patterns of `key`.
fn compile_patterns(key: &str, patterns: Option<Vec<String>>) -> Result<Vec<Regex>> {
	patterns
		.unwrap_or_default()
		.iter()
		.map(|pattern| pattern.trim())
		.filter(|pattern| !pattern.is_empty())
		.map(|pattern| Regex::new(pattern).with_context(|| format!("invalid pattern in {key}: {pattern}")))
		.collect()
}

#[cfg(test)]
mod tests {
	use clap::Parser;
	use config::{Config, File, FileFormat};
	use tempfile::tempdir;

	use super::*;

	fn raw(toml: &str) -> RawConfig {
		Config::builder()
			.add_source(File::from_str(toml, FileFormat::Toml))
			.build()
			.unwrap()
			.try_deserialize()
			.unwrap()
	}

	fn cli(args: &[&str]) -> CliArgs {
		CliArgs::parse_from(std::iter::once("frz-pipe").chain(args.iter().copied()))
	}

	#[test]
	fn defaults_list_files_with_fzf() {
		let dir = tempdir().unwrap();
		let args = cli(&[dir.path().to_str().unwrap()]);
		let mut config = RawConfig::default();
		config.apply_cli_overrides(&args);
		let resolved = config.resolve(&args).unwrap();

		assert_eq!(resolved.root, fs::canonicalize(dir.path()).unwrap());
		assert_eq!(resolved.matcher, MatcherKind::Fzf);
		assert_eq!(resolved.case, CaseMode::Smart);
		assert_eq!(resolved.sorter, SorterKind::Unsorted);
		assert!(resolved.relative);
		assert!(resolved.query.is_empty());
		let ProducerConfig::Files(options) = resolved.producer else {
			panic!("expected the file source");
		};
		assert!(options.hidden);
		assert!(options.includes.is_empty());
	}

	#[test]
	fn flags_override_file_values() {
		let dir = tempdir().unwrap();
		let mut config = raw(
			"[grep]\nenabled = false\ntool = \"rg\"\n\n[sorter]\nkind = \"lexical\"\n\n[render]\nsmart_path = false\n",
		);
		let args = cli(&[dir.path().to_str().unwrap(), "--grep", "--smart-path", "--reverse"]);
		config.apply_cli_overrides(&args);
		let resolved = config.resolve(&args).unwrap();

		assert!(matches!(resolved.producer, ProducerConfig::Grep(GrepTool::Ripgrep)));
		assert_eq!(resolved.sorter, SorterKind::Lexical);
		assert!(resolved.reverse);
		assert!(resolved.smart_path);
	}

	#[test]
	fn source_section_configures_the_walker() {
		let dir = tempdir().unwrap();
		let mut config = raw(
			"[source]\nhidden = false\nmax_depth = 2\nincludes = [\"\\\\.rs$\", \" \"]\nexcludes = [\"target\"]\n",
		);
		let args = cli(&[dir.path().to_str().unwrap(), "--respect-ignore-files", "yes"]);
		config.apply_cli_overrides(&args);
		let ProducerConfig::Files(options) = config.resolve(&args).unwrap().producer else {
			panic!("expected the file source");
		};
		assert!(!options.hidden);
		assert!(options.respect_ignore_files);
		assert_eq!(options.max_depth, Some(2));
		assert_eq!(options.includes.len(), 1);
		assert!(options.includes[0].is_match("main.rs"));
		assert_eq!(options.excludes.len(), 1);
	}

	#[test]
	fn invalid_values_are_rejected() {
		let dir = tempdir().unwrap();
		let root = dir.path().to_str().unwrap();

		let args = cli(&[root, "--include", "("]);
		let mut config = RawConfig::default();
		config.apply_cli_overrides(&args);
		let err = config.resolve(&args).unwrap_err();
		assert!(err.to_string().contains("source.includes"));

		let args = cli(&[root, "--max-depth", "0"]);
		let mut config = RawConfig::default();
		config.apply_cli_overrides(&args);
		assert!(config.resolve(&args).is_err());

		let file = dir.path().join("file.txt");
		fs::write(&file, "x").unwrap();
		let args = cli(&[file.to_str().unwrap()]);
		let mut config = RawConfig::default();
		config.apply_cli_overrides(&args);
		let err = config.resolve(&args).unwrap_err();
		assert!(err.to_string().contains("must be a directory"));
	}
}
