use std::fmt::Write;
use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use frz_pipeline_builtins::curators::GrepTool;
use frz_pipeline_builtins::matchers::CaseMode;
use serde::Deserialize;

use crate::app_dirs;

/// Version banner including the configuration directory.
fn long_version() -> &'static str {
	let config_dir = match app_dirs::config_dir() {
		Ok(path) => path.display().to_string(),
		Err(err) => format!("unavailable ({err})"),
	};

	let mut details = format!("frz-pipe {}", env!("CARGO_PKG_VERSION"));
	let _ = writeln!(details);
	let _ = writeln!(details, "config directory: {config_dir}");

	Box::leak(details.into_boxed_str())
}

/// Command-line arguments accepted by the `frz-pipe` binary.
#[derive(Parser, Debug)]
#[command(
	name = "frz-pipe",
	version,
	long_version = long_version(),
	about = "Run one fuzzy-finder pipeline evaluation over files or grep hits"
)]
pub(crate) struct CliArgs {
	#[arg(value_name = "ROOT", help = "Directory to search (default: current directory)")]
	pub(crate) root: Option<PathBuf>,
	#[arg(short, long, value_name = "QUERY", help = "Query to evaluate (default: empty)")]
	pub(crate) query: Option<String>,
	#[arg(
		short,
		long,
		help = "Search file contents with a grep program instead of listing files (default: disabled)"
	)]
	pub(crate) grep: bool,
	#[arg(long = "grep-tool", value_enum, help = "Program used with --grep (default: grep)")]
	pub(crate) grep_tool: Option<ToolArg>,
	#[arg(short, long, value_enum, help = "Matcher applied to listed files (default: fzf)")]
	pub(crate) matcher: Option<MatcherKind>,
	#[arg(long, value_enum, help = "Case sensitivity of the matcher (default: smart)")]
	pub(crate) case: Option<CaseArg>,
	#[arg(short, long, value_enum, help = "Order applied after matching (default: none)")]
	pub(crate) sorter: Option<SorterKind>,
	#[arg(short, long, help = "Reverse the sort order (default: disabled)")]
	pub(crate) reverse: bool,
	#[arg(long = "smart-path", help = "Show file names ahead of their directory (default: disabled)")]
	pub(crate) smart_path: bool,
	#[arg(long, help = "Show absolute paths instead of paths relative to ROOT (default: disabled)")]
	pub(crate) absolute: bool,
	#[arg(
		short = 'H',
		long = "hidden",
		value_parser = BoolishValueParser::new(),
		help = "Include hidden files (default: enabled)"
	)]
	pub(crate) hidden: Option<bool>,
	#[arg(
		long = "follow-symlinks",
		value_parser = BoolishValueParser::new(),
		help = "Follow symbolic links while walking (default: enabled)"
	)]
	pub(crate) follow_symlinks: Option<bool>,
	#[arg(
		long = "respect-ignore-files",
		value_parser = BoolishValueParser::new(),
		help = "Respect .gitignore and .ignore files (default: disabled)"
	)]
	pub(crate) respect_ignore_files: Option<bool>,
	#[arg(short = 'd', long = "max-depth", value_name = "NUM", help = "Limit walk depth (default: unlimited)")]
	pub(crate) max_depth: Option<usize>,
	#[arg(
		long = "include",
		value_delimiter = ',',
		value_name = "REGEX",
		help = "Comma-separated patterns a listed path must match (default: all)"
	)]
	pub(crate) includes: Option<Vec<String>>,
	#[arg(
		long = "exclude",
		value_delimiter = ',',
		value_name = "REGEX",
		help = "Comma-separated patterns dropping listed paths (default: none)"
	)]
	pub(crate) excludes: Option<Vec<String>>,
	#[arg(short, long, value_name = "NUM", help = "Print at most NUM items (default: all)")]
	pub(crate) limit: Option<usize>,
	#[arg(short, long, value_enum, help = "Choose how to print the result (default: plain)")]
	pub(crate) format: Option<OutputFormat>,
	#[arg(short, long, help = "Preview the first item (default: disabled)")]
	pub(crate) preview: bool,
	#[arg(
		short,
		long,
		value_name = "NAME",
		help = "Invoke the named action on the first item and report what it did (default: none)"
	)]
	pub(crate) action: Option<String>,
	#[arg(
		short,
		long = "config",
		value_name = "FILE",
		env = "FRZ_PIPE_CONFIG",
		action = ArgAction::Append,
		help = "Additional configuration file to merge (default: none)"
	)]
	pub(crate) config: Vec<PathBuf>,
	#[arg(
		short = 'n',
		long = "no-config",
		help = "Skip loading default configuration files (default: disabled)"
	)]
	pub(crate) no_config: bool,
	#[arg(
		long = "print-config",
		help = "Print the resolved configuration to stderr before running (default: disabled)"
	)]
	pub(crate) print_config: bool,
}

/// Matchers selectable from the command line and `[matcher] kind`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum MatcherKind {
	#[default]
	Fzf,
	Substring,
	Regexp,
}

/// Sorters selectable from the command line and `[sorter] kind`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum SorterKind {
	#[default]
	#[value(name = "none")]
	#[serde(rename = "none")]
	Unsorted,
	Lexical,
	Numerical,
}

/// Output formats supported by the CLI utility.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum OutputFormat {
	#[default]
	Plain,
	Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ToolArg {
	Grep,
	Rg,
	GitGrep,
}

impl From<ToolArg> for GrepTool {
	fn from(value: ToolArg) -> Self {
		match value {
			ToolArg::Grep => GrepTool::Grep,
			ToolArg::Rg => GrepTool::Ripgrep,
			ToolArg::GitGrep => GrepTool::GitGrep,
		}
	}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum CaseArg {
	Smart,
	Ignore,
	Respect,
}

impl From<CaseArg> for CaseMode {
	fn from(value: CaseArg) -> Self {
		match value {
			CaseArg::Smart => CaseMode::Smart,
			CaseArg::Ignore => CaseMode::Ignore,
			CaseArg::Respect => CaseMode::Respect,
		}
	}
}
