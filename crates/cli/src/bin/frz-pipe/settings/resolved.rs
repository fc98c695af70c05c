use std::path::PathBuf;

use frz_pipeline_builtins::curators::GrepTool;
use frz_pipeline_builtins::matchers::CaseMode;
use frz_pipeline_builtins::sources::FileOptions;

use crate::cli::{MatcherKind, OutputFormat, SorterKind};

/// Where the pipeline's items come from.
#[derive(Debug, Clone)]
pub(crate) enum ProducerConfig {
	/// Walk the root and match file paths against the query.
	Files(FileOptions),
	/// Hand the query to a grep program run under the root.
	Grep(GrepTool),
}

/// Application-ready configuration derived from user input, config files and
/// defaults.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
	pub(crate) root: PathBuf,
	pub(crate) query: String,
	pub(crate) producer: ProducerConfig,
	pub(crate) matcher: MatcherKind,
	pub(crate) case: CaseMode,
	pub(crate) fzf_sort: bool,
	pub(crate) sorter: SorterKind,
	pub(crate) reverse: bool,
	pub(crate) smart_path: bool,
	pub(crate) relative: bool,
	pub(crate) format: OutputFormat,
	pub(crate) limit: Option<usize>,
	pub(crate) preview: bool,
	pub(crate) action: Option<String>,
}

impl ResolvedConfig {
	/// Print a human readable summary of the effective configuration to stderr.
	pub(crate) fn print_summary(&self) {
		eprintln!("Effective configuration:");
		eprintln!("  Root: {}", self.root.display());
		match &self.producer {
			ProducerConfig::Files(options) => {
				eprintln!("  Producer: files");
				eprintln!("  Include hidden: {}", bool_to_word(options.hidden));
				eprintln!("  Follow symlinks: {}", bool_to_word(options.follow_symlinks));
				eprintln!("  Respect ignore files: {}", bool_to_word(options.respect_ignore_files));
				match options.max_depth {
					Some(depth) => eprintln!("  Max depth: {depth}"),
					None => eprintln!("  Max depth: unlimited"),
				}
				if !options.includes.is_empty() {
					eprintln!("  Includes: {}", join_patterns(&options.includes));
				}
				if !options.excludes.is_empty() {
					eprintln!("  Excludes: {}", join_patterns(&options.excludes));
				}
				eprintln!("  Matcher: {:?} ({:?} case)", self.matcher, self.case);
			}
			ProducerConfig::Grep(tool) => eprintln!("  Producer: grep ({tool:?})"),
		}
		eprintln!("  Sorter: {:?}{}", self.sorter, if self.reverse { " (reversed)" } else { "" });
		eprintln!("  Smart path: {}", bool_to_word(self.smart_path));
		eprintln!("  Relative paths: {}", bool_to_word(self.relative));
		match self.limit {
			Some(limit) => eprintln!("  Limit: {limit}"),
			None => eprintln!("  Limit: none"),
		}
		if !self.query.is_empty() {
			eprintln!("  Query: {}", self.query);
		}
		if let Some(action) = &self.action {
			eprintln!("  Action: {action}");
		}
	}
}

fn join_patterns(patterns: &[regex::Regex]) -> String {
	patterns.iter().map(regex::Regex::as_str).collect::<Vec<_>>().join(", ")
}

fn bool_to_word(value: bool) -> &'static str {
	if value { "yes" } else { "no" }
}
