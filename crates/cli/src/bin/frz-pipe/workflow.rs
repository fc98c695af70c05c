use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use frz_pipeline::{
	ActionOutcome, CancellationToken, Context, Detail, DisplayItem, InvokeParams, Item, PickerParams, PreviewItem,
	Shape, SharedCurator, SharedRefiner, SharedSource, refine_curator, refine_source,
};
use frz_pipeline_builtins::actions::{UNNAMED_REGISTER, default_cd_actions, default_open_actions, echo, yank};
use frz_pipeline_builtins::curators::grep;
use frz_pipeline_builtins::location::{LINE, PATH, SIZE};
use frz_pipeline_builtins::matchers::{FzfOptions, fzf, regexp, substring};
use frz_pipeline_builtins::renderers::{SmartGrepOptions, smart_grep, smart_path};
use frz_pipeline_builtins::sorters::{lexical, numerical_by};
use frz_pipeline_builtins::sources::file;
use frz_pipeline_builtins::{HostEvent, LocalHost, previewers, refiners};

use crate::cli::{MatcherKind, SorterKind};
use crate::settings::{ProducerConfig, ResolvedConfig};

const DEFAULT_ACTION: &str = "open";

/// Result of one evaluation.
#[derive(Debug)]
pub(crate) struct PipelineOutcome {
	pub(crate) query: String,
	/// Number of items before the limit was applied.
	pub(crate) total: usize,
	pub(crate) items: Vec<DisplayItem>,
	pub(crate) preview: Option<PreviewItem>,
	pub(crate) action: Option<ActionReport>,
}

/// What an invoked action asked the host to do.
#[derive(Debug)]
pub(crate) struct ActionReport {
	pub(crate) name: String,
	pub(crate) outcome: ActionOutcome,
	pub(crate) events: Vec<HostEvent>,
}

/// Assembles a picker from the resolved configuration and evaluates it once.
pub(crate) struct PipelineWorkflow {
	params: PickerParams,
	root: PathBuf,
	query: String,
	limit: Option<usize>,
	preview: bool,
	action: Option<String>,
}

impl PipelineWorkflow {
	pub(crate) fn from_config(config: ResolvedConfig) -> Result<Self> {
		let params = build_params(&config)?;
		Ok(Self {
			params,
			root: config.root,
			query: config.query,
			limit: config.limit,
			preview: config.preview,
			action: config.action,
		})
	}

	pub(crate) async fn run(self, token: &CancellationToken) -> Result<PipelineOutcome> {
		let host = Arc::new(LocalHost::new().with_cwd(&self.root));
		let ctx = Context::from_shared(host.clone());
		let args = vec![self.root.to_string_lossy().into_owned()];

		let mut items = self
			.params
			.evaluate(&ctx, args, &self.query, token)
			.await
			.with_context(|| format!("failed to evaluate the {} picker", self.params.name))?;
		let total = items.len();
		tracing::debug!(picker = %self.params.name, total, "evaluated picker");

		let preview = match items.first() {
			Some(first) if self.preview => self
				.params
				.preview(&ctx, first.item(), token)
				.await
				.context("failed to preview the first item")?,
			_ => None,
		};

		let action = match &self.action {
			Some(name) => {
				let filtered: Vec<Item> = items.iter().map(|item| item.item().clone()).collect();
				let params = InvokeParams::new(filtered.first().cloned(), Vec::new(), filtered);
				let outcome = self
					.params
					.invoke(&ctx, Some(name.as_str()), &params, token)
					.await
					.with_context(|| format!("action {name} failed"))?;
				Some(ActionReport {
					name: name.clone(),
					outcome,
					events: host.events(),
				})
			}
			None => None,
		};

		if let Some(limit) = self.limit {
			items.truncate(limit);
		}

		Ok(PipelineOutcome {
			query: self.query,
			total,
			items,
			preview,
			action,
		})
	}
}

/// Translate the resolved configuration into picker parameters.
fn build_params(config: &ResolvedConfig) -> Result<PickerParams> {
	let path_refiners: Vec<SharedRefiner> = if config.relative {
		vec![refiners::relative_path()]
	} else {
		Vec::new()
	};

	let mut params = match &config.producer {
		ProducerConfig::Files(options) => {
			let source = refine_source(file(options.clone()), &Shape::of([PATH]), path_refiners)
				.context("invalid file pipeline")?;
			let matcher = match config.matcher {
				MatcherKind::Fzf => fzf::<Detail>(FzfOptions {
					case: config.case,
					sort: config.fzf_sort,
					extended: true,
				}),
				MatcherKind::Substring => substring::<Detail>(config.case),
				MatcherKind::Regexp => regexp::<Detail>(),
			};
			let params = PickerParams::from_source("files", Arc::new(source) as SharedSource).with_matcher(matcher);
			if config.smart_path {
				params.with_renderer(smart_path::<Detail>())
			} else {
				params
			}
		}
		ProducerConfig::Grep(tool) => {
			let curator = refine_curator(grep(*tool), &Shape::of([PATH, LINE]), path_refiners)
				.context("invalid grep pipeline")?;
			PickerParams::from_curator("grep", Arc::new(curator) as SharedCurator)
				.with_renderer(smart_grep(SmartGrepOptions::default()))
		}
	};

	let numeric_field = match config.producer {
		ProducerConfig::Files(_) => SIZE,
		ProducerConfig::Grep(_) => LINE,
	};
	params = match config.sorter {
		SorterKind::Unsorted => params,
		SorterKind::Lexical => params.with_sorter(lexical::<Detail>(config.reverse)),
		SorterKind::Numerical => params.with_sorter(numerical_by(config.reverse, move |item: &Item| {
			item.detail.get_u64(numeric_field).map(|n| n as f64)
		})),
	};

	params = params.with_previewer(previewers::file());
	for (name, action) in default_open_actions().into_iter().chain(default_cd_actions()) {
		params = params.with_action(name, action);
	}
	Ok(params
		.with_action("echo", echo::<Detail>())
		.with_action("yank", yank::<Detail>(UNNAMED_REGISTER))
		.with_default_action(DEFAULT_ACTION))
}
