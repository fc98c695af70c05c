//! Picker parameters and a single pipeline evaluation.
//!
//! The interactive loop (debounce, cancel-and-restart, layout) belongs to
//! the embedding orchestrator. [`PickerParams`] bundles the stages one picker
//! is built from and runs one evaluation of them for a given query.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::derivable::Derivable;
use crate::detail::Detail;
use crate::error::{Error, Result};
use crate::item::{DisplayItem, Item, Payload, PreviewItem};
use crate::stages::action::{ActionOutcome, InvokeParams, SharedAction};
use crate::stages::curator::{CurateParams, SharedCurator};
use crate::stages::matcher::{Matcher, MatchParams, SharedMatcher, compose_matchers};
use crate::stages::previewer::{Previewer, SharedPreviewer, compose_previewers};
use crate::stages::renderer::{Renderer, SharedRenderer, compose_renderers};
use crate::stages::sorter::{SharedSorter, Sorter, compose_sorters};
use crate::stages::source::{CollectParams, SharedSource};
use crate::stream::{collect_items, ensure_active, guarded};

/// Leaf of a picker pipeline.
pub enum Producer<D = Detail> {
	/// Items are produced once per evaluation and narrowed by matchers.
	Source(SharedSource<D>),
	/// Items are produced already filtered for the query; matchers are skipped.
	Curator(SharedCurator<D>),
}

impl<D> Clone for Producer<D> {
	fn clone(&self) -> Self {
		match self {
			Self::Source(source) => Self::Source(Arc::clone(source)),
			Self::Curator(curator) => Self::Curator(Arc::clone(curator)),
		}
	}
}

/// Stages a picker is assembled from.
pub struct PickerParams<D = Detail> {
	pub name: String,
	pub producer: Producer<D>,
	pub matchers: Vec<SharedMatcher<D>>,
	pub sorters: Vec<SharedSorter<D>>,
	pub renderers: Vec<SharedRenderer<D>>,
	pub previewers: Vec<SharedPreviewer<D>>,
	pub actions: IndexMap<String, SharedAction<D>>,
	pub default_action: Option<String>,
}

impl<D> Clone for PickerParams<D> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			producer: self.producer.clone(),
			matchers: self.matchers.clone(),
			sorters: self.sorters.clone(),
			renderers: self.renderers.clone(),
			previewers: self.previewers.clone(),
			actions: self.actions.clone(),
			default_action: self.default_action.clone(),
		}
	}
}

impl<D: Payload> PickerParams<D> {
	pub fn new(name: impl Into<String>, producer: Producer<D>) -> Self {
		Self {
			name: name.into(),
			producer,
			matchers: Vec::new(),
			sorters: Vec::new(),
			renderers: Vec::new(),
			previewers: Vec::new(),
			actions: IndexMap::new(),
			default_action: None,
		}
	}

	pub fn from_source(name: impl Into<String>, source: impl Into<Derivable<SharedSource<D>>>) -> Self {
		Self::new(name, Producer::Source(source.into().resolve()))
	}

	pub fn from_curator(name: impl Into<String>, curator: impl Into<Derivable<SharedCurator<D>>>) -> Self {
		Self::new(name, Producer::Curator(curator.into().resolve()))
	}

	#[must_use]
	pub fn with_matcher(mut self, matcher: impl Into<Derivable<SharedMatcher<D>>>) -> Self {
		self.matchers.push(matcher.into().resolve());
		self
	}

	#[must_use]
	pub fn with_sorter(mut self, sorter: impl Into<Derivable<SharedSorter<D>>>) -> Self {
		self.sorters.push(sorter.into().resolve());
		self
	}

	#[must_use]
	pub fn with_renderer(mut self, renderer: impl Into<Derivable<SharedRenderer<D>>>) -> Self {
		self.renderers.push(renderer.into().resolve());
		self
	}

	#[must_use]
	pub fn with_previewer(mut self, previewer: impl Into<Derivable<SharedPreviewer<D>>>) -> Self {
		self.previewers.push(previewer.into().resolve());
		self
	}

	/// Register a named action. The first registered action becomes the
	/// default unless one is set explicitly.
	#[must_use]
	pub fn with_action(mut self, name: impl Into<String>, action: impl Into<Derivable<SharedAction<D>>>) -> Self {
		self.actions.insert(name.into(), action.into().resolve());
		self
	}

	#[must_use]
	pub fn with_default_action(mut self, name: impl Into<String>) -> Self {
		self.default_action = Some(name.into());
		self
	}

	/// Name of the action invoked when none is requested.
	#[must_use]
	pub fn default_action_name(&self) -> Option<&str> {
		self.default_action
			.as_deref()
			.or_else(|| self.actions.keys().next().map(String::as_str))
	}

	/// Run one evaluation: produce, match, sort and render.
	///
	/// Returns [`Error::Cancelled`] when the token fires before the list is
	/// complete; a partial list is never returned.
	pub async fn evaluate(
		&self,
		ctx: &Context,
		args: Vec<String>,
		query: &str,
		token: &CancellationToken,
	) -> Result<Vec<DisplayItem<D>>> {
		ensure_active(token)?;
		let mut items = match &self.producer {
			Producer::Source(source) => {
				let produced = guarded(source.collect(ctx, CollectParams { args }, token), token);
				let collected = collect_items(produced).await?;
				ensure_active(token)?;
				let count = collected.len();
				let matcher = compose_matchers(self.matchers.clone());
				let matched = collect_items(matcher.match_items(ctx, MatchParams::new(collected, query), token)).await?;
				tracing::debug!(picker = %self.name, collected = count, matched = matched.len(), "matched items");
				matched
			}
			Producer::Curator(curator) => {
				let params = CurateParams {
					args,
					query: query.to_string(),
				};
				collect_items(guarded(curator.curate(ctx, params, token), token)).await?
			}
		};
		ensure_active(token)?;

		compose_sorters(self.sorters.clone())
			.sort(ctx, &mut items, token)
			.await?;

		let mut display: Vec<DisplayItem<D>> = items.into_iter().map(DisplayItem::from).collect();
		compose_renderers(self.renderers.clone())
			.render(ctx, &mut display, token)
			.await?;
		Ok(display)
	}

	/// Preview `item` through the picker's previewers.
	pub async fn preview(&self, ctx: &Context, item: &Item<D>, token: &CancellationToken) -> Result<Option<PreviewItem>> {
		compose_previewers(self.previewers.clone())
			.preview(ctx, item, token)
			.await
	}

	/// Invoke the named action, or the default one when `name` is `None`.
	pub async fn invoke(
		&self,
		ctx: &Context,
		name: Option<&str>,
		params: &InvokeParams<D>,
		token: &CancellationToken,
	) -> Result<ActionOutcome> {
		let name = name
			.or_else(|| self.default_action_name())
			.ok_or_else(|| Error::UnknownAction("default".to_string()))?;
		let action = self
			.actions
			.get(name)
			.ok_or_else(|| Error::UnknownAction(name.to_string()))?;
		tracing::debug!(picker = %self.name, action = name, "invoking action");
		action.invoke(ctx, params, token).await
	}
}

/// Starts nested picker sessions on behalf of actions.
#[async_trait]
pub trait PickerLauncher<D = Detail>: Send + Sync {
	/// Run a picker to completion. Returns whether the user picked something.
	async fn launch(&self, ctx: &Context, params: PickerParams<D>, token: &CancellationToken) -> Result<bool>;
}

/// The enclosing picker, handed to actions that start nested sessions.
pub struct SubmatchContext<D = Detail> {
	pub params: Arc<PickerParams<D>>,
	pub launcher: Arc<dyn PickerLauncher<D>>,
}

impl<D> SubmatchContext<D> {
	pub fn new(params: Arc<PickerParams<D>>, launcher: Arc<dyn PickerLauncher<D>>) -> Self {
		Self { params, launcher }
	}
}

impl<D> Clone for SubmatchContext<D> {
	fn clone(&self) -> Self {
		Self {
			params: Arc::clone(&self.params),
			launcher: Arc::clone(&self.launcher),
		}
	}
}
