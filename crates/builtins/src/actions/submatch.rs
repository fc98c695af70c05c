use std::sync::Arc;

use frz_pipeline::{
	ActionOutcome, Context, Detail, Error, InvokeParams, Payload, PickerParams, Producer, SharedAction,
	SharedMatcher, SharedPreviewer, SharedRenderer, SharedSorter, define_action,
};

use crate::matchers::{CaseMode, FzfOptions, fzf, regexp, substring};
use crate::sources::list;

/// Stages replaced in the nested picker. `None` keeps the enclosing
/// picker's stages.
pub struct SubmatchOptions<D = Detail> {
	pub sorters: Option<Vec<SharedSorter<D>>>,
	pub renderers: Option<Vec<SharedRenderer<D>>>,
	pub previewers: Option<Vec<SharedPreviewer<D>>>,
	pub default_action: Option<String>,
}

impl<D> Default for SubmatchOptions<D> {
	fn default() -> Self {
		Self {
			sorters: None,
			renderers: None,
			previewers: None,
			default_action: None,
		}
	}
}

/// Re-filter the current results in a nested picker using `matchers`.
///
/// The nested picker copies the enclosing one, lists the selected items (or
/// every filtered item when nothing is selected) and swaps in the given
/// matchers. Returns [`ActionOutcome::Chain`] when the nested session
/// picked something.
pub fn submatch<D: Payload + Clone>(matchers: Vec<SharedMatcher<D>>, options: SubmatchOptions<D>) -> SharedAction<D> {
	let options = Arc::new(options);
	define_action(move |ctx: Context, params: InvokeParams<D>, token| {
		let matchers = matchers.clone();
		let options = Arc::clone(&options);
		async move {
			let Some(submatch) = params.submatch else {
				return Err(Error::MissingContext {
					stage: "submatch",
					requirement: "the hidden context of an enclosing picker",
				});
			};
			let items = if params.selected_items.is_empty() {
				params.filtered_items
			} else {
				params.selected_items
			};

			let mut nested = PickerParams::clone(&submatch.params);
			nested.producer = Producer::Source(list(items));
			nested.matchers = matchers;
			if let Some(sorters) = &options.sorters {
				nested.sorters.clone_from(sorters);
			}
			if let Some(renderers) = &options.renderers {
				nested.renderers.clone_from(renderers);
			}
			if let Some(previewers) = &options.previewers {
				nested.previewers.clone_from(previewers);
			}
			if let Some(name) = &options.default_action {
				nested.default_action = Some(name.clone());
			}

			tracing::debug!(picker = %nested.name, "starting submatch picker");
			let picked = submatch.launcher.launch(&ctx, nested, &token).await?;
			Ok(if picked {
				ActionOutcome::Chain
			} else {
				ActionOutcome::Done
			})
		}
	})
}

/// Submatch actions for each built-in matcher.
pub fn default_submatch_actions() -> Vec<(&'static str, SharedAction<Detail>)> {
	vec![
		(
			"sub:fzf",
			submatch(vec![fzf(FzfOptions::default())], SubmatchOptions::default()),
		),
		(
			"sub:substring",
			submatch(vec![substring(CaseMode::Smart)], SubmatchOptions::default()),
		),
		("sub:regexp", submatch(vec![regexp()], SubmatchOptions::default())),
	]
}
