use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::derivable::{Derivable, resolve_all};
use crate::detail::Detail;
use crate::error::Result;
use crate::item::{Item, Payload};
use crate::picker::SubmatchContext;
use crate::stream::ensure_active;

/// Selection an action operates on.
#[derive(Clone)]
pub struct InvokeParams<D = Detail> {
	/// Item under the cursor, if any.
	pub item: Option<Item<D>>,
	pub selected_items: Vec<Item<D>>,
	pub filtered_items: Vec<Item<D>>,
	/// Enclosing picker, present when invoked from a picker session.
	pub submatch: Option<SubmatchContext<D>>,
}

impl<D> InvokeParams<D> {
	pub fn new(item: Option<Item<D>>, selected_items: Vec<Item<D>>, filtered_items: Vec<Item<D>>) -> Self {
		Self {
			item,
			selected_items,
			filtered_items,
			submatch: None,
		}
	}

	pub fn focused(item: Item<D>) -> Self {
		Self::new(Some(item), Vec::new(), Vec::new())
	}

	#[must_use]
	pub fn with_submatch(mut self, submatch: SubmatchContext<D>) -> Self {
		self.submatch = Some(submatch);
		self
	}

	/// Items the action should act on: the explicit selection when present,
	/// otherwise the focused item.
	#[must_use]
	pub fn targets(&self) -> Vec<&Item<D>> {
		if self.selected_items.is_empty() {
			self.item.iter().collect()
		} else {
			self.selected_items.iter().collect()
		}
	}
}

impl<D> std::fmt::Debug for InvokeParams<D> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InvokeParams")
			.field("item", &self.item.as_ref().map(|item| &item.value))
			.field("selected_items", &self.selected_items.len())
			.field("filtered_items", &self.filtered_items.len())
			.field("submatch", &self.submatch.is_some())
			.finish()
	}
}

/// What the orchestrator should do after an action completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionOutcome {
	/// Close the session.
	#[default]
	Done,
	/// Keep the session open or continue into a nested one.
	Chain,
}

impl ActionOutcome {
	#[must_use]
	pub fn is_chain(self) -> bool {
		matches!(self, Self::Chain)
	}
}

/// Side effect applied to a selection.
#[async_trait]
pub trait Action<D = Detail>: Send + Sync {
	async fn invoke(&self, ctx: &Context, params: &InvokeParams<D>, token: &CancellationToken) -> Result<ActionOutcome>;
}

pub type SharedAction<D = Detail> = Arc<dyn Action<D>>;

struct FnAction<F>(F);

#[async_trait]
impl<D, F, Fut> Action<D> for FnAction<F>
where
	D: Payload + Clone,
	F: Fn(Context, InvokeParams<D>, CancellationToken) -> Fut + Send + Sync,
	Fut: Future<Output = Result<ActionOutcome>> + Send + 'static,
{
	async fn invoke(&self, ctx: &Context, params: &InvokeParams<D>, token: &CancellationToken) -> Result<ActionOutcome> {
		ensure_active(token)?;
		(self.0)(ctx.clone(), params.clone(), token.clone()).await
	}
}

/// Wrap an async invoke function. The function receives owned copies of its
/// arguments.
pub fn define_action<D, F, Fut>(invoke: F) -> SharedAction<D>
where
	D: Payload + Clone,
	F: Fn(Context, InvokeParams<D>, CancellationToken) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<ActionOutcome>> + Send + 'static,
{
	Arc::new(FnAction(invoke))
}

/// Actions run one after another, see [`compose_actions`].
pub struct ComposedAction<D = Detail> {
	actions: Vec<SharedAction<D>>,
}

#[async_trait]
impl<D: Payload> Action<D> for ComposedAction<D> {
	async fn invoke(&self, ctx: &Context, params: &InvokeParams<D>, token: &CancellationToken) -> Result<ActionOutcome> {
		let mut outcome = ActionOutcome::Done;
		for action in &self.actions {
			ensure_active(token)?;
			if action.invoke(ctx, params, token).await?.is_chain() {
				outcome = ActionOutcome::Chain;
			}
		}
		Ok(outcome)
	}
}

/// Invoke actions strictly in order, each awaited before the next starts.
///
/// The composed outcome is [`ActionOutcome::Chain`] when any constituent
/// asked for it.
pub fn compose_actions<D, I>(actions: I) -> ComposedAction<D>
where
	D: Payload,
	I: IntoIterator,
	I::Item: Into<Derivable<SharedAction<D>>>,
{
	ComposedAction {
		actions: resolve_all(actions),
	}
}
