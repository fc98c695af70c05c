use frz_pipeline::stream::ensure_active;
use frz_pipeline::{ActionOutcome, Context, Detail, InvokeParams, OpenRequest, SharedAction, define_action};

use crate::location::Location;

/// Settings for [`open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
	/// Host command opening the first target.
	pub opener: String,
	/// Host command opening every further target; defaults to `opener`.
	pub splitter: Option<String>,
}

impl Default for OpenOptions {
	fn default() -> Self {
		Self::with_opener("edit")
	}
}

impl OpenOptions {
	pub fn with_opener(opener: impl Into<String>) -> Self {
		Self {
			opener: opener.into(),
			splitter: None,
		}
	}
}

/// Open every target's path, or buffer name, in the host at its line and
/// column.
pub fn open(options: OpenOptions) -> SharedAction<Detail> {
	define_action(move |ctx: Context, params: InvokeParams<Detail>, token| {
		let opener = options.opener.clone();
		let splitter = options.splitter.clone().unwrap_or_else(|| opener.clone());
		async move {
			let mut current = opener;
			for item in params.targets() {
				ensure_active(&token)?;
				let location = Location::of(&item.detail);
				let Some(target) = location.target() else {
					tracing::debug!(item = %item.id, "item has no location to open");
					continue;
				};
				let request = OpenRequest::new(target)
					.with_opener(current.as_str())
					.at(location.line, location.column);
				if let Err(err) = ctx.host().open(&request).await {
					tracing::warn!(path = %target, error = %err, "failed to open item");
				}
				current.clone_from(&splitter);
			}
			Ok(ActionOutcome::Done)
		}
	})
}

/// `open` plus one action per common opener.
pub fn default_open_actions() -> Vec<(&'static str, SharedAction<Detail>)> {
	vec![
		("open", open(OpenOptions::default())),
		("open:split", open(OpenOptions::with_opener("split"))),
		("open:vsplit", open(OpenOptions::with_opener("vsplit"))),
		("open:tabedit", open(OpenOptions::with_opener("tabedit"))),
		("open:drop", open(OpenOptions::with_opener("drop"))),
	]
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use frz_pipeline::{Action, CancellationToken, Item};

	use super::*;
	use crate::host::{HostEvent, LocalHost};
	use crate::location::{BUFNAME, LINE, PATH};

	#[tokio::test]
	async fn later_targets_use_the_splitter() {
		let host = Arc::new(LocalHost::new());
		let ctx = Context::from_shared(host.clone());
		let action = open(OpenOptions {
			opener: "edit".into(),
			splitter: Some("vsplit".into()),
		});
		let selection = vec![
			Item::new(0u64, "a", Detail::new().with(PATH, "a.rs").with(LINE, 3)),
			Item::new(1u64, "b", Detail::new().with(BUFNAME, "[scratch]")),
		];
		action
			.invoke(&ctx, &InvokeParams::new(None, selection, Vec::new()), &CancellationToken::new())
			.await
			.unwrap();
		assert_eq!(
			host.events(),
			vec![
				HostEvent::Open(OpenRequest::new("a.rs").with_opener("edit").at(Some(3), None)),
				HostEvent::Open(OpenRequest::new("[scratch]").with_opener("vsplit")),
			]
		);
	}

	#[tokio::test]
	async fn focused_item_is_used_without_a_selection() {
		let host = Arc::new(LocalHost::new());
		let ctx = Context::from_shared(host.clone());
		let actions = default_open_actions();
		let (_, tabedit) = &actions[3];
		let item = Item::new(0u64, "x", Detail::new().with(PATH, "x.md"));
		tabedit
			.invoke(&ctx, &InvokeParams::focused(item), &CancellationToken::new())
			.await
			.unwrap();
		assert_eq!(
			host.events(),
			vec![HostEvent::Open(OpenRequest::new("x.md").with_opener("tabedit"))]
		);
	}
}
