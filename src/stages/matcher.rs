use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::derivable::{Derivable, resolve_all};
use crate::detail::Detail;
use crate::error::Error;
use crate::item::{Item, Payload};
use crate::stream::{ItemStream, collect_items, from_items, guarded};

/// Realized items and the live query handed to a matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchParams<D = Detail> {
	pub items: Vec<Item<D>>,
	pub query: String,
}

impl<D> MatchParams<D> {
	pub fn new(items: Vec<Item<D>>, query: impl Into<String>) -> Self {
		Self {
			items,
			query: query.into(),
		}
	}
}

/// Query-driven filter that decorates the spans it matched.
///
/// An empty or whitespace-only query must pass every item through unchanged,
/// and new decorations are appended to the ones already present.
pub trait Matcher<D = Detail>: Send + Sync {
	fn match_items(&self, ctx: &Context, params: MatchParams<D>, token: &CancellationToken) -> ItemStream<D>;
}

pub type SharedMatcher<D = Detail> = Arc<dyn Matcher<D>>;

struct FnMatcher<F>(F);

impl<D, F> Matcher<D> for FnMatcher<F>
where
	F: Fn(&Context, MatchParams<D>, &CancellationToken) -> ItemStream<D> + Send + Sync,
{
	fn match_items(&self, ctx: &Context, params: MatchParams<D>, token: &CancellationToken) -> ItemStream<D> {
		(self.0)(ctx, params, token)
	}
}

pub fn define_matcher<D, F>(match_items: F) -> SharedMatcher<D>
where
	D: Payload,
	F: Fn(&Context, MatchParams<D>, &CancellationToken) -> ItemStream<D> + Send + Sync + 'static,
{
	Arc::new(FnMatcher(match_items))
}

/// Matchers applied as a narrowing chain, see [`compose_matchers`].
pub struct ComposedMatcher<D = Detail> {
	matchers: Vec<SharedMatcher<D>>,
}

impl<D: Payload> Matcher<D> for ComposedMatcher<D> {
	fn match_items(&self, ctx: &Context, params: MatchParams<D>, token: &CancellationToken) -> ItemStream<D> {
		let matchers = self.matchers.clone();
		let ctx = ctx.clone();
		let inner_token = token.clone();
		let MatchParams { items, query } = params;
		let narrowed = stream::once(async move {
			let mut current = items;
			for (stage, matcher) in matchers.iter().enumerate() {
				if current.is_empty() || inner_token.is_cancelled() {
					break;
				}
				let params = MatchParams {
					items: current,
					query: query.clone(),
				};
				let output = guarded(matcher.match_items(&ctx, params, &inner_token), &inner_token);
				current = collect_items(output).await?;
				tracing::trace!(stage, remaining = current.len(), "matcher stage finished");
			}
			if inner_token.is_cancelled() {
				current.clear();
			}
			Ok::<_, Error>(from_items(current))
		})
		.try_flatten()
		.boxed();
		guarded(narrowed, token)
	}
}

/// Apply matchers in order; each receives the materialized output of the
/// previous one. An empty intermediate result ends the chain early.
pub fn compose_matchers<D, I>(matchers: I) -> ComposedMatcher<D>
where
	D: Payload,
	I: IntoIterator,
	I::Item: Into<Derivable<SharedMatcher<D>>>,
{
	ComposedMatcher {
		matchers: resolve_all(matchers),
	}
}
