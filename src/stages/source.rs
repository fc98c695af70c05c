use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::derivable::{Derivable, resolve_all};
use crate::detail::Detail;
use crate::item::{ItemId, Payload};
use crate::stream::{ItemStream, guarded};

/// Arguments supplied to a source for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectParams {
	pub args: Vec<String>,
}

impl CollectParams {
	pub fn new<I, S>(args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			args: args.into_iter().map(Into::into).collect(),
		}
	}
}

/// Argument-driven item producer.
///
/// Every call re-runs whatever work produces the items.
pub trait Source<D = Detail>: Send + Sync {
	fn collect(&self, ctx: &Context, params: CollectParams, token: &CancellationToken) -> ItemStream<D>;
}

pub type SharedSource<D = Detail> = Arc<dyn Source<D>>;

struct FnSource<F>(F);

impl<D, F> Source<D> for FnSource<F>
where
	F: Fn(&Context, CollectParams, &CancellationToken) -> ItemStream<D> + Send + Sync,
{
	fn collect(&self, ctx: &Context, params: CollectParams, token: &CancellationToken) -> ItemStream<D> {
		(self.0)(ctx, params, token)
	}
}

/// Wrap a collect function as a source.
pub fn define_source<D, F>(collect: F) -> SharedSource<D>
where
	D: Payload,
	F: Fn(&Context, CollectParams, &CancellationToken) -> ItemStream<D> + Send + Sync + 'static,
{
	Arc::new(FnSource(collect))
}

/// Sources concatenated in order, see [`compose_sources`].
pub struct ComposedSource<D = Detail> {
	sources: Vec<SharedSource<D>>,
}

impl<D: Payload> Source<D> for ComposedSource<D> {
	fn collect(&self, ctx: &Context, params: CollectParams, token: &CancellationToken) -> ItemStream<D> {
		tracing::debug!(sources = self.sources.len(), "collecting from composed source");
		let ctx = ctx.clone();
		let inner_token = token.clone();
		let items = stream::iter(self.sources.clone())
			.map(move |source| source.collect(&ctx, params.clone(), &inner_token))
			.flatten()
			.boxed();
		renumber(guarded(items, token))
	}
}

/// Concatenate sources, renumbering ids densely from zero.
///
/// Each constituent is only invoked once the previous one is exhausted.
pub fn compose_sources<D, I>(sources: I) -> ComposedSource<D>
where
	D: Payload,
	I: IntoIterator,
	I::Item: Into<Derivable<SharedSource<D>>>,
{
	ComposedSource {
		sources: resolve_all(sources),
	}
}

/// Rewrite item ids to `0, 1, 2, ...` in stream order.
pub(crate) fn renumber<D: Payload>(items: ItemStream<D>) -> ItemStream<D> {
	let mut next = 0u64;
	items
		.map(move |item| {
			item.map(|mut item| {
				item.id = ItemId::Index(next);
				next += 1;
				item
			})
		})
		.boxed()
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;
	use std::time::Duration;

	use futures::StreamExt;

	use super::*;
	use crate::item::Item;
	use crate::stream::{collect_items, from_items};

	fn keyed(values: &'static [&'static str]) -> SharedSource {
		define_source(move |_, _, _| {
			from_items(values.iter().map(|value| Item::plain(format!("key-{value}"), *value)))
		})
	}

	#[tokio::test]
	async fn composed_ids_are_dense_from_zero() {
		let source = compose_sources([keyed(&["a", "b"]), keyed(&[]), keyed(&["c"])]);
		let items = collect_items(source.collect(
			&Context::detached(),
			CollectParams::default(),
			&CancellationToken::new(),
		))
		.await
		.unwrap();

		let ids: Vec<_> = items.iter().map(|item| item.id.clone()).collect();
		assert_eq!(ids, vec![ItemId::Index(0), ItemId::Index(1), ItemId::Index(2)]);
		let values: Vec<_> = items.iter().map(|item| item.value.as_str()).collect();
		assert_eq!(values, vec!["a", "b", "c"]);
	}

	#[tokio::test]
	async fn constituents_are_invoked_lazily() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let tracked = |name: &'static str| {
			let log = Arc::clone(&log);
			define_source(move |_, _, _| {
				log.lock().unwrap().push(name);
				from_items([Item::plain(0u64, name)])
			})
		};
		let source = compose_sources([tracked("first"), tracked("second")]);
		let mut items = source.collect(
			&Context::detached(),
			CollectParams::default(),
			&CancellationToken::new(),
		);

		assert!(log.lock().unwrap().is_empty());
		items.next().await.unwrap().unwrap();
		assert_eq!(*log.lock().unwrap(), vec!["first"]);
		items.next().await.unwrap().unwrap();
		assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
	}

	#[tokio::test]
	async fn arguments_reach_every_constituent() {
		let echo = || {
			define_source(|_, params: CollectParams, _| {
				from_items(params.args.into_iter().map(|arg| Item::plain(0u64, arg)))
			})
		};
		let source = compose_sources([echo(), echo()]);
		let items = collect_items(source.collect(
			&Context::detached(),
			CollectParams::new(["x"]),
			&CancellationToken::new(),
		))
		.await
		.unwrap();
		assert_eq!(items.len(), 2);
	}

	#[tokio::test]
	async fn cancellation_mid_stream_stops_production() {
		let produced = Arc::new(Mutex::new(0usize));
		let counter = Arc::clone(&produced);
		let slow = define_source(move |_, _, _| {
			let counter = Arc::clone(&counter);
			futures::stream::iter(0u64..1000)
				.then(move |i| {
					let counter = Arc::clone(&counter);
					async move {
						tokio::time::sleep(Duration::from_millis(1)).await;
						*counter.lock().unwrap() += 1;
						Ok(Item::plain(i, i.to_string()))
					}
				})
				.boxed()
		});
		let source = compose_sources([slow]);
		let token = CancellationToken::new();
		let mut items = source.collect(&Context::detached(), CollectParams::default(), &token);

		let mut consumed = 0;
		while let Some(item) = items.next().await {
			item.unwrap();
			consumed += 1;
			if consumed == 10 {
				token.cancel();
			}
		}
		assert_eq!(consumed, 10);
		assert!(*produced.lock().unwrap() <= 11);
	}
}
