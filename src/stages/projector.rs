//! Statically typed detail transforms.
//!
//! A projector maps items carrying `T` to items carrying an unrelated `U`.
//! Chains are checked by the compiler: `compose_projectors(first, second)`
//! only type-checks when `first` outputs what `second` consumes.

use std::sync::Arc;

use futures::stream::StreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::curator::{CurateParams, Curator, SharedCurator};
use super::source::{CollectParams, SharedSource, Source};
use crate::context::Context;
use crate::derivable::Derivable;
use crate::detail::Detail;
use crate::error::{Error, Result};
use crate::item::{Item, Payload};
use crate::stream::{ItemStream, guarded};

/// Item stream handed to a projector.
pub struct ProjectParams<T> {
	pub items: ItemStream<T>,
}

pub trait Projector<T, U>: Send + Sync {
	fn project(&self, ctx: &Context, params: ProjectParams<T>, token: &CancellationToken) -> ItemStream<U>;
}

pub type SharedProjector<T, U> = Arc<dyn Projector<T, U>>;

struct FnProjector<F>(F);

impl<T, U, F> Projector<T, U> for FnProjector<F>
where
	F: Fn(&Context, ProjectParams<T>, &CancellationToken) -> ItemStream<U> + Send + Sync,
{
	fn project(&self, ctx: &Context, params: ProjectParams<T>, token: &CancellationToken) -> ItemStream<U> {
		(self.0)(ctx, params, token)
	}
}

pub fn define_projector<T, U, F>(project: F) -> SharedProjector<T, U>
where
	T: Payload,
	U: Payload,
	F: Fn(&Context, ProjectParams<T>, &CancellationToken) -> ItemStream<U> + Send + Sync + 'static,
{
	Arc::new(FnProjector(project))
}

/// Projector applying `map` to every item; `None` drops the item.
pub fn project_each<T, U, F>(map: F) -> SharedProjector<T, U>
where
	T: Payload,
	U: Payload,
	F: Fn(Item<T>) -> Result<Option<Item<U>>> + Send + Sync + 'static,
{
	let map = Arc::new(map);
	define_projector(move |_, params: ProjectParams<T>, _| {
		let map = Arc::clone(&map);
		params
			.items
			.filter_map(move |item| futures::future::ready(item.and_then(|item| map(item)).transpose()))
			.boxed()
	})
}

/// Reinterpret dynamic details as `T`.
pub fn typed_detail<T>() -> SharedProjector<Detail, T>
where
	T: DeserializeOwned + Payload,
{
	project_each(|item: Item<Detail>| {
		let Item {
			id,
			value,
			detail,
			decorations,
		} = item;
		let detail = detail.into_typed::<T>().map_err(|err| {
			Error::Host(anyhow::Error::new(err).context(format!("item '{value}' has an incompatible detail")))
		})?;
		Ok(Some(Item {
			id,
			value,
			detail,
			decorations,
		}))
	})
}

/// Capture typed details as dynamic records.
pub fn dynamic_detail<T>() -> SharedProjector<T, Detail>
where
	T: Serialize + Payload,
{
	project_each(|item: Item<T>| {
		let detail = Detail::from_typed(&item.detail).map_err(|err| Error::Host(err.into()))?;
		Ok(Some(item.map_detail(|_| detail)))
	})
}

/// Two projectors run back to back, see [`compose_projectors`].
pub struct ComposedProjector<T, U, V> {
	first: SharedProjector<T, U>,
	second: SharedProjector<U, V>,
}

impl<T, U, V> Projector<T, V> for ComposedProjector<T, U, V>
where
	T: Payload,
	U: Payload,
	V: Payload,
{
	fn project(&self, ctx: &Context, params: ProjectParams<T>, token: &CancellationToken) -> ItemStream<V> {
		let middle = guarded(self.first.project(ctx, params, token), token);
		self.second.project(ctx, ProjectParams { items: middle }, token)
	}
}

pub fn compose_projectors<T, U, V>(
	first: impl Into<Derivable<SharedProjector<T, U>>>,
	second: impl Into<Derivable<SharedProjector<U, V>>>,
) -> SharedProjector<T, V>
where
	T: Payload,
	U: Payload,
	V: Payload,
{
	Arc::new(ComposedProjector {
		first: first.into().resolve(),
		second: second.into().resolve(),
	})
}

/// Method form of [`compose_projectors`].
pub trait ProjectorExt<T, U> {
	fn then<V: Payload>(self, next: SharedProjector<U, V>) -> SharedProjector<T, V>;
}

impl<T: Payload, U: Payload> ProjectorExt<T, U> for SharedProjector<T, U> {
	fn then<V: Payload>(self, next: SharedProjector<U, V>) -> SharedProjector<T, V> {
		compose_projectors(self, next)
	}
}

/// Source whose items are reshaped by a projector, see [`pipe_projectors`].
pub struct ProjectedSource<T, U> {
	inner: SharedSource<T>,
	projector: SharedProjector<T, U>,
}

impl<T: Payload, U: Payload> Source<U> for ProjectedSource<T, U> {
	fn collect(&self, ctx: &Context, params: CollectParams, token: &CancellationToken) -> ItemStream<U> {
		let items = guarded(self.inner.collect(ctx, params, token), token);
		guarded(self.projector.project(ctx, ProjectParams { items }, token), token)
	}
}

pub fn pipe_projectors<T: Payload, U: Payload>(
	source: impl Into<Derivable<SharedSource<T>>>,
	projector: impl Into<Derivable<SharedProjector<T, U>>>,
) -> ProjectedSource<T, U> {
	ProjectedSource {
		inner: source.into().resolve(),
		projector: projector.into().resolve(),
	}
}

/// Curator whose items are reshaped by a projector.
pub struct ProjectedCurator<T, U> {
	inner: SharedCurator<T>,
	projector: SharedProjector<T, U>,
}

impl<T: Payload, U: Payload> Curator<U> for ProjectedCurator<T, U> {
	fn curate(&self, ctx: &Context, params: CurateParams, token: &CancellationToken) -> ItemStream<U> {
		let items = guarded(self.inner.curate(ctx, params, token), token);
		guarded(self.projector.project(ctx, ProjectParams { items }, token), token)
	}
}

pub fn pipe_curator_projectors<T: Payload, U: Payload>(
	curator: impl Into<Derivable<SharedCurator<T>>>,
	projector: impl Into<Derivable<SharedProjector<T, U>>>,
) -> ProjectedCurator<T, U> {
	ProjectedCurator {
		inner: curator.into().resolve(),
		projector: projector.into().resolve(),
	}
}

#[cfg(test)]
mod tests {
	use serde::Deserialize;

	use super::*;
	use crate::stages::curator::define_curator;
	use crate::stages::source::define_source;
	use crate::stream::{collect_items, from_items};

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Hit {
		path: String,
		line: u64,
	}

	#[derive(Debug, Clone, PartialEq)]
	struct Location {
		path: String,
	}

	#[derive(Debug, Clone, PartialEq)]
	struct Label(String);

	fn hits() -> SharedSource<Hit> {
		define_source(|_, _, _| {
			from_items([
				Item::new(0u64, "a.rs:3", Hit {
					path: "a.rs".into(),
					line: 3,
				}),
				Item::new(1u64, "b.rs:9", Hit {
					path: "b.rs".into(),
					line: 9,
				}),
			])
		})
	}

	fn to_location() -> SharedProjector<Hit, Location> {
		project_each(|item: Item<Hit>| {
			Ok(Some(item.map_detail(|hit| Location { path: hit.path })))
		})
	}

	fn to_label() -> SharedProjector<Location, Label> {
		project_each(|item: Item<Location>| {
			if item.detail.path.starts_with('b') {
				return Ok(None);
			}
			Ok(Some(item.map_detail(|location| Label(location.path.to_uppercase()))))
		})
	}

	#[tokio::test]
	async fn projectors_chain_through_unrelated_types() {
		let source = pipe_projectors(hits(), to_location().then(to_label()));
		let items = collect_items(source.collect(
			&Context::detached(),
			CollectParams::default(),
			&CancellationToken::new(),
		))
		.await
		.unwrap();
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].detail, Label("A.RS".into()));
		assert_eq!(items[0].value, "a.rs:3");
	}

	#[tokio::test]
	async fn dynamic_and_typed_details_convert_both_ways() {
		let source = pipe_projectors(hits(), compose_projectors(dynamic_detail(), typed_detail::<Hit>()));
		let items = collect_items(source.collect(
			&Context::detached(),
			CollectParams::default(),
			&CancellationToken::new(),
		))
		.await
		.unwrap();
		assert_eq!(items[1].detail.line, 9);
	}

	#[tokio::test]
	async fn incompatible_dynamic_detail_is_an_error() {
		let curator = define_curator(|_, _, _| from_items([Item::plain(0u64, "x")]));
		let typed = pipe_curator_projectors(curator, typed_detail::<Hit>());
		let result = collect_items(typed.curate(
			&Context::detached(),
			CurateParams::default(),
			&CancellationToken::new(),
		))
		.await;
		assert!(result.is_err());
	}
}
