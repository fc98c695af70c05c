use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use super::source::renumber;
use crate::context::Context;
use crate::derivable::{Derivable, resolve_all};
use crate::detail::Detail;
use crate::item::Payload;
use crate::stream::{ItemStream, guarded};

/// Arguments and live query supplied to a curator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurateParams {
	pub args: Vec<String>,
	pub query: String,
}

impl CurateParams {
	pub fn new<I, S>(args: I, query: impl Into<String>) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			args: args.into_iter().map(Into::into).collect(),
			query: query.into(),
		}
	}
}

/// Query-driven producer, used when filtering happens inside the producing
/// process itself.
pub trait Curator<D = Detail>: Send + Sync {
	fn curate(&self, ctx: &Context, params: CurateParams, token: &CancellationToken) -> ItemStream<D>;
}

pub type SharedCurator<D = Detail> = Arc<dyn Curator<D>>;

struct FnCurator<F>(F);

impl<D, F> Curator<D> for FnCurator<F>
where
	F: Fn(&Context, CurateParams, &CancellationToken) -> ItemStream<D> + Send + Sync,
{
	fn curate(&self, ctx: &Context, params: CurateParams, token: &CancellationToken) -> ItemStream<D> {
		(self.0)(ctx, params, token)
	}
}

pub fn define_curator<D, F>(curate: F) -> SharedCurator<D>
where
	D: Payload,
	F: Fn(&Context, CurateParams, &CancellationToken) -> ItemStream<D> + Send + Sync + 'static,
{
	Arc::new(FnCurator(curate))
}

/// Curators concatenated in order, see [`compose_curators`].
pub struct ComposedCurator<D = Detail> {
	curators: Vec<SharedCurator<D>>,
}

impl<D: Payload> Curator<D> for ComposedCurator<D> {
	fn curate(&self, ctx: &Context, params: CurateParams, token: &CancellationToken) -> ItemStream<D> {
		tracing::debug!(curators = self.curators.len(), query = %params.query, "curating from composed curator");
		let ctx = ctx.clone();
		let inner_token = token.clone();
		let items = stream::iter(self.curators.clone())
			.map(move |curator| curator.curate(&ctx, params.clone(), &inner_token))
			.flatten()
			.boxed();
		renumber(guarded(items, token))
	}
}

/// Concatenate curators, renumbering ids densely from zero.
pub fn compose_curators<D, I>(curators: I) -> ComposedCurator<D>
where
	D: Payload,
	I: IntoIterator,
	I::Item: Into<Derivable<SharedCurator<D>>>,
{
	ComposedCurator {
		curators: resolve_all(curators),
	}
}
