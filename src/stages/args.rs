//! Argument binding for producers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;

use super::curator::{CurateParams, Curator, SharedCurator};
use super::source::{CollectParams, SharedSource, Source};
use crate::context::Context;
use crate::derivable::Derivable;
use crate::detail::Detail;
use crate::error::{Error, Result};
use crate::item::Payload;
use crate::stream::ItemStream;

type ArgsRule = Arc<dyn Fn(&Context) -> BoxFuture<'static, Result<Vec<String>>> + Send + Sync>;

/// Arguments prepended to the caller's on every invocation.
#[derive(Clone)]
pub enum BoundArgs {
	Fixed(Vec<String>),
	/// Re-evaluated on each invocation so producers see current host state.
	Computed(ArgsRule),
}

impl BoundArgs {
	pub fn fixed<I, S>(args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::Fixed(args.into_iter().map(Into::into).collect())
	}

	pub fn computed<F, Fut>(rule: F) -> Self
	where
		F: Fn(&Context) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Vec<String>>> + Send + 'static,
	{
		let boxed: ArgsRule = Arc::new(move |ctx: &Context| -> BoxFuture<'static, Result<Vec<String>>> {
			Box::pin(rule(ctx))
		});
		Self::Computed(boxed)
	}

	/// Bound arguments followed by `args`.
	pub async fn prepend_to(&self, ctx: &Context, args: Vec<String>) -> Result<Vec<String>> {
		let mut bound = match self {
			Self::Fixed(fixed) => fixed.clone(),
			Self::Computed(rule) => rule(ctx).await?,
		};
		bound.extend(args);
		Ok(bound)
	}
}

impl fmt::Debug for BoundArgs {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Fixed(args) => f.debug_tuple("Fixed").field(args).finish(),
			Self::Computed(_) => f.write_str("Computed(..)"),
		}
	}
}

impl<I, S> From<I> for BoundArgs
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	fn from(args: I) -> Self {
		Self::fixed(args)
	}
}

/// Source with bound arguments, see [`bind_source_args`].
pub struct BoundSource<D = Detail> {
	inner: SharedSource<D>,
	args: BoundArgs,
}

impl<D: Payload> Source<D> for BoundSource<D> {
	fn collect(&self, ctx: &Context, params: CollectParams, token: &CancellationToken) -> ItemStream<D> {
		let inner = Arc::clone(&self.inner);
		let bound = self.args.clone();
		let ctx = ctx.clone();
		let token = token.clone();
		stream::once(async move {
			let args = bound.prepend_to(&ctx, params.args).await?;
			tracing::debug!(?args, "collecting with bound arguments");
			Ok::<_, Error>(inner.collect(&ctx, CollectParams { args }, &token))
		})
		.try_flatten()
		.boxed()
	}
}

pub fn bind_source_args<D: Payload>(
	source: impl Into<Derivable<SharedSource<D>>>,
	args: impl Into<BoundArgs>,
) -> BoundSource<D> {
	BoundSource {
		inner: source.into().resolve(),
		args: args.into(),
	}
}

/// Curator with bound arguments, see [`bind_curator_args`].
pub struct BoundCurator<D = Detail> {
	inner: SharedCurator<D>,
	args: BoundArgs,
}

impl<D: Payload> Curator<D> for BoundCurator<D> {
	fn curate(&self, ctx: &Context, params: CurateParams, token: &CancellationToken) -> ItemStream<D> {
		let inner = Arc::clone(&self.inner);
		let bound = self.args.clone();
		let ctx = ctx.clone();
		let token = token.clone();
		stream::once(async move {
			let args = bound.prepend_to(&ctx, params.args).await?;
			tracing::debug!(?args, "curating with bound arguments");
			Ok::<_, Error>(inner.curate(
				&ctx,
				CurateParams {
					args,
					query: params.query,
				},
				&token,
			))
		})
		.try_flatten()
		.boxed()
	}
}

pub fn bind_curator_args<D: Payload>(
	curator: impl Into<Derivable<SharedCurator<D>>>,
	args: impl Into<BoundArgs>,
) -> BoundCurator<D> {
	BoundCurator {
		inner: curator.into().resolve(),
		args: args.into(),
	}
}
