use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::derivable::{Derivable, resolve_all};
use crate::detail::Detail;
use crate::error::Result;
use crate::item::{Item, Payload, PreviewItem};
use crate::stream::ensure_active;

/// Produces preview content for a single item, or `None` when the item is
/// not something this previewer handles.
///
/// I/O failures belong in a diagnostic [`PreviewItem`], not in `Err`, so a
/// fallback chain keeps working.
#[async_trait]
pub trait Previewer<D = Detail>: Send + Sync {
	async fn preview(&self, ctx: &Context, item: &Item<D>, token: &CancellationToken) -> Result<Option<PreviewItem>>;
}

pub type SharedPreviewer<D = Detail> = Arc<dyn Previewer<D>>;

struct FnPreviewer<F>(F);

#[async_trait]
impl<D, F, Fut> Previewer<D> for FnPreviewer<F>
where
	D: Payload + Clone,
	F: Fn(Context, Item<D>, CancellationToken) -> Fut + Send + Sync,
	Fut: Future<Output = Result<Option<PreviewItem>>> + Send + 'static,
{
	async fn preview(&self, ctx: &Context, item: &Item<D>, token: &CancellationToken) -> Result<Option<PreviewItem>> {
		ensure_active(token)?;
		(self.0)(ctx.clone(), item.clone(), token.clone()).await
	}
}

/// Wrap an async preview function. The function receives owned copies of
/// its arguments.
pub fn define_previewer<D, F, Fut>(preview: F) -> SharedPreviewer<D>
where
	D: Payload + Clone,
	F: Fn(Context, Item<D>, CancellationToken) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Option<PreviewItem>>> + Send + 'static,
{
	Arc::new(FnPreviewer(preview))
}

/// Fallback chain of previewers, see [`compose_previewers`].
pub struct ComposedPreviewer<D = Detail> {
	previewers: Vec<SharedPreviewer<D>>,
}

#[async_trait]
impl<D: Payload> Previewer<D> for ComposedPreviewer<D> {
	async fn preview(&self, ctx: &Context, item: &Item<D>, token: &CancellationToken) -> Result<Option<PreviewItem>> {
		for previewer in &self.previewers {
			ensure_active(token)?;
			if let Some(preview) = previewer.preview(ctx, item, token).await? {
				return Ok(Some(preview));
			}
		}
		Ok(None)
	}
}

/// Try previewers in order and return the first preview produced. Later
/// previewers are not invoked once one succeeds.
pub fn compose_previewers<D, I>(previewers: I) -> ComposedPreviewer<D>
where
	D: Payload,
	I: IntoIterator,
	I::Item: Into<Derivable<SharedPreviewer<D>>>,
{
	ComposedPreviewer {
		previewers: resolve_all(previewers),
	}
}
