use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::derivable::{Derivable, resolve_all};
use crate::detail::Detail;
use crate::error::Result;
use crate::item::{DisplayItem, Payload};
use crate::stream::ensure_active;

/// Presentation pass over a realized list.
///
/// Only labels and decorations can change; [`DisplayItem`] keeps identity,
/// value and detail read-only.
#[async_trait]
pub trait Renderer<D = Detail>: Send + Sync {
	async fn render(&self, ctx: &Context, items: &mut [DisplayItem<D>], token: &CancellationToken) -> Result<()>;
}

pub type SharedRenderer<D = Detail> = Arc<dyn Renderer<D>>;

struct FnRenderer<F>(F);

#[async_trait]
impl<D, F> Renderer<D> for FnRenderer<F>
where
	D: Payload,
	F: Fn(&Context, &mut [DisplayItem<D>]) -> Result<()> + Send + Sync,
{
	async fn render(&self, ctx: &Context, items: &mut [DisplayItem<D>], token: &CancellationToken) -> Result<()> {
		ensure_active(token)?;
		(self.0)(ctx, items)
	}
}

pub fn define_renderer<D, F>(render: F) -> SharedRenderer<D>
where
	D: Payload,
	F: Fn(&Context, &mut [DisplayItem<D>]) -> Result<()> + Send + Sync + 'static,
{
	Arc::new(FnRenderer(render))
}

/// Renderers applied in sequence, see [`compose_renderers`].
pub struct ComposedRenderer<D = Detail> {
	renderers: Vec<SharedRenderer<D>>,
}

#[async_trait]
impl<D: Payload> Renderer<D> for ComposedRenderer<D> {
	async fn render(&self, ctx: &Context, items: &mut [DisplayItem<D>], token: &CancellationToken) -> Result<()> {
		// Checked once so a list is never left partially rendered.
		ensure_active(token)?;
		let uninterrupted = CancellationToken::new();
		for renderer in &self.renderers {
			renderer.render(ctx, items, &uninterrupted).await?;
		}
		Ok(())
	}
}

/// Apply renderers in order; later renderers observe earlier labels.
pub fn compose_renderers<D, I>(renderers: I) -> ComposedRenderer<D>
where
	D: Payload,
	I: IntoIterator,
	I::Item: Into<Derivable<SharedRenderer<D>>>,
{
	ComposedRenderer {
		renderers: resolve_all(renderers),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::item::{Decoration, Item};

	fn display(values: &[&str]) -> Vec<DisplayItem> {
		values
			.iter()
			.enumerate()
			.map(|(index, value)| DisplayItem::from(Item::plain(index, *value)))
			.collect()
	}

	#[tokio::test]
	async fn later_renderers_observe_earlier_labels() {
		let prefix = define_renderer(|_, items: &mut [DisplayItem]| {
			for item in items.iter_mut() {
				item.label = format!("> {}", item.label);
			}
			Ok(())
		});
		let measure = define_renderer(|_, items: &mut [DisplayItem]| {
			for item in items.iter_mut() {
				let width = item.label.len();
				item.decorations.push(Decoration::new(1, width));
			}
			Ok(())
		});
		let mut items = display(&["ab"]);
		compose_renderers([prefix, measure])
			.render(&Context::detached(), &mut items, &CancellationToken::new())
			.await
			.unwrap();

		assert_eq!(items[0].label, "> ab");
		assert_eq!(items[0].value(), "ab");
		assert_eq!(items[0].decorations, vec![Decoration::new(1, 4)]);
	}

	#[tokio::test]
	async fn cancelled_render_leaves_labels_untouched() {
		let upper = define_renderer(|_, items: &mut [DisplayItem]| {
			for item in items.iter_mut() {
				item.label = item.label.to_uppercase();
			}
			Ok(())
		});
		let token = CancellationToken::new();
		token.cancel();
		let mut items = display(&["a", "b"]);
		let err = compose_renderers([upper])
			.render(&Context::detached(), &mut items, &token)
			.await
			.unwrap_err();
		assert!(err.is_cancelled());
		assert!(items.iter().all(|item| item.label == item.value()));
	}
}
