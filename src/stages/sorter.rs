use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::derivable::{Derivable, resolve_all};
use crate::detail::Detail;
use crate::error::Result;
use crate::item::{Item, Payload};
use crate::stream::ensure_active;

/// In-place reordering of a realized item list.
///
/// Implementations must sort stably under a strict weak ordering.
#[async_trait]
pub trait Sorter<D = Detail>: Send + Sync {
	async fn sort(&self, ctx: &Context, items: &mut [Item<D>], token: &CancellationToken) -> Result<()>;
}

pub type SharedSorter<D = Detail> = Arc<dyn Sorter<D>>;

struct FnSorter<F>(F);

#[async_trait]
impl<D, F> Sorter<D> for FnSorter<F>
where
	D: Payload,
	F: Fn(&Context, &mut [Item<D>]) -> Result<()> + Send + Sync,
{
	async fn sort(&self, ctx: &Context, items: &mut [Item<D>], token: &CancellationToken) -> Result<()> {
		ensure_active(token)?;
		(self.0)(ctx, items)
	}
}

/// Wrap a synchronous sort function as a sorter.
pub fn define_sorter<D, F>(sort: F) -> SharedSorter<D>
where
	D: Payload,
	F: Fn(&Context, &mut [Item<D>]) -> Result<()> + Send + Sync + 'static,
{
	Arc::new(FnSorter(sort))
}

/// Sorters applied in sequence, see [`compose_sorters`].
pub struct ComposedSorter<D = Detail> {
	sorters: Vec<SharedSorter<D>>,
}

#[async_trait]
impl<D: Payload> Sorter<D> for ComposedSorter<D> {
	async fn sort(&self, ctx: &Context, items: &mut [Item<D>], token: &CancellationToken) -> Result<()> {
		ensure_active(token)?;
		for sorter in &self.sorters {
			sorter.sort(ctx, items, token).await?;
		}
		Ok(())
	}
}

/// Apply sorters one after another.
///
/// Each full resort can reorder everything, so the last sorter decides the
/// final order; earlier ones only break its ties.
pub fn compose_sorters<D, I>(sorters: I) -> ComposedSorter<D>
where
	D: Payload,
	I: IntoIterator,
	I::Item: Into<Derivable<SharedSorter<D>>>,
{
	ComposedSorter {
		sorters: resolve_all(sorters),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn by_len() -> SharedSorter {
		define_sorter(|_, items: &mut [Item]| {
			items.sort_by_key(|item| item.value.len());
			Ok(())
		})
	}

	fn alphabetical() -> SharedSorter {
		define_sorter(|_, items: &mut [Item]| {
			items.sort_by(|a, b| a.value.cmp(&b.value));
			Ok(())
		})
	}

	fn values(items: &[Item]) -> Vec<&str> {
		items.iter().map(|item| item.value.as_str()).collect()
	}

	#[tokio::test]
	async fn last_sorter_dominates_earlier_ones_break_ties() {
		let mut items: Vec<Item> = ["bb", "a", "ab", "c"]
			.into_iter()
			.enumerate()
			.map(|(index, value)| Item::plain(index, value))
			.collect();
		let sorter = compose_sorters([alphabetical(), by_len()]);
		sorter
			.sort(&Context::detached(), &mut items, &CancellationToken::new())
			.await
			.unwrap();
		assert_eq!(values(&items), vec!["a", "c", "ab", "bb"]);
	}

	#[tokio::test]
	async fn cancelled_sort_leaves_items_untouched() {
		let mut items = vec![Item::plain(0u64, "b"), Item::plain(1u64, "a")];
		let token = CancellationToken::new();
		token.cancel();
		let err = compose_sorters([alphabetical()])
			.sort(&Context::detached(), &mut items, &token)
			.await
			.unwrap_err();
		assert!(err.is_cancelled());
		assert_eq!(values(&items), vec!["b", "a"]);
	}
}
