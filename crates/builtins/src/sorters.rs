//! Item sorters. All of them sort stably.

use std::cmp::Ordering;

use frz_pipeline::{Item, Payload, SharedSorter, define_sorter};

/// Order items by their value as a string.
pub fn lexical<D: Payload>(reverse: bool) -> SharedSorter<D> {
	lexical_by(reverse, |item: &Item<D>| item.value.clone())
}

/// Order items by a string key.
pub fn lexical_by<D, F>(reverse: bool, key: F) -> SharedSorter<D>
where
	D: Payload,
	F: Fn(&Item<D>) -> String + Send + Sync + 'static,
{
	define_sorter(move |_, items: &mut [Item<D>]| {
		items.sort_by_cached_key(|item| key(item));
		if reverse {
			reverse_stable(items, |a, b| key(a) == key(b));
		}
		Ok(())
	})
}

/// Order items by their value parsed as a number.
///
/// Items whose value is not numeric keep their relative order after every
/// numeric one, in both directions.
pub fn numerical<D: Payload>(reverse: bool) -> SharedSorter<D> {
	numerical_by(reverse, |item: &Item<D>| item.value.trim().parse::<f64>().ok())
}

/// Order items by a numeric key, placing items without one last.
pub fn numerical_by<D, F>(reverse: bool, key: F) -> SharedSorter<D>
where
	D: Payload,
	F: Fn(&Item<D>) -> Option<f64> + Send + Sync + 'static,
{
	define_sorter(move |_, items: &mut [Item<D>]| {
		items.sort_by(|a, b| match (key(a).filter(|n| !n.is_nan()), key(b).filter(|n| !n.is_nan())) {
			(Some(a), Some(b)) => {
				let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
				if reverse { ordering.reverse() } else { ordering }
			}
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(None, None) => Ordering::Equal,
		});
		Ok(())
	})
}

/// Sorter that leaves the order untouched.
pub fn noop<D: Payload>() -> SharedSorter<D> {
	define_sorter(|_, _: &mut [Item<D>]| Ok(()))
}

/// Reverse an ascending slice while keeping runs of equal keys in their
/// original order.
fn reverse_stable<T>(items: &mut [T], same: impl Fn(&T, &T) -> bool) {
	items.reverse();
	let mut start = 0;
	while start < items.len() {
		let mut end = start + 1;
		while end < items.len() && same(&items[start], &items[end]) {
			end += 1;
		}
		items[start..end].reverse();
		start = end;
	}
}

#[cfg(test)]
mod tests {
	use frz_pipeline::{CancellationToken, Context, Detail, Sorter};

	use super::*;

	async fn sorted(sorter: SharedSorter, values: &[&str]) -> Vec<(String, String)> {
		let mut items: Vec<Item> = values
			.iter()
			.enumerate()
			.map(|(index, value)| Item::plain(index, *value))
			.collect();
		sorter
			.sort(&Context::detached(), &mut items, &CancellationToken::new())
			.await
			.unwrap();
		items
			.into_iter()
			.map(|item| (item.id.to_string(), item.value))
			.collect()
	}

	fn values(pairs: &[(String, String)]) -> Vec<&str> {
		pairs.iter().map(|(_, value)| value.as_str()).collect()
	}

	#[tokio::test]
	async fn lexical_orders_both_ways() {
		let input = ["b", "a", "c"];
		assert_eq!(values(&sorted(lexical(false), &input).await), vec!["a", "b", "c"]);
		assert_eq!(values(&sorted(lexical(true), &input).await), vec!["c", "b", "a"]);
	}

	#[tokio::test]
	async fn reversed_lexical_is_stable() {
		let out = sorted(lexical(true), &["a", "b", "a"]).await;
		let ids: Vec<_> = out.iter().map(|(id, _)| id.as_str()).collect();
		assert_eq!(ids, vec!["1", "0", "2"]);
	}

	#[tokio::test]
	async fn numerical_places_non_numbers_last() {
		let input = ["10", "x", "2", "y", "-1.5"];
		assert_eq!(
			values(&sorted(numerical(false), &input).await),
			vec!["-1.5", "2", "10", "x", "y"]
		);
		assert_eq!(
			values(&sorted(numerical(true), &input).await),
			vec!["10", "2", "-1.5", "x", "y"]
		);
	}

	#[tokio::test]
	async fn noop_keeps_order() {
		let input = ["b", "a"];
		assert_eq!(values(&sorted(noop::<Detail>(), &input).await), vec!["b", "a"]);
	}

	#[tokio::test]
	async fn sorting_by_detail_field() {
		let mut items = vec![
			Item::new(0u64, "a", Detail::new().with("size", 30)),
			Item::new(1u64, "b", Detail::new().with("size", 5)),
		];
		numerical_by(false, |item: &Item| item.detail.get_u64("size").map(|n| n as f64))
			.sort(&Context::detached(), &mut items, &CancellationToken::new())
			.await
			.unwrap();
		assert_eq!(items[0].value, "b");
	}
}
