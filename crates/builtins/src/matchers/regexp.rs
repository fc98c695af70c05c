use frz_pipeline::stream::{failed, from_items};
use frz_pipeline::{Error, MatchParams, Payload, SharedMatcher, define_matcher};
use regex::Regex;

use super::decorate_all;

/// Treat the trimmed query as a regular expression and decorate every match.
///
/// An invalid expression fails the evaluation with [`Error::Pattern`].
pub fn regexp<D: Payload>() -> SharedMatcher<D> {
	define_matcher(|_, params: MatchParams<D>, _| {
		let MatchParams { items, query } = params;
		let source = query.trim();
		if source.is_empty() {
			return from_items(items);
		}
		let pattern = match Regex::new(source) {
			Ok(pattern) => pattern,
			Err(err) => return failed(Error::pattern(source, err)),
		};
		let kept: Vec<_> = items
			.into_iter()
			.filter(|item| pattern.is_match(&item.value))
			.map(|mut item| {
				item.decorations.extend(decorate_all(&item.value, &pattern));
				item
			})
			.collect();
		from_items(kept)
	})
}
