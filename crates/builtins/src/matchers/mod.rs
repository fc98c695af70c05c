//! Query matchers.

mod fzf;
mod regexp;
mod substring;

use std::ops::Range;

use frz_pipeline::stream::from_items;
use frz_pipeline::{Decoration, MatchParams, Payload, SharedMatcher, define_matcher};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use fzf::{FzfOptions, fzf};
pub use regexp::regexp;
pub use substring::substring;

/// Case sensitivity of a matcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseMode {
	/// Ignore case unless the query contains an uppercase character.
	#[default]
	Smart,
	Ignore,
	Respect,
}

impl CaseMode {
	/// Whether matching `query` should ignore case.
	#[must_use]
	pub fn ignores_case(self, query: &str) -> bool {
		match self {
			Self::Smart => !query.chars().any(char::is_uppercase),
			Self::Ignore => true,
			Self::Respect => false,
		}
	}
}

/// Matcher that yields nothing.
pub fn noop<D: Payload>() -> SharedMatcher<D> {
	define_matcher(|_, _: MatchParams<D>, _| from_items(Vec::new()))
}

/// Decorations covering every match of `pattern` in `value`.
pub(crate) fn decorate_all(value: &str, pattern: &Regex) -> Vec<Decoration> {
	pattern
		.find_iter(value)
		.filter(|found| !found.is_empty())
		.map(|found| Decoration::from_byte_range(found.range()))
		.collect()
}

/// Merge sorted, possibly unaligned byte positions into whole-character runs.
pub(crate) fn runs_from_positions(value: &str, positions: &[usize]) -> Vec<Range<usize>> {
	let mut sorted: Vec<usize> = positions
		.iter()
		.copied()
		.filter(|&index| index < value.len() && value.is_char_boundary(index))
		.collect();
	sorted.sort_unstable();
	sorted.dedup();

	let mut runs: Vec<Range<usize>> = Vec::new();
	for start in sorted {
		let width = value[start..].chars().next().map_or(1, char::len_utf8);
		match runs.last_mut() {
			Some(last) if last.end == start => last.end = start + width,
			_ => runs.push(start..start + width),
		}
	}
	runs
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn smart_case_respects_uppercase_queries() {
		assert!(CaseMode::Smart.ignores_case("foo"));
		assert!(!CaseMode::Smart.ignores_case("Foo"));
		assert!(CaseMode::Ignore.ignores_case("Foo"));
		assert!(!CaseMode::Respect.ignores_case("foo"));
	}

	#[test]
	fn positions_merge_into_character_runs() {
		let value = "résumé";
		// 'r' at 0, 'é' at 1..3, 's' at 3
		assert_eq!(runs_from_positions(value, &[3, 0, 1, 2]), vec![0..4]);
		assert_eq!(runs_from_positions(value, &[0, 4]), vec![0..1, 4..5]);
	}

	#[test]
	fn decorations_skip_empty_matches() {
		let pattern = Regex::new("o*").unwrap();
		let decorations = decorate_all("foo", &pattern);
		assert_eq!(decorations, vec![Decoration::new(2, 2)]);
	}
}
