use frz_pipeline::stream::{failed, from_items};
use frz_pipeline::{Error, MatchParams, Payload, SharedMatcher, define_matcher};
use regex::RegexBuilder;

use super::{CaseMode, decorate_all};

/// Keep items containing every whitespace separated term, decorating each
/// occurrence of any term.
pub fn substring<D: Payload>(case: CaseMode) -> SharedMatcher<D> {
	define_matcher(move |_, params: MatchParams<D>, _| {
		let MatchParams { items, query } = params;
		let terms: Vec<&str> = query.split_whitespace().collect();
		if terms.is_empty() {
			return from_items(items);
		}
		let ignore_case = case.ignores_case(&query);
		let alternation = terms
			.iter()
			.map(|term| regex::escape(term))
			.collect::<Vec<_>>()
			.join("|");
		let pattern = match RegexBuilder::new(&alternation)
			.case_insensitive(ignore_case)
			.build()
		{
			Ok(pattern) => pattern,
			Err(err) => return failed(Error::pattern(query.trim(), err)),
		};
		let fold = |text: &str| {
			if ignore_case {
				text.to_lowercase()
			} else {
				text.to_string()
			}
		};
		let needles: Vec<String> = terms.iter().map(|term| fold(*term)).collect();

		let kept: Vec<_> = items
			.into_iter()
			.filter_map(|mut item| {
				let haystack = fold(&item.value);
				if !needles.iter().all(|needle| haystack.contains(needle.as_str())) {
					return None;
				}
				item.decorations.extend(decorate_all(&item.value, &pattern));
				Some(item)
			})
			.collect();
		from_items(kept)
	})
}
