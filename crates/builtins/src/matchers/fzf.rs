use frizbee::{Config, match_indices, match_list};
use frz_pipeline::stream::{failed, from_items};
use frz_pipeline::{Decoration, Error, Item, MatchParams, Payload, Result, SharedMatcher, define_matcher};
use regex::{Regex, RegexBuilder};

use super::{CaseMode, runs_from_positions};

/// Options for [`fzf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FzfOptions {
	pub case: CaseMode,
	/// Order fuzzy matches by score, shorter values first on ties.
	pub sort: bool,
	/// Recognise `'exact`, `^prefix`, `suffix$` and `!negation` terms.
	pub extended: bool,
}

impl Default for FzfOptions {
	fn default() -> Self {
		Self {
			case: CaseMode::Smart,
			sort: true,
			extended: true,
		}
	}
}

/// Fuzzy matcher with fzf-style multi-term queries.
///
/// Each whitespace separated term narrows the previous result. Terms are
/// applied last to first so the leading term decides the final order.
pub fn fzf<D: Payload>(options: FzfOptions) -> SharedMatcher<D> {
	define_matcher(move |_, params: MatchParams<D>, token| {
		let MatchParams { mut items, query } = params;
		let terms: Vec<&str> = query.split_whitespace().collect();
		for raw in terms.into_iter().rev() {
			if items.is_empty() || token.is_cancelled() {
				break;
			}
			let Some(term) = Term::parse(raw, options) else {
				continue;
			};
			items = match term.apply(items, options.sort) {
				Ok(items) => items,
				Err(err) => return failed(err),
			};
		}
		from_items(items)
	})
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TermKind {
	Fuzzy,
	Exact,
	Prefix,
	Suffix,
}

#[derive(Debug)]
struct Term<'a> {
	text: &'a str,
	kind: TermKind,
	negated: bool,
	ignore_case: bool,
}

impl<'a> Term<'a> {
	fn parse(raw: &'a str, options: FzfOptions) -> Option<Self> {
		let mut text = raw;
		let mut kind = TermKind::Fuzzy;
		let mut negated = false;
		if options.extended {
			if let Some(rest) = text.strip_prefix('!') {
				negated = true;
				kind = TermKind::Exact;
				text = rest;
			}
			if let Some(rest) = text.strip_prefix('\'') {
				kind = TermKind::Exact;
				text = rest;
			} else if let Some(rest) = text.strip_prefix('^') {
				kind = TermKind::Prefix;
				text = rest;
			} else if let Some(rest) = text.strip_suffix('$') {
				kind = TermKind::Suffix;
				text = rest;
			}
		}
		if text.is_empty() {
			return None;
		}
		Some(Self {
			text,
			kind,
			negated,
			ignore_case: options.case.ignores_case(text),
		})
	}

	fn apply<D>(&self, items: Vec<Item<D>>, sort: bool) -> Result<Vec<Item<D>>> {
		match self.kind {
			TermKind::Fuzzy => Ok(self.fuzzy(items, sort)),
			_ => self.literal(items),
		}
	}

	fn fuzzy<D>(&self, items: Vec<Item<D>>, sort: bool) -> Vec<Item<D>> {
		let config = Config {
			prefilter: true,
			max_typos: Some(0),
			sort: false,
			..Config::default()
		};
		let haystacks: Vec<&str> = items.iter().map(|item| item.value.as_str()).collect();
		let mut scores: Vec<Option<u16>> = vec![None; items.len()];
		for entry in match_list(self.text, &haystacks, &config) {
			if entry.score == 0 {
				continue;
			}
			if let Some(slot) = scores.get_mut(entry.index as usize) {
				*slot = Some(entry.score);
			}
		}

		let mut matched: Vec<(u16, Item<D>)> = Vec::new();
		for (item, score) in items.into_iter().zip(scores) {
			let Some(score) = score else {
				continue;
			};
			if !self.ignore_case && !is_subsequence(self.text, &item.value) {
				continue;
			}
			let Some(found) = match_indices(self.text, &item.value, &config) else {
				continue;
			};
			let runs = runs_from_positions(&item.value, &found.indices);
			let mut item = item;
			item.decorations.extend(runs.into_iter().map(Decoration::from_byte_range));
			matched.push((score, item));
		}

		if sort {
			// Stable, so equal candidates keep their incoming order.
			matched.sort_by(|(a_score, a), (b_score, b)| {
				b_score
					.cmp(a_score)
					.then_with(|| a.value.trim().len().cmp(&b.value.trim().len()))
			});
		}
		matched.into_iter().map(|(_, item)| item).collect()
	}

	fn literal<D>(&self, items: Vec<Item<D>>) -> Result<Vec<Item<D>>> {
		let pattern = self.pattern()?;
		let mut kept = Vec::with_capacity(items.len());
		for mut item in items {
			let found = pattern.find(&item.value).map(|found| found.range());
			match (found, self.negated) {
				(Some(range), false) => {
					if !range.is_empty() {
						item.decorations.push(Decoration::from_byte_range(range));
					}
					kept.push(item);
				}
				(None, true) => kept.push(item),
				_ => {}
			}
		}
		Ok(kept)
	}

	fn pattern(&self) -> Result<Regex> {
		let escaped = regex::escape(self.text);
		let source = match self.kind {
			TermKind::Prefix => format!("^{escaped}"),
			TermKind::Suffix => format!("{escaped}$"),
			TermKind::Exact | TermKind::Fuzzy => escaped,
		};
		RegexBuilder::new(&source)
			.case_insensitive(self.ignore_case)
			.build()
			.map_err(|err| Error::pattern(self.text, err))
	}
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
	let mut remaining = haystack.chars();
	needle
		.chars()
		.all(|wanted| remaining.any(|candidate| candidate == wanted))
}
