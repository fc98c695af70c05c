//! Items flowing through the pipeline and their presentation wrappers.

use std::fmt;
use std::ops::Range;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::detail::Detail;

/// Bounds every detail payload must satisfy to cross stage boundaries.
pub trait Payload: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Payload for T {}

/// Identity of an item within one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
	Index(u64),
	Key(String),
}

impl From<u64> for ItemId {
	fn from(value: u64) -> Self {
		Self::Index(value)
	}
}

impl From<usize> for ItemId {
	fn from(value: usize) -> Self {
		Self::Index(value as u64)
	}
}

impl From<&str> for ItemId {
	fn from(value: &str) -> Self {
		Self::Key(value.to_string())
	}
}

impl From<String> for ItemId {
	fn from(value: String) -> Self {
		Self::Key(value)
	}
}

impl fmt::Display for ItemId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Index(index) => write!(f, "{index}"),
			Self::Key(key) => f.write_str(key),
		}
	}
}

/// Highlighted span over an item's label.
///
/// `column` is a 1-based byte offset and `length` a byte count, so spans stay
/// correct over multi-byte text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
	pub column: usize,
	pub length: usize,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub highlight: Option<String>,
}

impl Decoration {
	pub fn new(column: usize, length: usize) -> Self {
		Self {
			column,
			length,
			highlight: None,
		}
	}

	/// Build a decoration covering a 0-based byte range.
	pub fn from_byte_range(range: Range<usize>) -> Self {
		Self::new(range.start + 1, range.end.saturating_sub(range.start))
	}

	#[must_use]
	pub fn with_highlight(mut self, highlight: impl Into<String>) -> Self {
		self.highlight = Some(highlight.into());
		self
	}

	/// The 0-based byte range this decoration covers.
	#[must_use]
	pub fn byte_range(&self) -> Range<usize> {
		let start = self.column.saturating_sub(1);
		start..start + self.length
	}
}

/// Candidate record produced by a source or curator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item<D = Detail> {
	pub id: ItemId,
	pub value: String,
	pub detail: D,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub decorations: Vec<Decoration>,
}

impl<D> Item<D> {
	pub fn new(id: impl Into<ItemId>, value: impl Into<String>, detail: D) -> Self {
		Self {
			id: id.into(),
			value: value.into(),
			detail,
			decorations: Vec::new(),
		}
	}

	#[must_use]
	pub fn with_decorations(mut self, decorations: Vec<Decoration>) -> Self {
		self.decorations = decorations;
		self
	}

	/// Replace the payload, keeping identity and decorations.
	pub fn map_detail<U>(self, f: impl FnOnce(D) -> U) -> Item<U> {
		Item {
			id: self.id,
			value: self.value,
			detail: f(self.detail),
			decorations: self.decorations,
		}
	}
}

impl Item<Detail> {
	/// Item with an empty payload.
	pub fn plain(id: impl Into<ItemId>, value: impl Into<String>) -> Self {
		Self::new(id, value, Detail::default())
	}
}

/// Item as seen by renderers: identity and payload are read-only while the
/// label and decorations may be rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem<D = Detail> {
	item: Item<D>,
	pub label: String,
	pub decorations: Vec<Decoration>,
}

impl<D> DisplayItem<D> {
	#[must_use]
	pub fn id(&self) -> &ItemId {
		&self.item.id
	}

	#[must_use]
	pub fn value(&self) -> &str {
		&self.item.value
	}

	#[must_use]
	pub fn detail(&self) -> &D {
		&self.item.detail
	}

	/// The underlying item, including the decorations the matchers produced.
	#[must_use]
	pub fn item(&self) -> &Item<D> {
		&self.item
	}

	pub fn into_item(self) -> Item<D> {
		self.item
	}
}

impl<D: Serialize> Serialize for DisplayItem<D> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut state = serializer.serialize_struct("DisplayItem", 5)?;
		state.serialize_field("id", &self.item.id)?;
		state.serialize_field("value", &self.item.value)?;
		state.serialize_field("label", &self.label)?;
		state.serialize_field("decorations", &self.decorations)?;
		state.serialize_field("detail", &self.item.detail)?;
		state.end()
	}
}

impl<D> From<Item<D>> for DisplayItem<D> {
	fn from(item: Item<D>) -> Self {
		Self {
			label: item.value.clone(),
			decorations: item.decorations.clone(),
			item,
		}
	}
}

/// Preview payload for a single item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewItem {
	pub content: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub line: Option<usize>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub column: Option<usize>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub filename: Option<String>,
}

impl PreviewItem {
	pub fn new(content: Vec<String>) -> Self {
		Self {
			content,
			..Self::default()
		}
	}

	/// Split text into preview lines on `\n`, `\r\n` and `\r`.
	pub fn from_text(text: &str) -> Self {
		Self::new(split_lines(text))
	}

	#[must_use]
	pub fn with_line(mut self, line: usize) -> Self {
		self.line = Some(line);
		self
	}

	#[must_use]
	pub fn with_column(mut self, column: usize) -> Self {
		self.column = Some(column);
		self
	}

	#[must_use]
	pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
		self.filename = Some(filename.into());
		self
	}
}

fn split_lines(text: &str) -> Vec<String> {
	let mut lines: Vec<String> = text
		.split('\n')
		.flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
		.map(str::to_string)
		.collect();
	// A terminating newline does not open another line.
	if lines.last().is_some_and(String::is_empty) {
		lines.pop();
	}
	lines
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decoration_ranges_are_one_based_bytes() {
		let decoration = Decoration::from_byte_range(3..7);
		assert_eq!(decoration.column, 4);
		assert_eq!(decoration.length, 4);
		assert_eq!(decoration.byte_range(), 3..7);
	}

	#[test]
	fn display_item_label_defaults_to_value() {
		let item = Item::plain(0u64, "src/main.rs").with_decorations(vec![Decoration::new(1, 3)]);
		let mut display = DisplayItem::from(item);
		assert_eq!(display.label, "src/main.rs");
		display.label = "main.rs src".into();
		display.decorations.clear();
		assert_eq!(display.value(), "src/main.rs");
		assert_eq!(display.item().decorations.len(), 1);
	}

	#[test]
	fn preview_text_splits_all_newline_styles() {
		let preview = PreviewItem::from_text("a\r\nb\rc\nd");
		assert_eq!(preview.content, vec!["a", "b", "c", "d"]);

		assert_eq!(PreviewItem::from_text("one\ntwo\n").content, vec!["one", "two"]);
		assert_eq!(PreviewItem::from_text("one\r\n\n").content, vec!["one", ""]);
		assert!(PreviewItem::from_text("").content.is_empty());
	}

	#[test]
	fn item_ids_serialize_untagged() {
		assert_eq!(serde_json::to_string(&ItemId::from(3u64)).unwrap(), "3");
		assert_eq!(serde_json::to_string(&ItemId::from("k")).unwrap(), "\"k\"");
	}
}
