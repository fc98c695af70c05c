use std::ops::Range;

use frz_pipeline::{Decoration, Detail, DisplayItem, SharedRenderer, define_renderer};
use unicode_width::UnicodeWidthStr;

use crate::location::{CONTEXT, Location};

const GAP: &str = "  ";

/// Options for [`smart_grep`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartGrepOptions {
	/// Longest matched text shown before it is cut with `...`, in characters.
	pub max_text_length: usize,
	pub show_line_numbers: bool,
	/// Pad paths and numbers so columns line up across the list.
	pub align_columns: bool,
}

impl Default for SmartGrepOptions {
	fn default() -> Self {
		Self {
			max_text_length: 80,
			show_line_numbers: true,
			align_columns: true,
		}
	}
}

/// Lay out grep hits as aligned `path  line:column  text` columns.
///
/// Decorations over the path or the matched text are carried into the new
/// label; those over the line numbers are dropped.
pub fn smart_grep(options: SmartGrepOptions) -> SharedRenderer<Detail> {
	define_renderer(move |_, items: &mut [DisplayItem<Detail>]| {
		let widths = if options.align_columns {
			Widths::measure(items)
		} else {
			Widths::default()
		};
		for item in items.iter_mut() {
			layout(item, &options, &widths);
		}
		Ok(())
	})
}

#[derive(Debug, Default)]
struct Widths {
	path: usize,
	line: usize,
	column: usize,
}

impl Widths {
	fn measure(items: &[DisplayItem<Detail>]) -> Self {
		let mut widths = Self::default();
		for item in items {
			let location = Location::of(item.detail());
			if let Some(path) = &location.path {
				widths.path = widths.path.max(path.width());
			}
			if let Some(line) = location.line {
				widths.line = widths.line.max(line.to_string().len());
			}
			if let Some(column) = location.column {
				widths.column = widths.column.max(column.to_string().len());
			}
		}
		widths
	}
}

fn layout(item: &mut DisplayItem<Detail>, options: &SmartGrepOptions, widths: &Widths) {
	let location = Location::of(item.detail());
	let Some(path) = location.path.clone() else {
		return;
	};
	let text = item
		.detail()
		.get_str(CONTEXT)
		.or_else(|| item.detail().get_str("text"))
		.map(str::to_string);

	let mut label = path.clone();
	label.push_str(&" ".repeat(widths.path.saturating_sub(path.width())));

	if options.show_line_numbers
		&& let Some(line) = location.line
	{
		label.push_str(GAP);
		label.push_str(&format!("{line:>width$}", width = widths.line));
		if let Some(column) = location.column {
			label.push_str(&format!(":{column:>width$}", width = widths.column));
		}
	}

	let mut decorations: Vec<Decoration> = item
		.decorations
		.iter()
		.filter(|decoration| decoration.byte_range().end <= path.len())
		.cloned()
		.collect();

	if let Some(text) = text.filter(|text| !text.trim().is_empty()) {
		label.push_str(GAP);
		let text_column = label.len();
		let (shown, kept) = shorten(&text, options.max_text_length);
		label.push_str(&shown);

		if let Some(source_start) = item.value().len().checked_sub(text.len())
			&& item.value().ends_with(text.as_str())
		{
			for decoration in &item.decorations {
				if let Some(range) = remap(decoration.byte_range(), source_start, &kept, text_column) {
					let mut moved = Decoration::from_byte_range(range);
					moved.highlight = decoration.highlight.clone();
					decorations.push(moved);
				}
			}
		}
	}

	item.label = label;
	item.decorations = decorations;
}

/// Trim and cut `text`, returning the shown string and the byte range of the
/// original text it keeps verbatim.
fn shorten(text: &str, max_chars: usize) -> (String, Range<usize>) {
	let leading = text.len() - text.trim_start().len();
	let trimmed = text.trim();
	if trimmed.chars().count() <= max_chars {
		return (trimmed.to_string(), leading..leading + trimmed.len());
	}
	let keep = max_chars.saturating_sub(3);
	let cut = trimmed
		.char_indices()
		.nth(keep)
		.map_or(trimmed.len(), |(index, _)| index);
	(format!("{}...", &trimmed[..cut]), leading..leading + cut)
}

fn remap(range: Range<usize>, source_start: usize, kept: &Range<usize>, text_column: usize) -> Option<Range<usize>> {
	let start = range.start.checked_sub(source_start)?;
	let end = range.end - source_start;
	let start = start.max(kept.start);
	let end = end.min(kept.end);
	(start < end).then(|| start - kept.start + text_column..end - kept.start + text_column)
}
