use std::ops::Range;
use std::path::MAIN_SEPARATOR;

use frz_pipeline::{Decoration, DisplayItem, Payload, SharedRenderer, define_renderer};

/// Highlight group applied to the directory part.
pub const DIRECTORY_HIGHLIGHT: &str = "Comment";

/// Rewrite `dir/name` labels as `name dir`, dimming the directory.
///
/// Existing decorations move with the text they covered.
pub fn smart_path<D: Payload>() -> SharedRenderer<D> {
	smart_path_with_separator(MAIN_SEPARATOR)
}

pub fn smart_path_with_separator<D: Payload>(separator: char) -> SharedRenderer<D> {
	define_renderer(move |_, items: &mut [DisplayItem<D>]| {
		for item in items.iter_mut() {
			rewrite(item, separator);
		}
		Ok(())
	})
}

fn rewrite<D>(item: &mut DisplayItem<D>, separator: char) {
	let Some(split) = item.label.rfind(separator) else {
		return;
	};
	let dirname = item.label[..split].to_string();
	let filename = item.label[split + separator.len_utf8()..].to_string();
	let name_start = split + separator.len_utf8();

	let project = |range: Range<usize>| -> Vec<Range<usize>> {
		let mut projected = Vec::new();
		let dir_part = range.start..range.end.min(split);
		if !dir_part.is_empty() {
			let offset = filename.len() + 1;
			projected.push(dir_part.start + offset..dir_part.end + offset);
		}
		let name_part = range.start.max(name_start)..range.end;
		if !name_part.is_empty() {
			projected.push(name_part.start - name_start..name_part.end - name_start);
		}
		projected
	};

	let mut decorations: Vec<Decoration> = Vec::with_capacity(item.decorations.len() + 1);
	for decoration in &item.decorations {
		for range in project(decoration.byte_range()) {
			let mut moved = Decoration::from_byte_range(range);
			moved.highlight = decoration.highlight.clone();
			decorations.push(moved);
		}
	}
	decorations.push(
		Decoration::new(filename.len() + 1, dirname.len() + 1).with_highlight(DIRECTORY_HIGHLIGHT),
	);

	item.label = format!("{filename} {dirname}");
	item.decorations = decorations;
}
