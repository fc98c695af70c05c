use std::path::Path;
use std::sync::OnceLock;

use frz_pipeline::{Detail, DisplayItem, SharedRenderer, define_renderer};
use regex::Regex;

use crate::location::PATH;

/// Glyph shown for paths no table entry covers.
pub const DEFAULT_ICON: char = '\u{f15b}';

const PATTERNS: &[(&str, char)] = &[
	(r"(^|/)\.git/", '\u{e702}'),
	(r"(^|/)node_modules/", '\u{e718}'),
	(r"\.d\.ts$", '\u{e628}'),
	(r"\.test\.[jt]sx?$", '\u{f0668}'),
];

const BASENAMES: &[(&str, char)] = &[
	(".gitignore", '\u{e702}'),
	(".gitmodules", '\u{e702}'),
	("cargo.lock", '\u{e7a8}'),
	("cargo.toml", '\u{e7a8}'),
	("dockerfile", '\u{f308}'),
	("license", '\u{e60a}'),
	("makefile", '\u{e779}'),
	("package.json", '\u{e71e}'),
];

const EXTENSIONS: &[(&str, char)] = &[
	("c", '\u{e61e}'),
	("cpp", '\u{e61d}'),
	("css", '\u{e749}'),
	("gif", '\u{f1c5}'),
	("go", '\u{e627}'),
	("gz", '\u{f410}'),
	("h", '\u{f0fd}'),
	("html", '\u{e736}'),
	("java", '\u{e738}'),
	("jpg", '\u{f1c5}'),
	("js", '\u{e74e}'),
	("json", '\u{e60b}'),
	("lock", '\u{f023}'),
	("lua", '\u{e620}'),
	("md", '\u{e609}'),
	("png", '\u{f1c5}'),
	("py", '\u{e606}'),
	("rs", '\u{e7a8}'),
	("sh", '\u{f489}'),
	("tar", '\u{f410}'),
	("toml", '\u{e615}'),
	("ts", '\u{e628}'),
	("txt", '\u{f15c}'),
	("vim", '\u{e62b}'),
	("yaml", '\u{e615}'),
	("yml", '\u{e615}'),
	("zip", '\u{f410}'),
];

/// Prefix labels with a Nerd Font glyph chosen from the `path` detail.
///
/// Path patterns win over exact basenames, which win over extensions.
/// Decorations shift right by the byte length of the prefix.
pub fn nerdfont() -> SharedRenderer<Detail> {
	define_renderer(|_, items: &mut [DisplayItem<Detail>]| {
		for item in items.iter_mut() {
			let icon = item.detail().get_str(PATH).map_or(DEFAULT_ICON, icon_for);
			let prefix = format!("{icon}  ");
			for decoration in &mut item.decorations {
				decoration.column += prefix.len();
			}
			item.label.insert_str(0, &prefix);
		}
		Ok(())
	})
}

/// Glyph for `path`.
pub fn icon_for(path: &str) -> char {
	from_pattern(path)
		.or_else(|| from_basename(path))
		.or_else(|| from_extension(path))
		.unwrap_or(DEFAULT_ICON)
}

fn from_pattern(path: &str) -> Option<char> {
	static COMPILED: OnceLock<Vec<(Regex, char)>> = OnceLock::new();
	COMPILED
		.get_or_init(|| {
			PATTERNS
				.iter()
				.filter_map(|(pattern, icon)| Regex::new(pattern).ok().map(|regex| (regex, *icon)))
				.collect()
		})
		.iter()
		.find(|(regex, _)| regex.is_match(path))
		.map(|(_, icon)| *icon)
}

fn from_basename(path: &str) -> Option<char> {
	let name = Path::new(path).file_name()?.to_str()?.to_lowercase();
	lookup(BASENAMES, &name)
}

fn from_extension(path: &str) -> Option<char> {
	let extension = Path::new(path).extension()?.to_str()?.to_lowercase();
	lookup(EXTENSIONS, &extension)
}

fn lookup(table: &[(&str, char)], key: &str) -> Option<char> {
	table
		.binary_search_by(|(name, _)| (*name).cmp(key))
		.ok()
		.map(|index| table[index].1)
}
