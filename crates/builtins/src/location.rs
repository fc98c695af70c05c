//! Well-known detail fields shared by the file and grep stages.

use frz_pipeline::Detail;

pub const PATH: &str = "path";
pub const ABSPATH: &str = "abspath";
pub const LINE: &str = "line";
pub const COLUMN: &str = "column";
pub const CONTEXT: &str = "context";
pub const BUFNR: &str = "bufnr";
pub const BUFNAME: &str = "bufname";
pub const SIZE: &str = "size";
/// Modification time in seconds since the Unix epoch.
pub const MODIFIED: &str = "modified";
/// `file`, `dir`, `link` or `other`.
pub const KIND: &str = "kind";
/// Permission bits.
pub const MODE: &str = "mode";

/// Position an item points at, read from its detail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
	pub path: Option<String>,
	pub bufname: Option<String>,
	pub bufnr: Option<u64>,
	pub line: Option<usize>,
	pub column: Option<usize>,
}

impl Location {
	pub fn of(detail: &Detail) -> Self {
		let index = |key: &str| detail.get_u64(key).and_then(|n| usize::try_from(n).ok());
		Self {
			path: detail.get_str(PATH).map(str::to_string),
			bufname: detail.get_str(BUFNAME).map(str::to_string),
			bufnr: detail.get_u64(BUFNR),
			line: index(LINE),
			column: index(COLUMN),
		}
	}

	/// The file path when present, otherwise the buffer name.
	#[must_use]
	pub fn target(&self) -> Option<&str> {
		self.path.as_deref().or(self.bufname.as_deref())
	}
}
