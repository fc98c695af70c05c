use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use frz_pipeline::{Decoration, Detail, DisplayItem, SharedRenderer, define_renderer};

use crate::location::PATH;
use crate::stat::{FileKind, FileStat};

/// Metadata columns [`file_info`] can append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileInfoField {
	Size,
	Modified,
	Permissions,
	Kind,
}

impl FileInfoField {
	fn width(self, widths: &FileInfoWidths) -> usize {
		match self {
			Self::Size => widths.size,
			Self::Modified => widths.modified,
			Self::Permissions => widths.permissions,
			Self::Kind => widths.kind,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfoWidths {
	pub size: usize,
	pub modified: usize,
	pub permissions: usize,
	pub kind: usize,
}

impl Default for FileInfoWidths {
	fn default() -> Self {
		Self {
			size: 8,
			modified: 16,
			permissions: 10,
			kind: 4,
		}
	}
}

#[derive(Debug, Clone)]
pub struct FileInfoOptions {
	pub fields: Vec<FileInfoField>,
	/// Show `2h ago` instead of a local `YYYY-MM-DD HH:MM` timestamp.
	pub relative_time: bool,
	pub widths: FileInfoWidths,
	/// Decorate the appended columns with a highlight chosen by file kind.
	pub highlight: bool,
}

impl Default for FileInfoOptions {
	fn default() -> Self {
		Self {
			fields: vec![FileInfoField::Size, FileInfoField::Modified],
			relative_time: true,
			widths: FileInfoWidths::default(),
			highlight: false,
		}
	}
}

pub const DIRECTORY_INFO_HIGHLIGHT: &str = "Directory";
pub const SYMLINK_INFO_HIGHLIGHT: &str = "Constant";
pub const EXECUTABLE_INFO_HIGHLIGHT: &str = "Special";
pub const FILE_INFO_HIGHLIGHT: &str = "Comment";

/// Append file metadata columns to each label.
///
/// Metadata already recorded on the detail by the `file_info` refiner is
/// used as is; otherwise the `path` detail is inspected, resolved against the
/// host working directory. Paths that cannot be inspected get `-`
/// placeholders.
pub fn file_info(options: FileInfoOptions) -> SharedRenderer<Detail> {
	define_renderer(move |ctx, items: &mut [DisplayItem<Detail>]| {
		let now = SystemTime::now();
		for item in items.iter_mut() {
			let stat = FileStat::from_detail(item.detail()).or_else(|| {
				let path = item.detail().get_str(PATH)?;
				let abspath = ctx.resolve_path(&ctx.host().expand(path)).ok()?;
				FileStat::read_blocking(&abspath).ok()
			});
			let info = match &stat {
				Some(stat) => columns(stat, &options, now),
				None => placeholder(&options),
			};
			let start = item.label.len() + 2;
			item.label.push_str("  ");
			item.label.push_str(&info);
			if let Some(stat) = stat.as_ref().filter(|_| options.highlight) {
				item.decorations
					.push(Decoration::from_byte_range(start..start + info.len()).with_highlight(highlight_for(stat)));
			}
		}
		Ok(())
	})
}

fn columns(stat: &FileStat, options: &FileInfoOptions, now: SystemTime) -> String {
	options
		.fields
		.iter()
		.map(|field| {
			let width = field.width(&options.widths);
			match field {
				FileInfoField::Size => format!("{:>width$}", size_column(stat)),
				FileInfoField::Modified => {
					let shown = match (stat.modified, options.relative_time) {
						(Some(_), true) => stat.age(now).map_or_else(|| "-".to_string(), relative_age),
						(Some(secs), false) => local_timestamp(secs),
						(None, _) => "-".to_string(),
					};
					format!("{shown:<width$}")
				}
				FileInfoField::Permissions => format!("{:<width$}", permissions(stat.mode)),
				FileInfoField::Kind => format!("{:<width$}", stat.kind.as_str()),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

fn placeholder(options: &FileInfoOptions) -> String {
	options
		.fields
		.iter()
		.map(|field| format!("{:<width$}", "-", width = field.width(&options.widths)))
		.collect::<Vec<_>>()
		.join(" ")
}

fn highlight_for(stat: &FileStat) -> &'static str {
	match stat.kind {
		FileKind::Directory => DIRECTORY_INFO_HIGHLIGHT,
		FileKind::Symlink => SYMLINK_INFO_HIGHLIGHT,
		_ if stat.is_executable() => EXECUTABLE_INFO_HIGHLIGHT,
		_ => FILE_INFO_HIGHLIGHT,
	}
}

fn size_column(stat: &FileStat) -> String {
	match stat.kind {
		FileKind::File => format_bytes(stat.size),
		FileKind::Directory => "-".to_string(),
		_ => "0B".to_string(),
	}
}

/// `1.5KB` style sizes in powers of 1024.
pub fn format_bytes(bytes: u64) -> String {
	const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
	if bytes == 0 {
		return "0B".to_string();
	}
	let mut value = bytes as f64;
	let mut unit = 0;
	while value >= 1024.0 && unit < UNITS.len() - 1 {
		value /= 1024.0;
		unit += 1;
	}
	format!("{value:.1}{}", UNITS[unit])
}

/// Coarsest whole unit of `age`: `3y ago`, `2mo ago`, `5d ago`, `4h ago`,
/// `10m ago` or `just now`.
pub fn relative_age(age: Duration) -> String {
	let minutes = age.as_secs() / 60;
	let hours = minutes / 60;
	let days = hours / 24;
	let (months, years) = (days / 30, days / 365);
	if years > 0 {
		format!("{years}y ago")
	} else if months > 0 {
		format!("{months}mo ago")
	} else if days > 0 {
		format!("{days}d ago")
	} else if hours > 0 {
		format!("{hours}h ago")
	} else if minutes > 0 {
		format!("{minutes}m ago")
	} else {
		"just now".to_string()
	}
}

fn local_timestamp(secs: u64) -> String {
	let time: DateTime<Local> = (UNIX_EPOCH + Duration::from_secs(secs)).into();
	time.format("%Y-%m-%d %H:%M").to_string()
}

/// `rwxr-x---` style permission bits.
pub fn permissions(mode: u32) -> String {
	const TRIPLETS: [&str; 8] = ["---", "--x", "-w-", "-wx", "r--", "r-x", "rw-", "rwx"];
	[6, 3, 0]
		.iter()
		.map(|shift| TRIPLETS[((mode >> shift) & 7) as usize])
		.collect()
}
