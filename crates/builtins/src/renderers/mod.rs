//! Label renderers.

mod absolute_path;
mod file_info;
mod nerdfont;
mod relative_path;
mod smart_grep;
mod smart_path;

use frz_pipeline::{DisplayItem, Payload, SharedRenderer, define_renderer};

pub use absolute_path::absolute_path;
pub use file_info::{
	DIRECTORY_INFO_HIGHLIGHT, EXECUTABLE_INFO_HIGHLIGHT, FILE_INFO_HIGHLIGHT, FileInfoField, FileInfoOptions,
	FileInfoWidths, SYMLINK_INFO_HIGHLIGHT, file_info, format_bytes, permissions, relative_age,
};
pub use nerdfont::{DEFAULT_ICON, icon_for, nerdfont};
pub use relative_path::relative_path;
pub use smart_grep::{SmartGrepOptions, smart_grep};
pub use smart_path::{DIRECTORY_HIGHLIGHT, smart_path, smart_path_with_separator};

/// Renderer that leaves labels untouched.
pub fn noop<D: Payload>() -> SharedRenderer<D> {
	define_renderer(|_, _: &mut [DisplayItem<D>]| Ok(()))
}
