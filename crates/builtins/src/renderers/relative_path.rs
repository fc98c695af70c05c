use std::path::{Path, PathBuf};

use frz_pipeline::{Detail, DisplayItem, SharedRenderer, define_renderer};

use crate::location::PATH;
use crate::paths::{display, relative_to};

/// Show the `path` detail relative to `base`, or to the host working
/// directory when no base is given.
pub fn relative_path(base: Option<PathBuf>) -> SharedRenderer<Detail> {
	define_renderer(move |ctx, items: &mut [DisplayItem<Detail>]| {
		let base = match &base {
			Some(base) => base.clone(),
			None => ctx.host().cwd()?,
		};
		for item in items.iter_mut() {
			let Some(path) = item.detail().get_str(PATH).map(str::to_string) else {
				continue;
			};
			let relative = display(&relative_to(&base, Path::new(&path)));
			item.label = item.label.replacen(&path, &relative, 1);
		}
		Ok(())
	})
}
