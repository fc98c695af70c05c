use std::path::{Path, PathBuf};

use frz_pipeline::{Detail, DisplayItem, SharedRenderer, define_renderer};

use crate::location::PATH;
use crate::paths::display;

/// Show the `path` detail as an absolute path, joining relative ones onto
/// `base` or the host working directory.
pub fn absolute_path(base: Option<PathBuf>) -> SharedRenderer<Detail> {
	define_renderer(move |ctx, items: &mut [DisplayItem<Detail>]| {
		let base = match &base {
			Some(base) => base.clone(),
			None => ctx.host().cwd()?,
		};
		for item in items.iter_mut() {
			let Some(path) = item.detail().get_str(PATH).map(str::to_string) else {
				continue;
			};
			if Path::new(&path).is_absolute() {
				continue;
			}
			let absolute = display(&base.join(&path));
			item.label = item.label.replacen(&path, &absolute, 1);
		}
		Ok(())
	})
}

#[cfg(test)]
mod tests {
	use frz_pipeline::{CancellationToken, Context, Item, Renderer};

	use super::*;
	use crate::host::LocalHost;

	#[tokio::test]
	async fn joins_relative_paths_onto_the_working_directory() {
		let mut items = vec![
			DisplayItem::from(Item::new(0u64, "src/a.rs:3", Detail::new().with(PATH, "src/a.rs"))),
			DisplayItem::from(Item::new(1u64, "/etc/hosts", Detail::new().with(PATH, "/etc/hosts"))),
		];
		let ctx = Context::new(LocalHost::new().with_cwd("/work"));
		absolute_path(None)
			.render(&ctx, &mut items, &CancellationToken::new())
			.await
			.unwrap();
		assert_eq!(items[0].label, "/work/src/a.rs:3");
		assert_eq!(items[0].value(), "src/a.rs:3");
		assert_eq!(items[1].label, "/etc/hosts");
	}
}
