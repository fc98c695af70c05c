use std::path::Path;
use std::time::{Duration, SystemTime};

use frz_pipeline::{Context, Error, Item, RefineParams, RefinerContract, SharedRefiner, define_refiner};
use futures::stream::{StreamExt, TryStreamExt};
use regex::Regex;

use crate::location::{KIND, MODE, PATH, SIZE};
use crate::stat::{FileKind, FileStat};

/// Criteria applied by [`file_info`].
#[derive(Debug, Clone)]
pub struct FileInfoFilter {
	/// Accepted extensions, compared case-insensitively with or without the
	/// leading dot. Empty accepts any.
	pub extensions: Vec<String>,
	/// Size bounds in bytes, applied to regular files only.
	pub min_size: Option<u64>,
	pub max_size: Option<u64>,
	/// Drop entries last modified longer ago than this.
	pub modified_within: Option<Duration>,
	pub include_files: bool,
	pub include_directories: bool,
	pub include_symlinks: bool,
	/// Drop paths with any dot-prefixed component.
	pub exclude_hidden: bool,
	/// Drop paths matching any of these.
	pub excludes: Vec<Regex>,
}

impl Default for FileInfoFilter {
	fn default() -> Self {
		Self {
			extensions: Vec::new(),
			min_size: None,
			max_size: None,
			modified_within: None,
			include_files: true,
			include_directories: true,
			include_symlinks: true,
			exclude_hidden: false,
			excludes: Vec::new(),
		}
	}
}

impl FileInfoFilter {
	/// Checks that need only the path string.
	fn accepts_path(&self, path: &str) -> bool {
		if self.exclude_hidden && is_hidden(path) {
			return false;
		}
		if self.excludes.iter().any(|pattern| pattern.is_match(path)) {
			return false;
		}
		if self.extensions.is_empty() {
			return true;
		}
		let Some(extension) = Path::new(path).extension().and_then(|ext| ext.to_str()) else {
			return false;
		};
		self.extensions
			.iter()
			.any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(extension))
	}

	fn accepts_stat(&self, stat: &FileStat, now: SystemTime) -> bool {
		let kind_included = match stat.kind {
			FileKind::File => self.include_files,
			FileKind::Directory => self.include_directories,
			FileKind::Symlink => self.include_symlinks,
			FileKind::Other => true,
		};
		if !kind_included {
			return false;
		}
		if stat.kind == FileKind::File {
			if self.min_size.is_some_and(|min| stat.size < min) {
				return false;
			}
			if self.max_size.is_some_and(|max| stat.size > max) {
				return false;
			}
		}
		match (self.modified_within, stat.age(now)) {
			(Some(window), Some(age)) => age <= window,
			_ => true,
		}
	}
}

fn is_hidden(path: &str) -> bool {
	path.split(['/', '\\'])
		.any(|part| part.starts_with('.') && part != "." && part != "..")
}

/// Stat each item's `path`, drop those failing `filter`, and record the
/// metadata in `kind`, `size`, `mode` and (when known) `modified`.
///
/// Relative paths resolve against the host working directory. Items whose
/// path cannot be inspected are dropped.
pub fn file_info(filter: FileInfoFilter) -> SharedRefiner {
	let contract = RefinerContract::new("file_info")
		.requires([PATH])
		.provides([KIND, SIZE, MODE]);
	define_refiner(contract, move |ctx, params: RefineParams, _| {
		let ctx = ctx.clone();
		let filter = filter.clone();
		params
			.items
			.try_filter_map(move |item| {
				let ctx = ctx.clone();
				let filter = filter.clone();
				async move { Ok::<_, Error>(inspect(item, &ctx, &filter).await) }
			})
			.boxed()
	})
}

async fn inspect(mut item: Item, ctx: &Context, filter: &FileInfoFilter) -> Option<Item> {
	let path = item.detail.get_str(PATH)?.to_string();
	if !filter.accepts_path(&path) {
		return None;
	}
	let abspath = ctx.resolve_path(&ctx.host().expand(&path)).ok()?;
	let stat = match FileStat::read(&abspath).await {
		Ok(stat) => stat,
		Err(err) => {
			tracing::trace!(path = %abspath.display(), error = %err, "dropping item without metadata");
			return None;
		}
	};
	if !filter.accepts_stat(&stat, SystemTime::now()) {
		return None;
	}
	stat.write_to(&mut item.detail);
	Some(item)
}

#[cfg(test)]
mod tests {
	use std::fs;

	use frz_pipeline::stream::{collect_items, from_items};
	use frz_pipeline::{CancellationToken, Detail, Refiner, Shape, compose_refiners};
	use tempfile::tempdir;

	use super::*;
	use crate::host::LocalHost;
	use crate::location::MODIFIED;

	fn fixture() -> tempfile::TempDir {
		let dir = tempdir().unwrap();
		fs::create_dir(dir.path().join("src")).unwrap();
		fs::create_dir(dir.path().join(".cache")).unwrap();
		fs::write(dir.path().join("src/lib.rs"), "pub fn a() {}\n").unwrap();
		fs::write(dir.path().join("README.MD"), "# readme\n").unwrap();
		fs::write(dir.path().join(".cache/blob.rs"), "x").unwrap();
		dir
	}

	fn items(paths: &[&str]) -> Vec<Item> {
		paths
			.iter()
			.enumerate()
			.map(|(id, path)| Item::new(id, *path, Detail::new().with(PATH, *path)))
			.collect()
	}

	async fn refine(filter: FileInfoFilter, dir: &Path, paths: &[&str]) -> Vec<Item> {
		let ctx = Context::new(LocalHost::new().with_cwd(dir));
		let params = RefineParams {
			items: from_items(items(paths)),
		};
		collect_items(file_info(filter).refine(&ctx, params, &CancellationToken::new()))
			.await
			.unwrap()
	}

	fn values(items: &[Item]) -> Vec<&str> {
		items.iter().map(|item| item.value.as_str()).collect()
	}

	#[tokio::test]
	async fn records_metadata_and_drops_missing_paths() {
		let dir = fixture();
		let refined = refine(FileInfoFilter::default(), dir.path(), &["src/lib.rs", "src", "gone.rs"]).await;
		assert_eq!(values(&refined), vec!["src/lib.rs", "src"]);
		assert_eq!(refined[0].detail.get_str(KIND), Some("file"));
		assert_eq!(refined[0].detail.get_u64(SIZE), Some(14));
		assert!(refined[0].detail.contains(MODE));
		assert!(refined[0].detail.contains(MODIFIED));
		assert_eq!(refined[1].detail.get_str(KIND), Some("dir"));
	}

	#[tokio::test]
	async fn path_criteria_apply_before_stat() {
		let dir = fixture();
		let filter = FileInfoFilter {
			extensions: vec![".rs".into(), "md".into()],
			exclude_hidden: true,
			excludes: vec![Regex::new("^src/").unwrap()],
			..FileInfoFilter::default()
		};
		let refined = refine(filter, dir.path(), &["src/lib.rs", "README.MD", ".cache/blob.rs", "./src"]).await;
		assert_eq!(values(&refined), vec!["README.MD"]);
	}

	#[tokio::test]
	async fn kinds_and_sizes_narrow_the_stream() {
		let dir = fixture();
		let filter = FileInfoFilter {
			include_directories: false,
			min_size: Some(10),
			..FileInfoFilter::default()
		};
		let refined = refine(filter, dir.path(), &["src", "src/lib.rs", "README.MD"]).await;
		assert_eq!(values(&refined), vec!["src/lib.rs"]);

		let filter = FileInfoFilter {
			include_files: false,
			..FileInfoFilter::default()
		};
		let refined = refine(filter, dir.path(), &["src", "src/lib.rs"]).await;
		assert_eq!(values(&refined), vec!["src"]);
	}

	#[test]
	fn modification_window_compares_ages() {
		let filter = FileInfoFilter {
			modified_within: Some(Duration::from_secs(3_600)),
			..FileInfoFilter::default()
		};
		let now = SystemTime::UNIX_EPOCH + Duration::from_secs(10_000);
		let stat = |modified| FileStat {
			kind: FileKind::File,
			size: 1,
			modified: Some(modified),
			mode: 0o644,
		};
		assert!(filter.accepts_stat(&stat(9_000), now));
		assert!(!filter.accepts_stat(&stat(1_000), now));
	}

	#[test]
	fn hidden_components_exclude_dot_segments() {
		assert!(is_hidden("a/.git/config"));
		assert!(!is_hidden("./a/../b"));
	}

	#[test]
	fn provides_metadata_fields() {
		let chain = compose_refiners(&Shape::of([PATH]), [file_info(FileInfoFilter::default())]).unwrap();
		assert_eq!(chain.output(), &Shape::of([KIND, MODE, PATH, SIZE]));
	}
}
