use std::io;
use std::path::Path;

use frz_pipeline::stream::from_receiver;
use frz_pipeline::{CancellationToken, CollectParams, Detail, Error, Item, Result, SharedSource, define_source};
use futures::stream::{self, StreamExt, TryStreamExt};
use ignore::WalkBuilder;
use regex::Regex;
use tokio::sync::mpsc;

use crate::location::{PATH, SIZE};
use crate::paths::display;

const CHANNEL_CAPACITY: usize = 1_024;

/// Walker settings for [`file`].
#[derive(Debug, Clone)]
pub struct FileOptions {
	/// Keep only paths matching at least one of these, when non-empty.
	pub includes: Vec<Regex>,
	/// Drop paths matching any of these.
	pub excludes: Vec<Regex>,
	pub hidden: bool,
	pub follow_symlinks: bool,
	pub respect_ignore_files: bool,
	pub max_depth: Option<usize>,
}

impl Default for FileOptions {
	fn default() -> Self {
		Self {
			includes: Vec::new(),
			excludes: Vec::new(),
			hidden: true,
			follow_symlinks: true,
			respect_ignore_files: false,
			max_depth: None,
		}
	}
}

impl FileOptions {
	fn accepts(&self, path: &str) -> bool {
		if !self.includes.is_empty() && !self.includes.iter().any(|p| p.is_match(path)) {
			return false;
		}
		!self.excludes.iter().any(|p| p.is_match(path))
	}

	fn walker(&self, root: &Path) -> WalkBuilder {
		let mut walker = WalkBuilder::new(root);
		walker
			.hidden(!self.hidden)
			.follow_links(self.follow_symlinks)
			.git_ignore(self.respect_ignore_files)
			.git_global(self.respect_ignore_files)
			.git_exclude(self.respect_ignore_files)
			.ignore(self.respect_ignore_files)
			.parents(self.respect_ignore_files)
			.max_depth(self.max_depth)
			.sort_by_file_name(|a, b| a.cmp(b));
		walker
	}
}

/// Recursively list files under `args[0]` (default `.`).
///
/// The root is expanded and resolved against the host working directory.
/// Each item's value and `path` detail hold the absolute path; `size` holds
/// the file length in bytes. Entries that vanish, are unreadable or form
/// symlink loops are skipped.
pub fn file(options: FileOptions) -> SharedSource<Detail> {
	define_source(move |ctx, params: CollectParams, token| {
		let ctx = ctx.clone();
		let options = options.clone();
		let token = token.clone();
		stream::once(async move {
			let arg = params.args.first().map_or(".", String::as_str);
			let root = ctx.resolve_path(&ctx.host().expand(arg))?;
			tracing::debug!(root = %root.display(), "walking files");

			let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
			tokio::task::spawn_blocking(move || walk(&root, &options, &tx, &token));
			Ok::<_, Error>(from_receiver(rx))
		})
		.try_flatten()
		.boxed()
	})
}

fn walk(root: &Path, options: &FileOptions, tx: &mpsc::Sender<Result<Item>>, token: &CancellationToken) {
	let mut id = 0u64;
	for entry in options.walker(root).build() {
		if token.is_cancelled() {
			return;
		}
		let entry = match entry {
			Ok(entry) => entry,
			Err(err) if is_benign(&err) => {
				tracing::trace!(error = %err, "skipping unreadable entry");
				continue;
			}
			Err(err) => {
				let _ = tx.blocking_send(Err(Error::Io(io::Error::other(err))));
				return;
			}
		};
		if !entry.file_type().is_some_and(|kind| kind.is_file()) {
			continue;
		}
		let path = display(entry.path());
		if !options.accepts(&path) {
			continue;
		}
		let mut detail = Detail::new().with(PATH, path.clone());
		if let Ok(metadata) = entry.metadata() {
			detail.insert(SIZE, metadata.len());
		}
		if tx.blocking_send(Ok(Item::new(id, path, detail))).is_err() {
			return;
		}
		id += 1;
	}
}

fn is_benign(err: &ignore::Error) -> bool {
	match err.io_error() {
		Some(io) => matches!(
			io.kind(),
			io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
		),
		// Symlink loops and malformed ignore files.
		None => true,
	}
}
