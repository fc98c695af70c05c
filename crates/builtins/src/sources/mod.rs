//! Item sources.

mod file;
mod git_status;
mod line;

use frz_pipeline::stream::from_items;
use frz_pipeline::{CollectParams, Item, Payload, SharedSource, define_source};

pub use file::{FileOptions, file};
pub use git_status::{GitStatusOptions, STAGED, STATUS, STATUS_DESCRIPTION, UNSTAGED, git_status};
pub use line::{DEFAULT_CHUNK_SIZE, line};

/// Source yielding a fixed list of items on every collection.
pub fn list<D: Payload + Clone>(items: Vec<Item<D>>) -> SharedSource<D> {
	define_source(move |_, _: CollectParams, _| from_items(items.clone()))
}

/// Source yielding nothing.
pub fn noop<D: Payload>() -> SharedSource<D> {
	define_source(|_, _: CollectParams, _| from_items(Vec::new()))
}
