//! Detail refiners over the `path` field.
//!
//! Filters narrow the stream without adding fields; the path refiners
//! rewrite `path` and add `abspath`; [`file_info`] adds file metadata.

mod file_info;

use std::iter;
use std::path::{Path, PathBuf};

use frz_pipeline::stream::failed;
use frz_pipeline::{Item, RefineParams, RefinerContract, SharedRefiner, define_filter, define_refiner};
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use regex::Regex;

use crate::location::{ABSPATH, PATH};
use crate::paths::{display, relative_to};

pub use file_info::{FileInfoFilter, file_info};

/// Keep items whose `path` lies under the host working directory.
pub fn cwd() -> SharedRefiner {
	define_filter("cwd", [PATH], |ctx, params: RefineParams, _| {
		let cwd = match ctx.host().cwd() {
			Ok(cwd) => display(&cwd),
			Err(err) => return failed(err.into()),
		};
		params
			.items
			.try_filter(move |item| future::ready(path_of(item).is_some_and(|path| path.starts_with(&cwd))))
			.boxed()
	})
}

/// Keep items whose `path` exists on disk.
pub fn exists() -> SharedRefiner {
	define_filter("exists", [PATH], |ctx, params: RefineParams, _| {
		let ctx = ctx.clone();
		params
			.items
			.try_filter(move |item| {
				let path = path_of(item).and_then(|path| ctx.resolve_path(Path::new(path)).ok());
				async move {
					match path {
						Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
						None => false,
					}
				}
			})
			.boxed()
	})
}

/// Keep items whose value matches at least one of `includes` (when any are
/// given) and none of `excludes`.
pub fn regexp(includes: Vec<Regex>, excludes: Vec<Regex>) -> SharedRefiner {
	define_filter("regexp", iter::empty::<&str>(), move |_, params: RefineParams, _| {
		let includes = includes.clone();
		let excludes = excludes.clone();
		params
			.items
			.try_filter(move |item| {
				let value = item.value.as_str();
				let included = includes.is_empty() || includes.iter().any(|r| r.is_match(value));
				future::ready(included && !excludes.iter().any(|r| r.is_match(value)))
			})
			.boxed()
	})
}

/// Rewrite `path` relative to the host working directory, keeping the
/// original in `abspath`. The first occurrence of the path in the value is
/// rewritten too.
pub fn relative_path() -> SharedRefiner {
	let contract = RefinerContract::new("relative_path").requires([PATH]).provides([ABSPATH]);
	define_refiner(contract, |ctx, params: RefineParams, _| {
		let cwd = match ctx.host().cwd() {
			Ok(cwd) => cwd,
			Err(err) => return failed(err.into()),
		};
		params
			.items
			.map_ok(move |item| {
				rewrite_path(item, |path| {
					let relative = display(&relative_to(&cwd, Path::new(path)));
					(relative, path.to_string())
				})
			})
			.boxed()
	})
}

/// Add `abspath`, joining relative paths onto `base` (the host working
/// directory by default). The first occurrence of the path in the value is
/// replaced with the absolute one.
pub fn absolute_path(base: Option<PathBuf>) -> SharedRefiner {
	let contract = RefinerContract::new("absolute_path").requires([PATH]).provides([ABSPATH]);
	define_refiner(contract, move |ctx, params: RefineParams, _| {
		let base = match base.clone().map_or_else(|| ctx.host().cwd(), Ok) {
			Ok(base) => base,
			Err(err) => return failed(err.into()),
		};
		params
			.items
			.map_ok(move |item| {
				rewrite_path(item, |path| {
					let absolute = if Path::new(path).is_absolute() {
						path.to_string()
					} else {
						display(&base.join(path))
					};
					(path.to_string(), absolute)
				})
			})
			.boxed()
	})
}

/// Refiner that drops every item.
pub fn noop() -> SharedRefiner {
	define_filter("noop", iter::empty::<&str>(), |_, _: RefineParams, _| stream::empty().boxed())
}

fn path_of(item: &Item) -> Option<&str> {
	item.detail.get_str(PATH)
}

/// Apply `paths` to the item's `path`, returning the new `path` and the
/// `abspath` to record. The value is rewritten to show the new `path` when
/// it changed, or the `abspath` otherwise.
fn rewrite_path(mut item: Item, paths: impl FnOnce(&str) -> (String, String)) -> Item {
	let Some(original) = path_of(&item).map(str::to_string) else {
		return item;
	};
	let (path, abspath) = paths(&original);
	let shown = if path == original { &abspath } else { &path };
	item.value = item.value.replacen(&original, shown, 1);
	item.detail.insert(PATH, path);
	item.detail.insert(ABSPATH, abspath);
	item
}

#[cfg(test)]
mod tests {
	use std::fs;

	use frz_pipeline::stream::{collect_items, from_items};
	use frz_pipeline::{CancellationToken, Context, Detail, Error, Refiner, Shape, compose_refiners};
	use tempfile::tempdir;

	use super::*;
	use crate::host::LocalHost;

	fn located(id: u64, path: &str) -> Item {
		Item::new(id, format!("{path}:1"), Detail::new().with(PATH, path))
	}

	async fn refine(refiner: &SharedRefiner, ctx: &Context, items: Vec<Item>) -> Vec<Item> {
		let params = RefineParams {
			items: from_items(items),
		};
		collect_items(refiner.refine(ctx, params, &CancellationToken::new()))
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn cwd_keeps_paths_below_the_working_directory() {
		let ctx = Context::new(LocalHost::new().with_cwd("/work"));
		let items = refine(&cwd(), &ctx, vec![located(0, "/work/a.rs"), located(1, "/elsewhere/b.rs")]).await;
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].value, "/work/a.rs:1");
	}

	#[tokio::test]
	async fn exists_drops_missing_files() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join("here.txt"), "x").unwrap();
		let ctx = Context::new(LocalHost::new().with_cwd(dir.path()));
		let items = refine(&exists(), &ctx, vec![located(0, "here.txt"), located(1, "gone.txt")]).await;
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].detail.get_str(PATH), Some("here.txt"));
	}

	#[tokio::test]
	async fn regexp_applies_includes_then_excludes() {
		let refiner = regexp(
			vec![Regex::new(r"\.rs").unwrap()],
			vec![Regex::new("test").unwrap()],
		);
		let items = refine(
			&refiner,
			&Context::detached(),
			vec![located(0, "a.rs"), located(1, "a_test.rs"), located(2, "b.md")],
		)
		.await;
		let values: Vec<_> = items.iter().map(|item| item.value.as_str()).collect();
		assert_eq!(values, vec!["a.rs:1"]);
	}

	#[tokio::test]
	async fn relative_path_keeps_the_absolute_one() {
		let ctx = Context::new(LocalHost::new().with_cwd("/work"));
		let items = refine(&relative_path(), &ctx, vec![located(0, "/work/src/a.rs")]).await;
		assert_eq!(items[0].value, "src/a.rs:1");
		assert_eq!(items[0].detail.get_str(PATH), Some("src/a.rs"));
		assert_eq!(items[0].detail.get_str(ABSPATH), Some("/work/src/a.rs"));
	}

	#[tokio::test]
	async fn absolute_path_joins_onto_the_base() {
		let refiner = absolute_path(Some(PathBuf::from("/base")));
		let items = refine(
			&refiner,
			&Context::detached(),
			vec![located(0, "src/a.rs"), located(1, "/abs/b.rs")],
		)
		.await;
		assert_eq!(items[0].value, "/base/src/a.rs:1");
		assert_eq!(items[0].detail.get_str(PATH), Some("src/a.rs"));
		assert_eq!(items[0].detail.get_str(ABSPATH), Some("/base/src/a.rs"));
		assert_eq!(items[1].detail.get_str(ABSPATH), Some("/abs/b.rs"));
	}

	#[tokio::test]
	async fn noop_drops_everything() {
		let items = refine(&noop(), &Context::detached(), vec![located(0, "a")]).await;
		assert!(items.is_empty());
	}

	#[test]
	fn path_refiners_need_a_path_upstream() {
		let Err(err) = compose_refiners(&Shape::of(["bufnr"]), [relative_path()]) else {
			panic!("chain without a path field was accepted");
		};
		assert!(matches!(err, Error::Contract { ref stage, .. } if stage == "relative_path"));

		let chain = compose_refiners(&Shape::of([PATH]), [exists(), absolute_path(None), cwd()]).unwrap();
		assert_eq!(chain.output(), &Shape::of([ABSPATH, PATH]));
	}
}
