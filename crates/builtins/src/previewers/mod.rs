//! Item previewers.

mod shell;

use std::path::Path;

use frz_pipeline::stream::ensure_active;
use frz_pipeline::{CancellationToken, Context, Detail, Item, Payload, PreviewItem, SharedPreviewer, define_previewer};

use crate::location::Location;

pub use shell::{
	ARGS, COMMAND, CWD, EMPTY_NOTICE, ENV, FAILURE_NOTICE, STDERR_MARKER, ShellOptions, TIMEOUT, shell,
};

pub const BINARY_NOTICE: &str = "No preview for binary file is available.";

/// Preview the file named by the `path` detail.
///
/// Relative paths resolve against the host working directory. Binary content
/// and read failures produce a diagnostic preview instead of an error.
pub fn file() -> SharedPreviewer<Detail> {
	define_previewer(|ctx: Context, item: Item<Detail>, token: CancellationToken| async move {
		let location = Location::of(&item.detail);
		let Some(path) = location.path else {
			return Ok(None);
		};
		let expanded = ctx.host().expand(&path);
		let abspath = ctx.resolve_path(&expanded)?;
		let data = tokio::fs::read(&abspath).await;
		ensure_active(&token)?;

		let content = match data {
			Ok(bytes) => match String::from_utf8(bytes) {
				Ok(text) => text,
				Err(_) => return Ok(Some(PreviewItem::new(vec![BINARY_NOTICE.to_string()]))),
			},
			Err(err) => {
				tracing::trace!(path = %abspath.display(), error = %err, "file preview failed");
				return Ok(Some(PreviewItem::from_text(&err.to_string())));
			}
		};

		let mut preview = PreviewItem::from_text(&content);
		if let Some(name) = abspath.file_name() {
			preview = preview.with_filename(name.to_string_lossy());
		}
		if let Some(line) = location.line {
			preview = preview.with_line(line);
		}
		if let Some(column) = location.column {
			preview = preview.with_column(column);
		}
		Ok(Some(preview))
	})
}

/// Preview the host buffer named by the `bufnr` detail. Buffers the host
/// does not have loaded yield no preview.
pub fn buffer() -> SharedPreviewer<Detail> {
	define_previewer(|ctx: Context, item: Item<Detail>, token: CancellationToken| async move {
		let location = Location::of(&item.detail);
		let Some(bufnr) = location.bufnr else {
			return Ok(None);
		};
		let Some(info) = ctx.host().buffer_info(&bufnr.to_string()).await? else {
			return Ok(None);
		};
		ensure_active(&token)?;
		let content = ctx
			.host()
			.buffer_lines(info.bufnr, 1, info.line_count + 1)
			.await?;
		ensure_active(&token)?;

		let mut preview = PreviewItem::new(content);
		if let Some(name) = Path::new(&info.name).file_name() {
			preview = preview.with_filename(name.to_string_lossy());
		}
		if let Some(line) = location.line {
			preview = preview.with_line(line);
		}
		if let Some(column) = location.column {
			preview = preview.with_column(column);
		}
		Ok(Some(preview))
	})
}

/// Previewer that never produces a preview.
pub fn noop<D: Payload + Clone>() -> SharedPreviewer<D> {
	define_previewer(|_, _: Item<D>, _| async { Ok(None) })
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::sync::Arc;

	use anyhow::Result as AnyResult;
	use async_trait::async_trait;
	use frz_pipeline::{BufferInfo, Host, Previewer};
	use tempfile::tempdir;

	use super::*;
	use crate::host::LocalHost;
	use crate::location::{BUFNR, LINE, PATH};

	async fn preview(previewer: &SharedPreviewer, ctx: &Context, detail: Detail) -> Option<PreviewItem> {
		previewer
			.preview(ctx, &Item::new(0u64, "x", detail), &CancellationToken::new())
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn reads_text_files_relative_to_cwd() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join("notes.txt"), "one\ntwo\n").unwrap();
		let ctx = Context::new(LocalHost::new().with_cwd(dir.path()));

		let shown = preview(&file(), &ctx, Detail::new().with(PATH, "notes.txt").with(LINE, 2))
			.await
			.unwrap();
		assert_eq!(shown.content, vec!["one", "two"]);
		assert_eq!(shown.filename.as_deref(), Some("notes.txt"));
		assert_eq!(shown.line, Some(2));
	}

	#[tokio::test]
	async fn binary_files_get_a_notice() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("blob.bin");
		fs::write(&path, [0xff, 0xfe, 0x00, 0x81]).unwrap();
		let shown = preview(
			&file(),
			&Context::detached(),
			Detail::new().with(PATH, path.to_string_lossy().into_owned()),
		)
		.await
		.unwrap();
		assert_eq!(shown.content, vec![BINARY_NOTICE]);
	}

	#[tokio::test]
	async fn missing_files_become_diagnostics() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("gone.txt");
		let shown = preview(
			&file(),
			&Context::detached(),
			Detail::new().with(PATH, path.to_string_lossy().into_owned()),
		)
		.await
		.unwrap();
		assert_eq!(shown.content.len(), 1);
		assert!(shown.filename.is_none());
	}

	#[tokio::test]
	async fn items_without_paths_fall_through() {
		assert!(preview(&file(), &Context::detached(), Detail::new()).await.is_none());
	}

	struct OneBuffer;

	#[async_trait]
	impl Host for OneBuffer {
		async fn buffer_info(&self, expr: &str) -> AnyResult<Option<BufferInfo>> {
			Ok((expr == "3").then(|| BufferInfo {
				bufnr: 3,
				name: "/tmp/scratch.md".into(),
				line_count: 2,
			}))
		}

		async fn buffer_lines(&self, _bufnr: u64, start: usize, end: usize) -> AnyResult<Vec<String>> {
			Ok((start..end).map(|n| format!("line {n}")).collect())
		}
	}

	#[tokio::test]
	async fn buffers_come_from_the_host() {
		let ctx = Context::from_shared(Arc::new(OneBuffer));
		let shown = preview(&buffer(), &ctx, Detail::new().with(BUFNR, 3)).await.unwrap();
		assert_eq!(shown.content, vec!["line 1", "line 2"]);
		assert_eq!(shown.filename.as_deref(), Some("scratch.md"));
		assert!(preview(&buffer(), &ctx, Detail::new().with(BUFNR, 4)).await.is_none());
	}

	#[tokio::test]
	async fn noop_previews_nothing() {
		assert!(preview(&noop(), &Context::detached(), Detail::new()).await.is_none());
	}
}
