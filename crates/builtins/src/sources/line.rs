use frz_pipeline::{CollectParams, Context, Detail, Error, Item, SharedSource, define_source};
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::location::{BUFNAME, BUFNR, CONTEXT, LINE};

pub const DEFAULT_CHUNK_SIZE: usize = 1_000;

/// Lines of the host buffer named by `args[0]` (default `%`), read from the
/// host `chunk_size` lines at a time.
///
/// A buffer the host does not know yields nothing.
pub fn line(chunk_size: usize) -> SharedSource<Detail> {
	let chunk_size = chunk_size.max(1);
	define_source(move |ctx, params: CollectParams, _| {
		let expr = params.args.first().cloned().unwrap_or_else(|| "%".to_string());
		let state = Chunks {
			ctx: ctx.clone(),
			expr,
			chunk_size,
			next_line: 1,
			info: None,
			done: false,
		};
		stream::try_unfold(state, read_chunk)
			.map_ok(|chunk| stream::iter(chunk.into_iter().map(Ok::<_, Error>)))
			.try_flatten()
			.boxed()
	})
}

struct Chunks {
	ctx: Context,
	expr: String,
	chunk_size: usize,
	next_line: usize,
	info: Option<frz_pipeline::BufferInfo>,
	done: bool,
}

async fn read_chunk(mut state: Chunks) -> Result<Option<(Vec<Item>, Chunks)>, Error> {
	if state.done {
		return Ok(None);
	}
	let info = match state.info.clone() {
		Some(info) => info,
		None => match state.ctx.host().buffer_info(&state.expr).await? {
			Some(info) => {
				tracing::debug!(bufnr = info.bufnr, lines = info.line_count, "reading buffer lines");
				state.info = Some(info.clone());
				info
			}
			None => return Ok(None),
		},
	};
	if state.next_line > info.line_count {
		return Ok(None);
	}
	let start = state.next_line;
	let end = (start + state.chunk_size).min(info.line_count + 1);
	let lines = state.ctx.host().buffer_lines(info.bufnr, start, end).await?;
	if lines.is_empty() {
		state.done = true;
	}
	let items = lines
		.into_iter()
		.enumerate()
		.map(|(offset, value)| {
			let line = start + offset;
			let detail = Detail::new()
				.with(BUFNR, info.bufnr)
				.with(BUFNAME, info.name.clone())
				.with(LINE, line)
				.with(CONTEXT, value.clone());
			Item::new(line - 1, value, detail)
		})
		.collect();
	state.next_line = end;
	Ok(Some((items, state)))
}
