use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, OnceLock};

use frz_pipeline::{
	CancellationToken, Context, CurateParams, Detail, Error, Item, Result, SharedCurator, define_curator,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader, Split};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::OnceCell;

use crate::location::{COLUMN, CONTEXT, LINE, PATH};
use crate::paths::display;

/// External search program driven by [`grep`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrepTool {
	#[default]
	Grep,
	#[serde(rename = "rg")]
	Ripgrep,
	GitGrep,
}

impl GrepTool {
	fn program(self) -> &'static str {
		match self {
			Self::Grep => "grep",
			Self::Ripgrep => "rg",
			Self::GitGrep => "git",
		}
	}

	fn command(self, query: &str, root: &Path) -> Command {
		let mut command = Command::new(self.program());
		match self {
			Self::Grep => {
				command
					.args(["--color=never", "--no-messages", "--recursive", "--line-number", "-e"])
					.arg(query)
					.arg("--")
					.arg(root);
			}
			Self::Ripgrep => {
				command
					.args([
						"--color=never",
						"--no-heading",
						"--no-messages",
						"--with-filename",
						"--line-number",
						"--column",
						"--regexp",
					])
					.arg(query)
					.arg("--")
					.arg(root);
			}
			Self::GitGrep => {
				command
					.args(["grep", "--color=never", "--no-heading", "--line-number", "--column", "-e"])
					.arg(query)
					.current_dir(root);
			}
		}
		command
	}

	/// Whether output lines carry a column after the line number.
	fn reports_columns(self) -> bool {
		!matches!(self, Self::Grep)
	}

	fn parse(self, record: &str, root: &Path) -> Option<Hit> {
		let captures = self.pattern()?.captures(record)?;
		let mut path = captures.get(1)?.as_str().to_string();
		let line = captures.get(2)?.as_str().parse().ok()?;
		let (column, context) = if self.reports_columns() {
			(Some(captures.get(3)?.as_str().parse().ok()?), captures.get(4)?.as_str())
		} else {
			(None, captures.get(3)?.as_str())
		};
		if matches!(self, Self::GitGrep) {
			path = display(&root.join(&path));
		}
		Some(Hit {
			path,
			line,
			column,
			context: context.to_string(),
		})
	}

	fn pattern(self) -> Option<&'static Regex> {
		static PLAIN: OnceLock<Option<Regex>> = OnceLock::new();
		static COLUMNS: OnceLock<Option<Regex>> = OnceLock::new();
		if self.reports_columns() {
			COLUMNS
				.get_or_init(|| Regex::new(r"^(.*?):(\d+):(\d+):(.*)$").ok())
				.as_ref()
		} else {
			PLAIN.get_or_init(|| Regex::new(r"^(.*?):(\d+):(.*)$").ok()).as_ref()
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Hit {
	path: String,
	line: u64,
	column: Option<u64>,
	context: String,
}

impl Hit {
	fn into_item(self, id: u64) -> Item {
		let (value, mut detail) = match self.column {
			Some(column) => (
				format!("{}:{}:{}:{}", self.path, self.line, column, self.context),
				Detail::new().with(COLUMN, column),
			),
			None => (
				format!("{}:{}:{}", self.path, self.line, self.context),
				Detail::new(),
			),
		};
		detail.insert(PATH, self.path);
		detail.insert(LINE, self.line);
		detail.insert(CONTEXT, self.context);
		Item::new(id, value, detail)
	}
}

/// Search `args[0]` (default `.`) for the live query with an external tool.
///
/// The root is resolved on first use and reused for the lifetime of the
/// curator. A blank query yields nothing. The process is killed when the
/// stream is dropped.
pub fn grep(tool: GrepTool) -> SharedCurator<Detail> {
	let root = Arc::new(OnceCell::new());
	define_curator(move |ctx, params: CurateParams, token| {
		if params.query.trim().is_empty() {
			return stream::empty().boxed();
		}
		let ctx = ctx.clone();
		let root = Arc::clone(&root);
		let token = token.clone();
		stream::once(async move {
			let root = resolve_root(&root, &ctx, params.args.first().map_or(".", String::as_str)).await?;
			let search = Search::spawn(tool, &params.query, root)?;
			Ok::<_, Error>(
				stream::try_unfold(search, move |search| next_hit(search, token.clone()))
					.boxed(),
			)
		})
		.try_flatten()
		.boxed()
	})
}

async fn resolve_root(cell: &OnceCell<PathBuf>, ctx: &Context, arg: &str) -> Result<PathBuf> {
	let root = cell
		.get_or_try_init(|| async {
			let root = ctx.resolve_path(&ctx.host().expand(arg))?;
			tracing::debug!(root = %root.display(), "resolved grep root");
			Ok::<_, Error>(root)
		})
		.await?;
	Ok(root.clone())
}

struct Search {
	tool: GrepTool,
	root: PathBuf,
	child: Child,
	records: Split<BufReader<ChildStdout>>,
	produced: u64,
}

impl Search {
	fn spawn(tool: GrepTool, query: &str, root: PathBuf) -> Result<Self> {
		let mut child = tool
			.command(query, &root)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::null())
			.kill_on_drop(true)
			.spawn()
			.map_err(|err| Error::process(tool.program(), err))?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| Error::process(tool.program(), "stdout was not captured"))?;
		tracing::debug!(tool = tool.program(), query = %query, root = %root.display(), "spawned search");
		Ok(Self {
			tool,
			root,
			child,
			records: BufReader::new(stdout).split(b'\n'),
			produced: 0,
		})
	}

	fn finish(&self, status: ExitStatus) -> Result<()> {
		match status.code() {
			Some(0 | 1) => Ok(()),
			_ if self.produced > 0 => {
				tracing::debug!(tool = self.tool.program(), %status, "search exited abnormally after output");
				Ok(())
			}
			_ => Err(Error::process(self.tool.program(), format!("exited with {status}"))),
		}
	}
}

async fn next_hit(mut search: Search, token: CancellationToken) -> Result<Option<(Item, Search)>> {
	loop {
		if token.is_cancelled() {
			return Ok(None);
		}
		let Some(bytes) = search.records.next_segment().await? else {
			let status = search.child.wait().await?;
			search.finish(status)?;
			return Ok(None);
		};
		let record = decode_record(&bytes);
		let Some(hit) = search.tool.parse(&record, &search.root) else {
			tracing::trace!(record = %record, "skipping unparsable search output");
			continue;
		};
		let item = hit.into_item(search.produced);
		search.produced += 1;
		return Ok(Some((item, search)));
	}
}

/// Decode one output record, replacing invalid UTF-8 and dropping a CR
/// left by CRLF input.
fn decode_record(bytes: &[u8]) -> String {
	let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
	String::from_utf8_lossy(bytes).into_owned()
}
