//! Request-scoped host access shared by every stage operation.
//!
//! Stages never talk to the embedding application directly. They receive a
//! [`Context`] as the first parameter of each operation and call the
//! primitives of the [`Host`] it wraps. Hosts implement only what they can
//! support; the remaining primitives report themselves as unsupported.

use std::env;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

/// Metadata about a host buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferInfo {
	pub bufnr: u64,
	pub name: String,
	pub line_count: usize,
}

/// Request to open a location in the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenRequest {
	pub path: PathBuf,
	/// Host command used to open the target, for example `edit` or `tabedit`.
	pub opener: Option<String>,
	pub line: Option<usize>,
	pub column: Option<usize>,
}

impl OpenRequest {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_opener(mut self, opener: impl Into<String>) -> Self {
		self.opener = Some(opener.into());
		self
	}

	#[must_use]
	pub fn at(mut self, line: Option<usize>, column: Option<usize>) -> Self {
		self.line = line;
		self.column = column;
		self
	}
}

/// Primitive operations the embedding application exposes to stages.
#[async_trait]
pub trait Host: Send + Sync {
	/// Current working directory of the host.
	fn cwd(&self) -> Result<PathBuf> {
		Ok(env::current_dir()?)
	}

	/// Expand a user supplied path, resolving a leading `~`.
	fn expand(&self, path: &str) -> PathBuf {
		expand_home(path)
	}

	async fn buffer_info(&self, _expr: &str) -> Result<Option<BufferInfo>> {
		Err(unsupported("buffer_info"))
	}

	/// Read lines `start..end` (1-based, end exclusive) of a buffer.
	async fn buffer_lines(&self, _bufnr: u64, _start: usize, _end: usize) -> Result<Vec<String>> {
		Err(unsupported("buffer_lines"))
	}

	async fn open(&self, _request: &OpenRequest) -> Result<()> {
		Err(unsupported("open"))
	}

	/// Run a host command line.
	async fn execute(&self, _command: &str) -> Result<()> {
		Err(unsupported("execute"))
	}

	/// Ask the user for text. `None` means the prompt was dismissed.
	async fn prompt(&self, _message: &str, _default: &str) -> Result<Option<String>> {
		Err(unsupported("prompt"))
	}

	async fn set_register(&self, _register: &str, _value: &str) -> Result<()> {
		Err(unsupported("set_register"))
	}

	async fn echo(&self, _message: &str) -> Result<()> {
		Err(unsupported("echo"))
	}
}

fn unsupported(primitive: &str) -> anyhow::Error {
	anyhow!("'{primitive}' is not supported by this host")
}

/// Resolve a leading `~` against the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
	let rest = match path.strip_prefix('~') {
		Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => rest,
		_ => return PathBuf::from(path),
	};
	match dirs::home_dir() {
		Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
		None => PathBuf::from(path),
	}
}

/// Host that only offers the process environment.
struct DetachedHost;

impl Host for DetachedHost {}

/// Handle passed unmodified to every stage operation.
#[derive(Clone)]
pub struct Context {
	host: Arc<dyn Host>,
}

impl Context {
	pub fn new(host: impl Host + 'static) -> Self {
		Self {
			host: Arc::new(host),
		}
	}

	pub fn from_shared(host: Arc<dyn Host>) -> Self {
		Self { host }
	}

	/// Context without an embedding application.
	pub fn detached() -> Self {
		Self::new(DetachedHost)
	}

	#[must_use]
	pub fn host(&self) -> &dyn Host {
		self.host.as_ref()
	}

	/// Resolve `path` against the host working directory when relative.
	///
	/// `.` components are dropped from the result; `..` is kept as is.
	pub fn resolve_path(&self, path: &Path) -> Result<PathBuf> {
		let joined = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.host.cwd()?.join(path)
		};
		Ok(joined
			.components()
			.filter(|component| !matches!(component, Component::CurDir))
			.collect())
	}
}

impl std::fmt::Debug for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Context").finish_non_exhaustive()
	}
}
