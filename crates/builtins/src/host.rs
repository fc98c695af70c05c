//! Filesystem-only host for running pipelines outside an editor.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use frz_pipeline::{Host, OpenRequest};

/// Host primitive invoked on a [`LocalHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
	Open(OpenRequest),
	Execute(String),
	Prompt { message: String, default: String },
	Register { register: String, value: String },
	Echo(String),
}

/// Host backed by the process environment.
///
/// Side-effecting primitives are recorded instead of performed, and echoed
/// messages are also written to stdout when `verbose` is set. Buffer
/// primitives are unsupported. Prompts accept their default text.
#[derive(Debug, Default)]
pub struct LocalHost {
	cwd: Option<PathBuf>,
	verbose: bool,
	events: Mutex<Vec<HostEvent>>,
}

impl LocalHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Pin the working directory instead of reading the process one.
	#[must_use]
	pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
		self.cwd = Some(cwd.into());
		self
	}

	#[must_use]
	pub fn verbose(mut self, verbose: bool) -> Self {
		self.verbose = verbose;
		self
	}

	/// Primitives invoked so far, oldest first.
	pub fn events(&self) -> Vec<HostEvent> {
		self.events.lock().map(|events| events.clone()).unwrap_or_default()
	}

	fn record(&self, event: HostEvent) {
		if let Ok(mut events) = self.events.lock() {
			events.push(event);
		}
	}
}

#[async_trait]
impl Host for LocalHost {
	fn cwd(&self) -> Result<PathBuf> {
		match &self.cwd {
			Some(cwd) => Ok(cwd.clone()),
			None => Ok(std::env::current_dir()?),
		}
	}

	async fn open(&self, request: &OpenRequest) -> Result<()> {
		tracing::debug!(path = %request.path.display(), opener = ?request.opener, "open requested");
		self.record(HostEvent::Open(request.clone()));
		Ok(())
	}

	async fn execute(&self, command: &str) -> Result<()> {
		tracing::debug!(command, "execute requested");
		self.record(HostEvent::Execute(command.to_string()));
		Ok(())
	}

	async fn prompt(&self, message: &str, default: &str) -> Result<Option<String>> {
		self.record(HostEvent::Prompt {
			message: message.to_string(),
			default: default.to_string(),
		});
		Ok(Some(default.to_string()))
	}

	async fn set_register(&self, register: &str, value: &str) -> Result<()> {
		self.record(HostEvent::Register {
			register: register.to_string(),
			value: value.to_string(),
		});
		Ok(())
	}

	async fn echo(&self, message: &str) -> Result<()> {
		if self.verbose {
			println!("{message}");
		}
		self.record(HostEvent::Echo(message.to_string()));
		Ok(())
	}
}
