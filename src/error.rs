use std::io;

use thiserror::Error;

/// Errors surfaced by pipeline stages and their composition operators.
#[derive(Debug, Error)]
pub enum Error {
	/// The cancellation token fired before the operation committed.
	#[error("operation cancelled")]
	Cancelled,

	/// Unexpected I/O fault while producing or previewing items.
	#[error(transparent)]
	Io(#[from] io::Error),

	/// A host primitive reported a failure.
	#[error(transparent)]
	Host(#[from] anyhow::Error),

	/// An external process could not be spawned or exited abnormally.
	#[error("`{command}` failed: {message}")]
	Process { command: String, message: String },

	/// A user supplied pattern did not compile.
	#[error("invalid pattern '{pattern}': {message}")]
	Pattern { pattern: String, message: String },

	/// A detail-transform stage requires fields its upstream does not provide.
	#[error(
		"stage '{stage}' requires fields [{}] that '{upstream}' does not provide",
		.missing.join(", ")
	)]
	Contract {
		stage: String,
		upstream: String,
		missing: Vec<String>,
	},

	/// A stage was invoked outside the composition it depends on.
	#[error("'{stage}' requires {requirement} but was invoked without it")]
	MissingContext {
		stage: &'static str,
		requirement: &'static str,
	},

	/// The picker was asked to invoke an action it does not hold.
	#[error("action '{0}' is not registered")]
	UnknownAction(String),
}

impl Error {
	pub fn process(command: impl Into<String>, message: impl ToString) -> Self {
		Self::Process {
			command: command.into(),
			message: message.to_string(),
		}
	}

	pub fn pattern(pattern: impl Into<String>, message: impl ToString) -> Self {
		Self::Pattern {
			pattern: pattern.into(),
			message: message.to_string(),
		}
	}

	/// Whether this error only reports cancellation.
	#[must_use]
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
