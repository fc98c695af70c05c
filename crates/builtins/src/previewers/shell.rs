use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use frz_pipeline::stream::ensure_active;
use frz_pipeline::{CancellationToken, Context, Detail, Item, PreviewItem, SharedPreviewer, define_previewer};
use futures::future::{self, Either};
use tokio::process::Command;

/// Program to run; the item value when absent.
pub const COMMAND: &str = "command";
/// Arguments for `command`. When present the command runs directly instead
/// of through the shell.
pub const ARGS: &str = "args";
/// Working directory, resolved against the host working directory.
pub const CWD: &str = "cwd";
/// Extra environment variables.
pub const ENV: &str = "env";
/// Timeout in milliseconds.
pub const TIMEOUT: &str = "timeout";

pub const STDERR_MARKER: &str = "--- stderr ---";
pub const FAILURE_NOTICE: &str = "[Command failed with non-zero exit code]";
pub const EMPTY_NOTICE: &str = "[No output]";

#[derive(Debug, Clone)]
pub struct ShellOptions {
	/// Command prefix used to run a command string.
	pub shell: Vec<String>,
	pub default_timeout: Duration,
	pub max_lines: usize,
}

impl Default for ShellOptions {
	fn default() -> Self {
		Self {
			shell: vec!["sh".into(), "-c".into()],
			default_timeout: Duration::from_secs(5),
			max_lines: 1_000,
		}
	}
}

/// Preview the output of a command described by the item.
///
/// Stdout comes first, then stderr under a marker line. A failing exit
/// status, truncation to `max_lines` and empty output are reported in the
/// content. Spawn failures and timeouts become a diagnostic preview rather
/// than an error; only cancellation fails.
pub fn shell(options: ShellOptions) -> SharedPreviewer<Detail> {
	define_previewer(move |ctx: Context, item: Item<Detail>, token: CancellationToken| {
		let options = options.clone();
		async move {
			let invocation = Invocation::of(&item, &options, &ctx);
			let output = invocation.run(&token).await;
			ensure_active(&token)?;
			let content = match output {
				Ok(output) => render_output(&output, options.max_lines),
				Err(message) => {
					tracing::trace!(command = %invocation.command, error = %message, "shell preview failed");
					let mut content = vec![format!("Error executing command: {}", invocation.command), String::new()];
					content.extend(message.lines().map(str::to_string));
					content
				}
			};
			Ok(Some(PreviewItem::new(content).with_filename(format!("$ {}", invocation.argv.join(" ")))))
		}
	})
}

struct Invocation {
	command: String,
	argv: Vec<String>,
	cwd: Option<PathBuf>,
	env: BTreeMap<String, String>,
	timeout: Duration,
}

impl Invocation {
	fn of(item: &Item, options: &ShellOptions, ctx: &Context) -> Self {
		let detail = &item.detail;
		let command = detail.get_str(COMMAND).unwrap_or(&item.value).to_string();
		let args: Vec<String> = detail.get_as(ARGS).unwrap_or_default();
		let argv = if args.is_empty() {
			options.shell.iter().cloned().chain([command.clone()]).collect()
		} else {
			[command.clone()].into_iter().chain(args).collect()
		};
		let cwd = match detail.get_str(CWD) {
			Some(cwd) => ctx.resolve_path(&ctx.host().expand(cwd)).ok(),
			None => ctx.host().cwd().ok(),
		};
		Self {
			command,
			argv,
			cwd,
			env: detail.get_as(ENV).unwrap_or_default(),
			timeout: detail
				.get_u64(TIMEOUT)
				.map_or(options.default_timeout, Duration::from_millis),
		}
	}

	async fn run(&self, token: &CancellationToken) -> Result<Output, String> {
		let (program, args) = self.argv.split_first().ok_or("empty command line")?;
		let mut command = Command::new(program);
		command
			.args(args)
			.envs(&self.env)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);
		if let Some(cwd) = &self.cwd {
			command.current_dir(cwd);
		}
		let child = command.spawn().map_err(|err| err.to_string())?;

		let finished = Box::pin(tokio::time::timeout(self.timeout, child.wait_with_output()));
		match future::select(finished, Box::pin(token.cancelled())).await {
			Either::Left((Ok(output), _)) => output.map_err(|err| err.to_string()),
			Either::Left((Err(_), _)) => Err(format!("timed out after {} ms", self.timeout.as_millis())),
			Either::Right(_) => Err("cancelled".to_string()),
		}
	}
}

fn render_output(output: &Output, max_lines: usize) -> Vec<String> {
	let stdout = PreviewItem::from_text(&String::from_utf8_lossy(&output.stdout)).content;
	let stderr = PreviewItem::from_text(&String::from_utf8_lossy(&output.stderr)).content;

	let mut content = stdout;
	if !stderr.is_empty() {
		if !content.is_empty() {
			content.push(STDERR_MARKER.to_string());
		}
		content.extend(stderr);
	}
	if !output.status.success() {
		content.push(String::new());
		content.push(FAILURE_NOTICE.to_string());
	}
	if content.len() > max_lines {
		content.truncate(max_lines);
		content.push(String::new());
		content.push(format!("[Output truncated to {max_lines} lines]"));
	}
	if content.is_empty() {
		content.push(EMPTY_NOTICE.to_string());
	}
	content
}
