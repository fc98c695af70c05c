use std::io;
use std::path::Path;
use std::sync::Arc;

use frz_pipeline::stream::ensure_active;
use frz_pipeline::{
	ActionOutcome, Context, Detail, InvokeParams, Item, Payload, Result, SharedAction, define_action,
};
use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::paths::display;

/// Placeholder replaced by the item value in a command template.
pub const PLACEHOLDER: &str = "{}";

/// Characters a host command line treats specially inside file names.
const FNAME_SPECIAL: &str = " \t\n*?[{`$\\%#'\"|!<";

/// Reads the value substituted into the command template. `None` skips the
/// item.
pub type AttrGetter<D> = Arc<dyn Fn(&Item<D>) -> Option<String> + Send + Sync>;

/// Kind of target a value must name before the command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Restriction {
	File,
	Directory,
	/// Directories pass through; files are replaced by their parent.
	DirectoryOrParent,
	/// A buffer the host has loaded.
	Buffer,
}

/// Settings for [`cmd`].
pub struct CmdOptions<D = Detail> {
	pub attr: AttrGetter<D>,
	/// Run without letting the user edit the command first.
	pub immediate: bool,
	pub template: String,
	pub restriction: Option<Restriction>,
	pub fnameescape: bool,
	pub shellescape: bool,
}

impl<D: Payload> Default for CmdOptions<D> {
	fn default() -> Self {
		Self {
			attr: Arc::new(|item: &Item<D>| Some(item.value.clone())),
			immediate: false,
			template: PLACEHOLDER.to_string(),
			restriction: None,
			fnameescape: false,
			shellescape: false,
		}
	}
}

/// Run a host command for every target item.
///
/// Each value is checked against the restriction, escaped and substituted
/// into the template. Unless `immediate` is set the command is offered to
/// the user through a prompt first, and a dismissed prompt skips the item.
/// A failing item is logged and does not stop the rest.
pub fn cmd<D: Payload + Clone>(options: CmdOptions<D>) -> SharedAction<D> {
	let options = Arc::new(options);
	define_action(move |ctx: Context, params: InvokeParams<D>, token| {
		let options = Arc::clone(&options);
		async move {
			for item in params.targets() {
				ensure_active(&token)?;
				let Some(value) = (options.attr)(item) else {
					continue;
				};
				let value = match options.restriction {
					Some(restriction) => match restrict(&ctx, &value, restriction).await {
						Ok(Some(value)) => value,
						Ok(None) => continue,
						Err(err) => {
							tracing::warn!(value = %value, error = %err, "failed to check command target");
							continue;
						}
					},
					None => value,
				};
				let value = options.escape(value);
				let command = options.template.replace(PLACEHOLDER, &value);
				if let Err(err) = run(&ctx, &command, options.immediate).await {
					tracing::warn!(command = %command, error = %err, "failed to execute command");
				}
			}
			Ok(ActionOutcome::Done)
		}
	})
}

impl<D> CmdOptions<D> {
	fn escape(&self, mut value: String) -> String {
		if self.fnameescape {
			value = fnameescape(&value);
		}
		if self.shellescape {
			value = shellescape(&value);
		}
		value
	}
}

async fn restrict(ctx: &Context, value: &str, restriction: Restriction) -> Result<Option<String>> {
	if restriction == Restriction::Buffer {
		return Ok(ctx.host().buffer_info(value).await?.map(|_| value.to_string()));
	}
	let path = ctx.resolve_path(Path::new(value))?;
	let metadata = match tokio::fs::metadata(&path).await {
		Ok(metadata) => metadata,
		Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
		Err(err) => return Err(err.into()),
	};
	let kept = match restriction {
		Restriction::File => metadata.is_file().then(|| value.to_string()),
		Restriction::Directory => metadata.is_dir().then(|| value.to_string()),
		Restriction::DirectoryOrParent if metadata.is_dir() => Some(value.to_string()),
		Restriction::DirectoryOrParent => Some(parent_of(value)),
		Restriction::Buffer => None,
	};
	Ok(kept)
}

fn parent_of(value: &str) -> String {
	match Path::new(value).parent() {
		Some(parent) if !parent.as_os_str().is_empty() => display(parent),
		_ => ".".to_string(),
	}
}

async fn run(ctx: &Context, command: &str, immediate: bool) -> Result<()> {
	let command = if immediate {
		command.to_string()
	} else {
		match ctx.host().prompt(":", command).await? {
			Some(edited) => edited,
			None => return Ok(()),
		}
	};
	ctx.host().execute(&command).await?;
	Ok(())
}

/// Escape `value` for use as a file name on a host command line.
pub fn fnameescape(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());
	if value.starts_with(['+', '>']) || value == "-" {
		escaped.push('\\');
	}
	for ch in value.chars() {
		if FNAME_SPECIAL.contains(ch) {
			escaped.push('\\');
		}
		escaped.push(ch);
	}
	escaped
}

/// Quote `value` as a single POSIX shell word.
pub fn shellescape(value: &str) -> String {
	format!("'{}'", value.replace('\'', r"'\''"))
}

fn cd_options(command: &str) -> CmdOptions<Detail> {
	CmdOptions {
		attr: Arc::new(|item: &Item<Detail>| Location::of(&item.detail).target().map(str::to_string)),
		immediate: true,
		template: format!("{command} {PLACEHOLDER}"),
		restriction: Some(Restriction::DirectoryOrParent),
		fnameescape: true,
		shellescape: false,
	}
}

/// Change the global working directory to the item, or its parent.
pub fn cd() -> SharedAction<Detail> {
	cmd(cd_options("cd"))
}

/// Window-local variant of [`cd`].
pub fn lcd() -> SharedAction<Detail> {
	cmd(cd_options("lcd"))
}

/// Tab-local variant of [`cd`].
pub fn tcd() -> SharedAction<Detail> {
	cmd(cd_options("tcd"))
}

pub fn default_cd_actions() -> Vec<(&'static str, SharedAction<Detail>)> {
	vec![("cd", cd()), ("lcd", lcd()), ("tcd", tcd())]
}

#[cfg(test)]
mod tests {
	use std::fs;

	use frz_pipeline::{Action, CancellationToken};
	use tempfile::tempdir;

	use super::*;
	use crate::host::{HostEvent, LocalHost};
	use crate::location::PATH;

	#[test]
	fn escapes_file_names() {
		assert_eq!(fnameescape("my file#1.txt"), r"my\ file\#1.txt");
		assert_eq!(fnameescape("+x"), r"\+x");
		assert_eq!(fnameescape("-"), r"\-");
		assert_eq!(shellescape("it's"), r"'it'\''s'");
	}

	#[tokio::test]
	async fn prompted_commands_use_the_template() {
		let host = Arc::new(LocalHost::new());
		let ctx = Context::from_shared(host.clone());
		let action = cmd::<Detail>(CmdOptions {
			template: "echo {} {}".to_string(),
			..CmdOptions::default()
		});
		action
			.invoke(&ctx, &InvokeParams::focused(Item::plain(0u64, "x")), &CancellationToken::new())
			.await
			.unwrap();
		assert_eq!(
			host.events(),
			vec![
				HostEvent::Prompt {
					message: ":".into(),
					default: "echo x x".into(),
				},
				HostEvent::Execute("echo x x".into()),
			]
		);
	}

	#[tokio::test]
	async fn cd_moves_to_directories_or_parents() {
		let dir = tempdir().unwrap();
		fs::create_dir(dir.path().join("sub")).unwrap();
		fs::write(dir.path().join("sub/file.txt"), "x").unwrap();
		let host = Arc::new(LocalHost::new().with_cwd(dir.path()));
		let ctx = Context::from_shared(host.clone());

		let selection = vec![
			Item::new(0u64, "dir", Detail::new().with(PATH, "sub")),
			Item::new(1u64, "file", Detail::new().with(PATH, "sub/file.txt")),
			Item::new(2u64, "gone", Detail::new().with(PATH, "missing")),
			Item::plain(3u64, "no path"),
		];
		let outcome = cd()
			.invoke(
				&ctx,
				&InvokeParams::new(None, selection, Vec::new()),
				&CancellationToken::new(),
			)
			.await
			.unwrap();
		assert_eq!(outcome, ActionOutcome::Done);
		assert_eq!(
			host.events(),
			vec![
				HostEvent::Execute("cd sub".into()),
				HostEvent::Execute("cd sub".into()),
			]
		);
	}

	#[tokio::test]
	async fn failing_items_do_not_stop_the_rest() {
		// The detached host supports neither buffers nor commands.
		let action = cmd::<Detail>(CmdOptions {
			immediate: true,
			restriction: Some(Restriction::Buffer),
			..CmdOptions::default()
		});
		let selection = vec![Item::plain(0u64, "a"), Item::plain(1u64, "b")];
		let outcome = action
			.invoke(
				&Context::detached(),
				&InvokeParams::new(None, selection, Vec::new()),
				&CancellationToken::new(),
			)
			.await
			.unwrap();
		assert_eq!(outcome, ActionOutcome::Done);
	}
}
