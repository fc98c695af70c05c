use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use frz_pipeline::stream::{ensure_active, from_items};
use frz_pipeline::{CancellationToken, CollectParams, Detail, Error, Item, Result, SharedSource, define_source};
use futures::future::{self, Either};
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::process::Command;

use crate::location::{ABSPATH, PATH};
use crate::paths::{display, relative_to};

/// Two-letter porcelain code, e.g. `M `, ` M`, `??`.
pub const STATUS: &str = "status";
pub const STATUS_DESCRIPTION: &str = "status_description";
pub const STAGED: &str = "staged";
pub const UNSTAGED: &str = "unstaged";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitStatusOptions {
	pub include_untracked: bool,
	pub include_ignored: bool,
	pub include_submodules: bool,
}

impl Default for GitStatusOptions {
	fn default() -> Self {
		Self {
			include_untracked: true,
			include_ignored: false,
			include_submodules: false,
		}
	}
}

impl GitStatusOptions {
	fn args(self) -> Vec<&'static str> {
		let mut args = vec!["status", "--porcelain=v1"];
		args.push(if self.include_untracked { "-u" } else { "-uno" });
		if self.include_ignored {
			args.push("--ignored");
		}
		if !self.include_submodules {
			args.push("--ignore-submodules");
		}
		args
	}
}

/// List changed files of the repository containing `args[0]` (default `.`).
///
/// `abspath` joins git's path onto the repository top level and `path` is
/// relative to the listed directory. Outside a repository, or without git
/// installed, the source is empty.
pub fn git_status(options: GitStatusOptions) -> SharedSource<Detail> {
	define_source(move |ctx, params: CollectParams, token| {
		let ctx = ctx.clone();
		let token = token.clone();
		stream::once(async move {
			let arg = params.args.first().map_or(".", String::as_str);
			let root = ctx.resolve_path(&ctx.host().expand(arg))?;
			let Some(toplevel) = git(&root, &["rev-parse", "--show-toplevel"], &token).await? else {
				return Ok(from_items(Vec::new()));
			};
			let Some(output) = git(&root, &options.args(), &token).await? else {
				return Ok(from_items(Vec::new()));
			};
			let toplevel = PathBuf::from(String::from_utf8_lossy(&toplevel.stdout).trim_end());
			let base = tokio::fs::canonicalize(&root).await.unwrap_or(root);
			let items = parse_porcelain(&String::from_utf8_lossy(&output.stdout), &toplevel, &base);
			tracing::debug!(toplevel = %toplevel.display(), count = items.len(), "listed git status");
			Ok::<_, Error>(from_items(items))
		})
		.try_flatten()
		.boxed()
	})
}

/// Run git in `root`. `None` when git is missing or `root` is outside a
/// repository.
async fn git(root: &Path, args: &[&str], token: &CancellationToken) -> Result<Option<Output>> {
	let child = Command::new("git")
		.args(args)
		.current_dir(root)
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true)
		.spawn();
	let child = match child {
		Ok(child) => child,
		Err(err) if err.kind() == io::ErrorKind::NotFound => {
			tracing::debug!("git is not installed");
			return Ok(None);
		}
		Err(err) => return Err(Error::process("git", err)),
	};

	let output = match future::select(Box::pin(child.wait_with_output()), Box::pin(token.cancelled())).await {
		Either::Left((output, _)) => output?,
		Either::Right(_) => return Err(Error::Cancelled),
	};
	ensure_active(token)?;
	if output.status.success() {
		return Ok(Some(output));
	}
	let stderr = String::from_utf8_lossy(&output.stderr);
	if stderr.contains("not a git repository") {
		return Ok(None);
	}
	Err(Error::process("git", format!("git {} failed: {}", args.join(" "), stderr.trim())))
}

fn parse_porcelain(output: &str, toplevel: &Path, base: &Path) -> Vec<Item> {
	output
		.lines()
		.filter_map(parse_entry)
		.enumerate()
		.map(|(id, entry)| entry.into_item(id, toplevel, base))
		.collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
	staged: char,
	unstaged: char,
	path: String,
}

fn parse_entry(line: &str) -> Option<Entry> {
	let mut chars = line.chars();
	let staged = chars.next()?;
	let unstaged = chars.next()?;
	let rest = line.get(3..).filter(|rest| !rest.is_empty())?;
	// Renames and copies report `origin -> destination`.
	let path = rest.rsplit_once(" -> ").map_or(rest, |(_, to)| to);
	Some(Entry {
		staged,
		unstaged,
		path: unquote(path),
	})
}

fn unquote(path: &str) -> String {
	path.strip_prefix('"')
		.and_then(|inner| inner.strip_suffix('"'))
		.map_or_else(|| path.to_string(), |inner| inner.replace("\\\"", "\"").replace("\\\\", "\\"))
}

impl Entry {
	fn code(&self) -> String {
		format!("{}{}", self.staged, self.unstaged)
	}

	/// Description and the staged/unstaged flags.
	fn describe(&self) -> (String, bool, bool) {
		match (self.staged, self.unstaged) {
			('?', '?') => ("untracked".to_string(), false, true),
			('!', '!') => ("ignored".to_string(), false, false),
			(staged, unstaged) => {
				let staged = match staged {
					'M' => Some("modified"),
					'A' => Some("added"),
					'D' => Some("deleted"),
					'R' => Some("renamed"),
					'C' => Some("copied"),
					_ => None,
				};
				let unstaged = match unstaged {
					'M' => Some("modified"),
					'D' => Some("deleted"),
					_ => None,
				};
				let description = [staged, unstaged].into_iter().flatten().collect::<Vec<_>>().join(", ");
				(description, staged.is_some(), unstaged.is_some())
			}
		}
	}

	fn indicator(&self) -> String {
		match (self.staged, self.unstaged) {
			('?', '?') => "[?]".to_string(),
			('!', '!') => "[!]".to_string(),
			_ => format!("[{}]", self.code()),
		}
	}

	fn into_item(self, id: usize, toplevel: &Path, base: &Path) -> Item {
		let (description, staged, unstaged) = self.describe();
		let abspath = toplevel.join(&self.path);
		let path = display(&relative_to(base, &abspath));
		let value = format!("{:<5} {}", self.indicator(), path);
		let detail = Detail::new()
			.with(ABSPATH, display(&abspath))
			.with(STATUS, self.code())
			.with(STATUS_DESCRIPTION, description)
			.with(STAGED, staged)
			.with(UNSTAGED, unstaged)
			.with(PATH, path);
		Item::new(id, value, detail)
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use frz_pipeline::stream::collect_items;
	use frz_pipeline::{Context, Source};
	use tempfile::tempdir;

	use super::*;
	use crate::host::LocalHost;

	#[test]
	fn porcelain_lines_become_items() {
		let output = "M  src/lib.rs\n M README.md\nMM both.rs\n?? new.txt\nR  old.rs -> moved.rs\n!! target\n\n";
		let items = parse_porcelain(output, Path::new("/repo"), Path::new("/repo"));
		let values: Vec<_> = items.iter().map(|item| item.value.as_str()).collect();
		assert_eq!(
			values,
			vec![
				"[M ]  src/lib.rs",
				"[ M]  README.md",
				"[MM]  both.rs",
				"[?]   new.txt",
				"[R ]  moved.rs",
				"[!]   target",
			]
		);

		let both = &items[2].detail;
		assert_eq!(both.get_str(STATUS_DESCRIPTION), Some("modified, modified"));
		assert_eq!(both.get_as::<bool>(STAGED), Some(true));
		assert_eq!(both.get_as::<bool>(UNSTAGED), Some(true));

		let untracked = &items[3].detail;
		assert_eq!(untracked.get_str(STATUS), Some("??"));
		assert_eq!(untracked.get_str(STATUS_DESCRIPTION), Some("untracked"));
		assert_eq!(untracked.get_str(ABSPATH), Some("/repo/new.txt"));
		assert_eq!(items[4].detail.get_str(PATH), Some("moved.rs"));
	}

	#[test]
	fn paths_are_relative_to_the_listed_directory() {
		let items = parse_porcelain(" M src/lib.rs\n M README.md\n", Path::new("/repo"), Path::new("/repo/src"));
		assert_eq!(items[0].detail.get_str(PATH), Some("lib.rs"));
		assert_eq!(items[0].detail.get_str(ABSPATH), Some("/repo/src/lib.rs"));
		assert_eq!(items[1].value, "[ M]  ../README.md");
	}

	#[test]
	fn quoted_paths_are_unquoted() {
		let entry = parse_entry(r#"?? "with \"quote\".txt""#).unwrap();
		assert_eq!(entry.path, r#"with "quote".txt"#);
		assert!(parse_entry("M").is_none());
	}

	#[test]
	fn options_select_git_flags() {
		assert_eq!(
			GitStatusOptions::default().args(),
			vec!["status", "--porcelain=v1", "-u", "--ignore-submodules"]
		);
		let options = GitStatusOptions {
			include_untracked: false,
			include_ignored: true,
			include_submodules: true,
		};
		assert_eq!(options.args(), vec!["status", "--porcelain=v1", "-uno", "--ignored"]);
	}

	async fn collect_in(dir: &Path) -> Vec<Item> {
		let ctx = Context::new(LocalHost::new().with_cwd(dir));
		collect_items(git_status(GitStatusOptions::default()).collect(
			&ctx,
			CollectParams::default(),
			&CancellationToken::new(),
		))
		.await
		.unwrap()
	}

	#[tokio::test]
	async fn lists_untracked_files_of_a_fresh_repository() {
		let dir = tempdir().unwrap();
		let initialized = std::process::Command::new("git")
			.args(["init", "--quiet"])
			.current_dir(dir.path())
			.status()
			.is_ok_and(|status| status.success());
		if !initialized {
			return;
		}
		fs::write(dir.path().join("new.txt"), "x").unwrap();

		let items = collect_in(dir.path()).await;
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].value, "[?]   new.txt");
		assert_eq!(items[0].detail.get_str(PATH), Some("new.txt"));
		assert!(items[0].detail.get_str(ABSPATH).is_some_and(|path| path.ends_with("/new.txt")));
	}

	#[tokio::test]
	async fn plain_directories_list_nothing() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join("loose.txt"), "x").unwrap();
		let items = collect_in(dir.path()).await;
		assert!(items.iter().all(|item| !item.value.ends_with("loose.txt")));
	}
}
