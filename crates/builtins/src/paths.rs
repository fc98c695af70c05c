use std::path::{Component, Path, PathBuf};

/// Express `path` relative to `base`, walking up with `..` where needed.
///
/// Both paths are compared lexically. A relative `path`, or one on a
/// different prefix than `base`, is returned unchanged.
pub fn relative_to(base: &Path, path: &Path) -> PathBuf {
	if !path.is_absolute() || !base.is_absolute() {
		return path.to_path_buf();
	}
	let base: Vec<Component> = base.components().filter(|c| *c != Component::CurDir).collect();
	let target: Vec<Component> = path.components().filter(|c| *c != Component::CurDir).collect();
	if base.first() != target.first() {
		return path.to_path_buf();
	}
	let shared = base
		.iter()
		.zip(&target)
		.take_while(|(a, b)| a == b)
		.count();
	let mut relative = PathBuf::new();
	for _ in shared..base.len() {
		relative.push("..");
	}
	for component in &target[shared..] {
		relative.push(component.as_os_str());
	}
	if relative.as_os_str().is_empty() {
		relative.push(".");
	}
	relative
}

/// Render a path with forward slashes.
pub fn display(path: &Path) -> String {
	path.to_string_lossy().replace('\\', "/")
}
