//! File metadata carried on item details.

use std::fs::Metadata;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use frz_pipeline::Detail;

use crate::location::{KIND, MODE, MODIFIED, SIZE};

/// What a path points at. Symlinks are reported as such even when they
/// resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
	File,
	Directory,
	Symlink,
	Other,
}

impl FileKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::File => "file",
			Self::Directory => "dir",
			Self::Symlink => "link",
			Self::Other => "other",
		}
	}

	pub fn parse(name: &str) -> Option<Self> {
		match name {
			"file" => Some(Self::File),
			"dir" => Some(Self::Directory),
			"link" => Some(Self::Symlink),
			"other" => Some(Self::Other),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
	pub kind: FileKind,
	/// Length in bytes of the resolved target.
	pub size: u64,
	/// Seconds since the Unix epoch.
	pub modified: Option<u64>,
	/// Permission bits (`0o777` mask).
	pub mode: u32,
}

impl FileStat {
	/// Stat `path` without following a final symlink for the kind, then
	/// follow it for size and times. Dangling links keep the link's own
	/// metadata.
	pub async fn read(path: &Path) -> std::io::Result<Self> {
		let link = tokio::fs::symlink_metadata(path).await?;
		if !link.file_type().is_symlink() {
			return Ok(Self::from_metadata(&link, None));
		}
		let target = tokio::fs::metadata(path).await.unwrap_or(link);
		Ok(Self::from_metadata(&target, Some(FileKind::Symlink)))
	}

	/// Blocking variant of [`FileStat::read`] for synchronous stages.
	pub fn read_blocking(path: &Path) -> std::io::Result<Self> {
		let link = std::fs::symlink_metadata(path)?;
		if !link.file_type().is_symlink() {
			return Ok(Self::from_metadata(&link, None));
		}
		let target = std::fs::metadata(path).unwrap_or(link);
		Ok(Self::from_metadata(&target, Some(FileKind::Symlink)))
	}

	fn from_metadata(metadata: &Metadata, kind: Option<FileKind>) -> Self {
		let kind = kind.unwrap_or_else(|| {
			if metadata.is_file() {
				FileKind::File
			} else if metadata.is_dir() {
				FileKind::Directory
			} else {
				FileKind::Other
			}
		});
		Self {
			kind,
			size: metadata.len(),
			modified: metadata
				.modified()
				.ok()
				.and_then(|time| time.duration_since(UNIX_EPOCH).ok())
				.map(|since| since.as_secs()),
			mode: mode_of(metadata),
		}
	}

	/// Read the fields written by [`FileStat::write_to`], if `kind` and
	/// `size` are present.
	pub fn from_detail(detail: &Detail) -> Option<Self> {
		Some(Self {
			kind: FileKind::parse(detail.get_str(KIND)?)?,
			size: detail.get_u64(SIZE)?,
			modified: detail.get_u64(MODIFIED),
			mode: detail
				.get_u64(MODE)
				.and_then(|mode| u32::try_from(mode).ok())
				.unwrap_or(0),
		})
	}

	pub fn write_to(&self, detail: &mut Detail) {
		detail.insert(KIND, self.kind.as_str());
		detail.insert(SIZE, self.size);
		detail.insert(MODE, self.mode);
		if let Some(modified) = self.modified {
			detail.insert(MODIFIED, modified);
		}
	}

	pub fn is_executable(&self) -> bool {
		self.kind == FileKind::File && self.mode & 0o111 != 0
	}

	/// Time elapsed since the last modification, zero for future times.
	pub fn age(&self, now: SystemTime) -> Option<Duration> {
		let modified = UNIX_EPOCH + Duration::from_secs(self.modified?);
		Some(now.duration_since(modified).unwrap_or_default())
	}
}

#[cfg(unix)]
fn mode_of(metadata: &Metadata) -> u32 {
	use std::os::unix::fs::PermissionsExt;

	metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn mode_of(metadata: &Metadata) -> u32 {
	if metadata.permissions().readonly() { 0o444 } else { 0o666 }
}

#[cfg(test)]
mod tests {
	use std::fs;

	use tempfile::tempdir;

	use super::*;

	#[tokio::test]
	async fn reads_files_and_directories() {
		let dir = tempdir().unwrap();
		let file = dir.path().join("a.txt");
		fs::write(&file, "12345").unwrap();

		let stat = FileStat::read(&file).await.unwrap();
		assert_eq!(stat.kind, FileKind::File);
		assert_eq!(stat.size, 5);
		assert!(stat.modified.is_some());
		assert_eq!(FileStat::read_blocking(&file).unwrap(), stat);

		assert_eq!(FileStat::read(dir.path()).await.unwrap().kind, FileKind::Directory);
		assert!(FileStat::read(&dir.path().join("gone")).await.is_err());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn symlinks_report_their_kind_and_target_size() {
		let dir = tempdir().unwrap();
		let file = dir.path().join("a.txt");
		fs::write(&file, "123").unwrap();
		let link = dir.path().join("link");
		std::os::unix::fs::symlink(&file, &link).unwrap();
		let dangling = dir.path().join("dangling");
		std::os::unix::fs::symlink(dir.path().join("nowhere"), &dangling).unwrap();

		let stat = FileStat::read(&link).await.unwrap();
		assert_eq!(stat.kind, FileKind::Symlink);
		assert_eq!(stat.size, 3);
		assert_eq!(FileStat::read(&dangling).await.unwrap().kind, FileKind::Symlink);
	}

	#[test]
	fn detail_fields_round_trip() {
		let stat = FileStat {
			kind: FileKind::File,
			size: 10,
			modified: Some(1_700_000_000),
			mode: 0o755,
		};
		let mut detail = Detail::new();
		stat.write_to(&mut detail);
		assert_eq!(FileStat::from_detail(&detail), Some(stat.clone()));
		assert!(stat.is_executable());
		assert!(FileStat::from_detail(&Detail::new().with(SIZE, 3)).is_none());
	}

	#[test]
	fn age_saturates_for_future_times() {
		let stat = FileStat {
			kind: FileKind::File,
			size: 0,
			modified: Some(100),
			mode: 0,
		};
		let now = UNIX_EPOCH + Duration::from_secs(160);
		assert_eq!(stat.age(now), Some(Duration::from_secs(60)));
		assert_eq!(stat.age(UNIX_EPOCH), Some(Duration::ZERO));
	}
}
