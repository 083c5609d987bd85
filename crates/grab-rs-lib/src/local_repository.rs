//! The on disk artifact cache, laid out the way maven lays out repositories.

use std::path::{Path, PathBuf};

use crate::coordinate::DependencyCoordinate;

/// Packagings whose files use a different extension.
pub fn extension_for(packaging: &str) -> &str {
	match packaging {
		"bundle" | "maven-plugin" | "ejb" | "test-jar" => "jar",
		other => other,
	}
}

/// `group/as/dirs/module/version/module-version.extension`
pub fn layout_path(coordinate: &DependencyCoordinate, extension: &str) -> String {
	format!(
		"{}/{}/{}/{}-{}.{}",
		coordinate.group().replace('.', "/"),
		coordinate.module(),
		coordinate.version(),
		coordinate.module(),
		coordinate.version(),
		extension,
	)
}

/// `group/as/dirs/module/file`, for files describing every version of a module.
pub fn module_path(group: &str, module: &str, file: &str) -> String {
	format!("{}/{}/{}", group.replace('.', "/"), module, file)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepository {
	root: PathBuf,
}

impl LocalRepository {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn path_of(&self, relative: &str) -> PathBuf {
		self.root.join(relative)
	}

	/// The cached file at `relative`, if any.
	pub fn find(&self, relative: &str) -> Option<PathBuf> {
		let path = self.path_of(relative);
		path.is_file().then_some(path)
	}

	/// Writes `content` to `relative`, a partially written file is never left at the final path.
	pub fn store(&self, relative: &str, content: &[u8]) -> std::io::Result<PathBuf> {
		let path = self.path_of(relative);
		std::fs::create_dir_all(path.with_file_name(""))?;
		let mut partial = path.clone().into_os_string();
		partial.push(".part");
		std::fs::write(&partial, content)?;
		std::fs::rename(&partial, &path)?;
		Ok(path)
	}
}
