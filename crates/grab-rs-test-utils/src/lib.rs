//! Various helper functions for testing
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use grab_rs::load_path::Url;
use grab_rs::progress::{NoopProgressReporter, ProgressReporter, TransferListener};
use grab_rs::repository::NoProxySelector;
use grab_rs::transport::{HttpConnector, RepositoryConnector, TransportError};
use grab_rs::{GrabEngine, GraphEngine, Record, Repository};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestUtilError {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("path {0} cannot be expressed as a url")]
	Url(PathBuf),
}

pub type Result<T> = std::result::Result<T, TestUtilError>;

/// A dependency written into a published POM.
#[derive(Debug, Clone, Default)]
pub struct PomDependency {
	pub group: String,
	pub module: String,
	pub version: Option<String>,
	pub scope: Option<String>,
	pub optional: bool,
	pub exclusions: Vec<(String, String)>,
}

impl PomDependency {
	pub fn new(group: &str, module: &str, version: &str) -> Self {
		Self { group: group.to_string(), module: module.to_string(), version: Some(version.to_string()), ..Default::default() }
	}

	pub fn scope(mut self, scope: &str) -> Self {
		self.scope = Some(scope.to_string());
		self
	}

	pub fn optional(mut self) -> Self {
		self.optional = true;
		self
	}

	pub fn exclude(mut self, group: &str, module: &str) -> Self {
		self.exclusions.push((group.to_string(), module.to_string()));
		self
	}

	fn to_xml(&self) -> String {
		let mut xml = format!("\t\t<dependency>\n\t\t\t<groupId>{}</groupId>\n\t\t\t<artifactId>{}</artifactId>\n", self.group, self.module);
		if let Some(version) = &self.version {
			xml += &format!("\t\t\t<version>{}</version>\n", version);
		}
		if let Some(scope) = &self.scope {
			xml += &format!("\t\t\t<scope>{}</scope>\n", scope);
		}
		if self.optional {
			xml += "\t\t\t<optional>true</optional>\n";
		}
		if !self.exclusions.is_empty() {
			xml += "\t\t\t<exclusions>\n";
			for (group, module) in &self.exclusions {
				xml += &format!("\t\t\t\t<exclusion><groupId>{}</groupId><artifactId>{}</artifactId></exclusion>\n", group, module);
			}
			xml += "\t\t\t</exclusions>\n";
		}
		xml + "\t\t</dependency>\n"
	}
}

/// A maven layout repository in a temporary directory, removed when dropped.
pub struct TestRepository {
	id: String,
	dir: tempfile::TempDir,
}

impl TestRepository {
	pub fn new(id: &str) -> Result<Self> {
		Ok(Self { id: id.to_string(), dir: tempfile::tempdir()? })
	}

	pub fn root(&self) -> &Path {
		self.dir.path()
	}

	/// `file:` url of the repository root.
	pub fn url(&self) -> Result<String> {
		Url::from_directory_path(self.root())
			.map(|u| u.to_string())
			.map_err(|_| TestUtilError::Url(self.root().to_path_buf()))
	}

	pub fn repository(&self) -> Result<Repository> {
		Ok(Repository::new(self.id.clone(), self.url()?))
	}

	fn version_dir(&self, group: &str, module: &str, version: &str) -> PathBuf {
		self.root().join(group.replace('.', "/")).join(module).join(version)
	}

	/// Path a published file of the artifact would have.
	pub fn file_path(&self, group: &str, module: &str, version: &str, extension: &str) -> PathBuf {
		self.version_dir(group, module, version).join(format!("{}-{}.{}", module, version, extension))
	}

	/// Publishes a jar and a POM declaring `dependencies`.
	pub fn publish(&self, group: &str, module: &str, version: &str, dependencies: &[PomDependency]) -> Result<()> {
		let dependencies: String = dependencies.iter().map(PomDependency::to_xml).collect();
		let pom = format!(
			"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<project xmlns=\"http://maven.apache.org/POM/4.0.0\">\n\t<modelVersion>4.0.0</modelVersion>\n\t<groupId>{}</groupId>\n\t<artifactId>{}</artifactId>\n\t<version>{}</version>\n\t<dependencies>\n{}\t</dependencies>\n</project>\n",
			group, module, version, dependencies,
		);
		self.publish_pom(group, module, version, &pom)?;
		self.publish_jar(group, module, version)
	}

	/// Writes `pom` as the artifact's descriptor, without a jar.
	pub fn publish_pom(&self, group: &str, module: &str, version: &str, pom: &str) -> Result<()> {
		std::fs::create_dir_all(self.version_dir(group, module, version))?;
		std::fs::write(self.file_path(group, module, version, "pom"), pom)?;
		self.write_metadata(group, module)
	}

	/// Writes a jar, without a descriptor.
	pub fn publish_jar(&self, group: &str, module: &str, version: &str) -> Result<()> {
		std::fs::create_dir_all(self.version_dir(group, module, version))?;
		std::fs::write(self.file_path(group, module, version, "jar"), format!("{}:{}:{}", group, module, version))?;
		self.write_metadata(group, module)
	}

	/// Writes a `.sha256` sidecar next to a published file.
	pub fn publish_checksum(&self, group: &str, module: &str, version: &str, extension: &str, checksum: &str) -> Result<()> {
		let mut path = self.file_path(group, module, version, extension).into_os_string();
		path.push(".sha256");
		std::fs::write(path, checksum)?;
		Ok(())
	}

	/// Rewrites `maven-metadata.xml` to list every published version.
	fn write_metadata(&self, group: &str, module: &str) -> Result<()> {
		let module_dir = self.root().join(group.replace('.', "/")).join(module);
		let mut versions: Vec<String> = std::fs::read_dir(&module_dir)?
			.filter_map(|e| e.ok())
			.filter(|e| e.path().is_dir())
			.filter_map(|e| e.file_name().to_str().map(str::to_string))
			.collect();
		versions.sort();
		let listed: String = versions.iter().map(|v| format!("<version>{}</version>", v)).collect();
		let metadata = format!(
			"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata><groupId>{}</groupId><artifactId>{}</artifactId><versioning><versions>{}</versions></versioning></metadata>\n",
			group, module, listed,
		);
		std::fs::write(module_dir.join("maven-metadata.xml"), metadata)?;
		Ok(())
	}
}

/// Ids of the repositories a [`RecordingConnector`] was asked to fetch from, in order.
#[derive(Debug, Clone, Default)]
pub struct ContactLog(Arc<Mutex<Vec<String>>>);

impl ContactLog {
	pub fn contacted(&self) -> Vec<String> {
		self.0.lock().map(|c| c.clone()).unwrap_or_default()
	}

	pub fn was_contacted(&self) -> bool {
		!self.contacted().is_empty()
	}
}

/// Fetches through an [`HttpConnector`] while logging every repository contacted.
pub struct RecordingConnector {
	inner: HttpConnector,
	log: ContactLog,
}

impl RecordingConnector {
	pub fn new() -> (Self, ContactLog) {
		let log = ContactLog::default();
		(Self { inner: HttpConnector::new(false), log: log.clone() }, log)
	}
}

impl RepositoryConnector for RecordingConnector {
	fn fetch(&self, repository: &Repository, path: &str, listener: &dyn TransferListener) -> std::result::Result<Option<Vec<u8>>, TransportError> {
		if let Ok(mut contacted) = self.log.0.lock() {
			contacted.push(repository.id().to_string());
		}
		self.inner.fetch(repository, path, listener)
	}
}

/// A config caching into `local_repository`, with no default repositories.
pub fn test_config(local_repository: &Path) -> grab_rs::Config {
	let mut config = grab_rs::Config::default();
	config.set_local_repository(local_repository.to_path_buf());
	config.set_default_repositories(Vec::new());
	config.set_report_downloads(false);
	config
}

/// An engine over `repositories` (highest priority first) that records which repositories it contacts
/// and reports no progress.
pub fn test_engine(config: &grab_rs::Config, repositories: Vec<Repository>) -> (GrabEngine, ContactLog) {
	test_engine_with_reporter(config, repositories, Box::new(NoopProgressReporter))
}

pub fn test_engine_with_reporter(config: &grab_rs::Config, repositories: Vec<Repository>, reporter: Box<dyn ProgressReporter + Send + Sync>) -> (GrabEngine, ContactLog) {
	let (connector, log) = RecordingConnector::new();
	let engine = GrabEngine::with_parts(
		Box::new(GraphEngine::with_connector(config, Box::new(connector))),
		Box::new(NoProxySelector),
		reporter,
		repositories,
		Vec::new(),
	);
	(engine, log)
}

/// The object inside `value`, anything else gives an empty record.
pub fn record(value: serde_json::Value) -> Record {
	match value {
		serde_json::Value::Object(map) => map,
		_ => Record::new(),
	}
}

/// A writer whose contents can be read back after handing it to a reporter.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
	pub fn contents(&self) -> String {
		self.0.lock().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default()
	}
}

impl Write for SharedBuffer {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		match self.0.lock() {
			Ok(mut b) => b.write(buf),
			Err(_) => Err(std::io::Error::new(std::io::ErrorKind::Other, "buffer poisoned")),
		}
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

/// Installs `env_logger` for test output, repeated calls are harmless.
pub fn init_logging() {
	let _ = env_logger::builder().is_test(true).try_init();
}
