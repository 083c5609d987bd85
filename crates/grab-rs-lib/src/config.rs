use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::repository::Repository;

/// Name of the directory created under the platform cache and data directories.
const APP_DIR: &str = "grab-rs";
const CONFIG_FILE: &str = "config.json";
const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2/";

/// Set to `true` to report every download.
pub const REPORT_DOWNLOADS_ENV: &str = "GRAB_REPORT_DOWNLOADS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	local_repository: PathBuf,
	data_dir: PathBuf,
	https_only: bool,
	report_downloads: bool,
	do_checksums: bool,
	default_repositories: Vec<Repository>,
	http_proxy: Option<String>,
	https_proxy: Option<String>,
	no_proxy: Option<String>,
}

/// `$XDG_*_HOME` or `$HOME/<fallback>`, `%APPDATA%` on windows, a temporary directory when none is set.
fn platform_dir(#[allow(unused_variables)] xdg_var: &str, #[allow(unused_variables)] home_fallback: &str) -> PathBuf {
	#[cfg(target_os = "windows")]
	let path = std::env::var_os("APPDATA").map(PathBuf::from);

	#[cfg(not(target_os = "windows"))]
	let path = std::env::var_os(xdg_var)
		.map(PathBuf::from)
		.or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback)));

	path.unwrap_or_else(|| {
		log::warn!("No home directory found, using the temporary directory.");
		std::env::temp_dir()
	}).join(APP_DIR)
}

fn env_setting(names: &[&str]) -> Option<String> {
	names.iter()
		.filter_map(|name| std::env::var(name).ok())
		.find(|value| !value.trim().is_empty())
}

impl Default for Config {
	fn default() -> Self {
		Self {
			local_repository: platform_dir("XDG_CACHE_HOME", ".cache").join("repository"),
			data_dir: platform_dir("XDG_DATA_HOME", ".local/share"),
			https_only: false,
			report_downloads: std::env::var(REPORT_DOWNLOADS_ENV).map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false),
			do_checksums: true,
			default_repositories: vec![Repository::new("central", MAVEN_CENTRAL)],
			http_proxy: env_setting(&["http_proxy", "HTTP_PROXY"]),
			https_proxy: env_setting(&["https_proxy", "HTTPS_PROXY"]),
			no_proxy: env_setting(&["no_proxy", "NO_PROXY"]),
		}
	}
}

impl Config {
	/// Reads `config.json` from the default data directory, returns the defaults when there is none.
	///
	/// # Errors
	/// - [`IO`](crate::Error::IO) when the file exists but cannot be read.
	/// - [`SerdeJSON`](crate::Error::SerdeJSON) when it cannot be deserialized.
	pub fn load_from_disk() -> crate::Result<Self> {
		let defaults = Self::default();
		Self::load_from_file(defaults.data_dir.join(CONFIG_FILE)).map(|c| c.unwrap_or(defaults))
	}

	/// `None` when the file does not exist.
	pub fn load_from_file(path: impl AsRef<Path>) -> crate::Result<Option<Self>> {
		let path = path.as_ref();
		if !path.exists() {
			log::debug!("No config at {}, using defaults", path.display());
			return Ok(None);
		}
		let file = std::fs::File::open(path)?;
		Ok(Some(serde_json::from_reader(file)?))
	}

	/// Writes the config to `config.json` in [`data_dir`](Config::data_dir()).
	///
	/// # Errors
	/// - [`IO`](crate::Error::IO) when creating the directory or file.
	/// - [`SerdeJSON`](crate::Error::SerdeJSON) when serializing.
	pub fn save_to_disk(&self) -> crate::Result<()> {
		std::fs::create_dir_all(&self.data_dir)?;
		let file = std::fs::File::create(self.data_dir.join(CONFIG_FILE))?;
		serde_json::to_writer_pretty(file, self)?;
		Ok(())
	}

	pub fn local_repository(&self) -> &PathBuf {
		&self.local_repository
	}
	pub fn set_local_repository(&mut self, local_repository: PathBuf) {
		self.local_repository = local_repository;
	}

	pub fn data_dir(&self) -> &PathBuf {
		&self.data_dir
	}
	/// returns if the directory is valid or not.
	pub fn set_data_dir(&mut self, data_dir: PathBuf) -> bool {
		if data_dir.is_dir() {
			self.data_dir = data_dir;
			true
		} else {
			false
		}
	}

	pub fn https_only(&self) -> bool {
		self.https_only
	}
	pub fn set_https_only(&mut self, https_only: bool) {
		self.https_only = https_only;
	}

	pub fn report_downloads(&self) -> bool {
		self.report_downloads
	}
	pub fn set_report_downloads(&mut self, report_downloads: bool) {
		self.report_downloads = report_downloads;
	}

	pub fn do_checksums(&self) -> bool {
		self.do_checksums
	}
	pub fn set_do_checksums(&mut self, do_checksums: bool) {
		self.do_checksums = do_checksums;
	}

	/// Highest priority first.
	pub fn default_repositories(&self) -> &[Repository] {
		&self.default_repositories
	}
	pub fn set_default_repositories(&mut self, default_repositories: Vec<Repository>) {
		self.default_repositories = default_repositories;
	}

	pub fn http_proxy(&self) -> &Option<String> {
		&self.http_proxy
	}
	pub fn set_http_proxy(&mut self, http_proxy: Option<String>) {
		self.http_proxy = http_proxy;
	}

	pub fn https_proxy(&self) -> &Option<String> {
		&self.https_proxy
	}
	pub fn set_https_proxy(&mut self, https_proxy: Option<String>) {
		self.https_proxy = https_proxy;
	}

	pub fn no_proxy(&self) -> Option<&str> {
		self.no_proxy.as_deref()
	}
	pub fn set_no_proxy(&mut self, no_proxy: Option<String>) {
		self.no_proxy = no_proxy;
	}
}
