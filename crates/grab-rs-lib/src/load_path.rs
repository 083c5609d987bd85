//! Where grabbed artifacts end up.

use std::sync::Mutex;

pub use reqwest::Url;

/// A growable list of locations a running program loads code from.
pub trait LoadPath {
	fn add_url(&self, url: Url);
}

/// A [`LoadPath`] that only records urls, in the order they were added.
#[derive(Debug, Default)]
pub struct ClassPath {
	urls: Mutex<Vec<Url>>,
}

impl ClassPath {
	pub fn urls(&self) -> Vec<Url> {
		self.urls.lock().map(|u| u.clone()).unwrap_or_default()
	}

	/// Joined with the platform's path separator, ready for a `CLASSPATH` style variable.
	pub fn to_path_string(&self) -> String {
		let separator = if cfg!(windows) { ";" } else { ":" };
		self.urls().iter()
			.map(|u| u.to_file_path().map(|p| p.display().to_string()).unwrap_or_else(|_| u.to_string()))
			.collect::<Vec<_>>()
			.join(separator)
	}
}

impl LoadPath for ClassPath {
	fn add_url(&self, url: Url) {
		if let Ok(mut urls) = self.urls.lock() {
			if !urls.contains(&url) {
				urls.push(url);
			}
		}
	}
}
