//! Fetching files out of remote repositories.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;

use crate::repository::{ProxyConfig, Repository};
use crate::progress::{TransferEvent, TransferListener};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);
const USER_AGENT: &str = concat!("grab-rs/", env!("CARGO_PKG_VERSION"));
const CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Error)]
pub enum TransportError {
	#[error("reqwest error: {0}")]
	Reqwest(#[from] reqwest::Error),
	#[error("{url} returned status {status}")]
	Status { url: String, status: u16 },
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("invalid url \"{0}\"")]
	InvalidUrl(String),
	/// `https_only` is set and the repository is not https.
	#[error("refusing to fetch {0} over an insecure connection")]
	Insecure(String),
}

/// Retrieves repository relative paths.
pub trait RepositoryConnector {
	/// Fetches `path` from `repository`, reporting transfers to `listener`.
	///
	/// `Ok(None)` when the repository does not have it.
	fn fetch(&self, repository: &Repository, path: &str, listener: &dyn TransferListener) -> Result<Option<Vec<u8>>, TransportError>;
}

/// Reads `http(s):` repositories with blocking `reqwest` clients and `file:` repositories from disk.
///
/// One client is kept per proxy configuration.
pub struct HttpConnector {
	https_only: bool,
	clients: Mutex<HashMap<Option<ProxyConfig>, reqwest::blocking::Client>>,
}

impl HttpConnector {
	pub fn new(https_only: bool) -> Self {
		Self {
			https_only,
			clients: Default::default(),
		}
	}

	pub fn from_config(config: &crate::Config) -> Self {
		Self::new(config.https_only())
	}

	fn client_for(&self, proxy: Option<&ProxyConfig>) -> Result<reqwest::blocking::Client, TransportError> {
		let key = proxy.cloned();
		if let Some(client) = self.clients.lock().ok().and_then(|c| c.get(&key).cloned()) {
			return Ok(client);
		}

		let builder = reqwest::blocking::Client::builder()
			.https_only(self.https_only)
			.user_agent(USER_AGENT)
			.connect_timeout(CONNECT_TIMEOUT)
			.timeout(DOWNLOAD_TIMEOUT);
		let builder = match proxy {
			Some(p) => {
				let mut reqwest_proxy = reqwest::Proxy::all(&p.url)?;
				if let Some(username) = &p.username {
					reqwest_proxy = reqwest_proxy.basic_auth(username, p.password.as_deref().unwrap_or(""));
				}
				builder.proxy(reqwest_proxy)
			},
			/* Proxies are chosen by our selector, not picked up from the environment again */
			None => builder.no_proxy(),
		};
		let client = builder.build()?;

		if let Ok(mut clients) = self.clients.lock() {
			clients.insert(key, client.clone());
		}
		Ok(client)
	}

	fn fetch_file(&self, url: &reqwest::Url, listener: &dyn TransferListener) -> Result<Option<Vec<u8>>, TransportError> {
		let path = url.to_file_path().map_err(|_| TransportError::InvalidUrl(url.to_string()))?;
		if !path.is_file() {
			return Ok(None);
		}
		listener.transfer_event(&TransferEvent::Initiated { resource: url.as_str() });
		match std::fs::read(&path) {
			Ok(bytes) => {
				listener.transfer_event(&TransferEvent::Succeeded { resource: url.as_str(), transferred: bytes.len() as u64 });
				Ok(Some(bytes))
			},
			Err(e) => {
				listener.transfer_event(&TransferEvent::Failed { resource: url.as_str(), reason: e.to_string() });
				Err(e.into())
			},
		}
	}

	fn fetch_http(&self, repository: &Repository, url: &reqwest::Url, listener: &dyn TransferListener) -> Result<Option<Vec<u8>>, TransportError> {
		if self.https_only && url.scheme() != "https" {
			return Err(TransportError::Insecure(url.to_string()));
		}
		let client = self.client_for(repository.proxy())?;

		log::debug!("Requesting {}", url);
		let mut response = client.get(url.clone()).send()?;
		let status = response.status();
		if status == reqwest::StatusCode::NOT_FOUND {
			return Ok(None);
		}
		if !status.is_success() {
			return Err(TransportError::Status { url: url.to_string(), status: status.as_u16() });
		}

		listener.transfer_event(&TransferEvent::Initiated { resource: url.as_str() });
		let total = response.content_length();
		let mut content = Vec::with_capacity(total.unwrap_or(0) as usize);
		let mut chunk = vec![0u8; CHUNK_SIZE];
		loop {
			let read = match response.read(&mut chunk) {
				Ok(0) => break,
				Ok(n) => n,
				Err(e) => {
					listener.transfer_event(&TransferEvent::Failed { resource: url.as_str(), reason: e.to_string() });
					return Err(e.into());
				},
			};
			content.extend_from_slice(&chunk[..read]);
			listener.transfer_event(&TransferEvent::Progressed { resource: url.as_str(), transferred: content.len() as u64, total });
		}
		listener.transfer_event(&TransferEvent::Succeeded { resource: url.as_str(), transferred: content.len() as u64 });
		log::info!("Downloaded {}", url);
		Ok(Some(content))
	}
}

impl RepositoryConnector for HttpConnector {
	fn fetch(&self, repository: &Repository, path: &str, listener: &dyn TransferListener) -> Result<Option<Vec<u8>>, TransportError> {
		let location = repository.url_for(path);
		let url = reqwest::Url::parse(&location).map_err(|_| TransportError::InvalidUrl(location.clone()))?;
		match url.scheme() {
			"file" => self.fetch_file(&url, listener),
			"http" | "https" => self.fetch_http(repository, &url, listener),
			_ => Err(TransportError::InvalidUrl(location)),
		}
	}
}
