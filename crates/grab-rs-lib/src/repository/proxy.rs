//! Proxy configuration and the selectors that assign it to repositories.

use serde::{Serialize, Deserialize};

use super::Repository;

/// How to reach a repository through a proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyConfig {
	/// Proxy url without credentials, e.g. `http://proxy.internal:3128`.
	pub url: String,
	pub username: Option<String>,
	pub password: Option<String>,
}

impl ProxyConfig {
	/// Parses `scheme://[user[:password]@]host[:port]`, credentials are split out of the url.
	pub fn parse(proxy: &str) -> crate::Result<Self> {
		let with_scheme = if proxy.contains("://") { proxy.to_string() } else { format!("http://{}", proxy) };
		let mut url = reqwest::Url::parse(&with_scheme)
			.map_err(|e| crate::Error::Parse(format!("invalid proxy \"{}\": {}", proxy, e)))?;
		if url.host_str().is_none() {
			return Err(crate::Error::Parse(format!("proxy \"{}\" has no host", proxy)));
		}

		let username = Some(url.username().to_string()).filter(|u| !u.is_empty());
		let password = url.password().map(str::to_string);
		/* These only fail for cannot-be-a-base urls which a host check already excludes */
		let _ = url.set_username("");
		let _ = url.set_password(None);

		Ok(Self {
			url: url.as_str().trim_end_matches('/').to_string(),
			username,
			password,
		})
	}
}

/// Decides which proxy, if any, a repository is reached through.
pub trait ProxySelector {
	fn proxy_for(&self, repository: &Repository) -> Option<ProxyConfig>;
}

/// Never uses a proxy.
#[derive(Debug, Default, Clone)]
pub struct NoProxySelector;

impl ProxySelector for NoProxySelector {
	fn proxy_for(&self, _repository: &Repository) -> Option<ProxyConfig> {
		None
	}
}

/// Selects proxies the way the `http_proxy`, `https_proxy` and `no_proxy` environment variables describe.
#[derive(Debug, Default, Clone)]
pub struct EnvProxySelector {
	http: Option<ProxyConfig>,
	https: Option<ProxyConfig>,
	no_proxy: Vec<String>,
}

impl EnvProxySelector {
	pub fn new(http: Option<ProxyConfig>, https: Option<ProxyConfig>, no_proxy: impl IntoIterator<Item = String>) -> Self {
		Self {
			http,
			https,
			no_proxy: no_proxy.into_iter().map(|h| h.trim().to_ascii_lowercase()).filter(|h| !h.is_empty()).collect(),
		}
	}

	/// Builds a selector from the proxy settings in `config`, unparsable proxies are ignored with a warning.
	pub fn from_config(config: &crate::Config) -> Self {
		fn parse(setting: &Option<String>) -> Option<ProxyConfig> {
			let setting = setting.as_ref()?;
			match ProxyConfig::parse(setting) {
				Ok(p) => Some(p),
				Err(e) => {
					log::warn!("Ignoring proxy setting: {}", e);
					None
				},
			}
		}

		let no_proxy = config.no_proxy().map(|s| s.split(',').map(str::to_string).collect::<Vec<_>>()).unwrap_or_default();
		Self::new(parse(config.http_proxy()), parse(config.https_proxy()), no_proxy)
	}

	fn is_bypassed(&self, host: &str) -> bool {
		let host = host.to_ascii_lowercase();
		self.no_proxy.iter().any(|entry| {
			if entry == "*" {
				return true;
			}
			let entry = entry.trim_start_matches('.');
			host == entry || host.ends_with(&format!(".{}", entry))
		})
	}
}

impl ProxySelector for EnvProxySelector {
	fn proxy_for(&self, repository: &Repository) -> Option<ProxyConfig> {
		let url = reqwest::Url::parse(repository.root_url()).ok()?;
		let host = url.host_str()?;
		if self.is_bypassed(host) {
			return None;
		}
		match url.scheme() {
			"http" => self.http.clone(),
			"https" => self.https.clone().or_else(|| self.http.clone()),
			_ => None,
		}
	}
}
