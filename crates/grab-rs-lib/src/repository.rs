//! Remote repositories and the ordered registry they are searched from.
//!
//! # Priority
//! [`RepositoryRegistry::register()`] inserts at the *front* of the list. Registering R1, R2 then R3 leaves
//! the search order as `[R3, R2, R1]`, the most recently registered repository wins. This lets a
//! resolver added by a script take precedence over the defaults.
//!
//! To seed a registry from a list already in priority order use
//! [`RepositoryRegistry::register_in_priority_order()`], it performs the reversal.

use serde::{Serialize, Deserialize};

pub mod proxy;
pub use proxy::ProxyConfig;
pub use proxy::ProxySelector;
pub use proxy::EnvProxySelector;
pub use proxy::NoProxySelector;

/// The only layout supported, `group/with/slashes/module/version/module-version.ext`.
pub const DEFAULT_LAYOUT: &str = "default";

/// A named remote location searched for artifacts.
///
/// # Eq
/// Two repositories are equal when their name, id and root url match. The proxy is not considered
/// so that a repository with a proxy filled in by a [`ProxySelector`] still equals the one it was made from.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Repository {
	name: String,
	id: String,
	root_url: String,
	layout: String,
	proxy: Option<ProxyConfig>,
}

impl Repository {
	/// Creates a default layout repository whose name and id are both `id`.
	pub fn new(id: impl Into<String>, root_url: impl Into<String>) -> Self {
		let id = id.into();
		Self {
			name: id.clone(),
			id,
			root_url: root_url.into(),
			layout: DEFAULT_LAYOUT.to_string(),
			proxy: None,
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
		self.proxy = proxy;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn root_url(&self) -> &str {
		&self.root_url
	}

	pub fn layout(&self) -> &str {
		&self.layout
	}

	pub fn proxy(&self) -> Option<&ProxyConfig> {
		self.proxy.as_ref()
	}

	/// Joins a layout relative path onto the root url.
	pub fn url_for(&self, path: &str) -> String {
		format!("{}/{}", self.root_url.trim_end_matches('/'), path.trim_start_matches('/'))
	}

	fn normalized_root(&self) -> &str {
		self.root_url.trim_end_matches('/')
	}
}

impl PartialEq for Repository {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name &&
		self.id == other.id &&
		self.normalized_root() == other.normalized_root()
	}
}

impl std::hash::Hash for Repository {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.name.hash(state);
		self.id.hash(state);
		self.normalized_root().hash(state);
	}
}

impl std::fmt::Display for Repository {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} ({})", self.id, self.root_url)
	}
}

/// Ordered, duplicate free list of repositories, index 0 is searched first.
pub struct RepositoryRegistry {
	repositories: Vec<Repository>,
	proxy_selector: Box<dyn ProxySelector + Send>,
}

impl RepositoryRegistry {
	pub fn new(proxy_selector: Box<dyn ProxySelector + Send>) -> Self {
		Self {
			repositories: Default::default(),
			proxy_selector,
		}
	}

	/// Adds `repository` with the highest priority.
	///
	/// Does nothing when an equal repository is already registered, its position is unchanged.
	/// A repository without a proxy gets whatever the registry's [`ProxySelector`] picks for it.
	///
	/// Returns `true` when the repository was added.
	pub fn register(&mut self, repository: Repository) -> bool {
		if self.repositories.contains(&repository) {
			log::trace!("Repository {} already registered, ignoring.", repository);
			return false;
		}

		let repository = if repository.proxy.is_none() {
			let proxy = self.proxy_selector.proxy_for(&repository);
			repository.with_proxy(proxy)
		} else {
			repository
		};

		log::debug!("Registering repository {} with highest priority", repository);
		self.repositories.insert(0, repository);
		true
	}

	/// Registers `repositories` so that afterwards they are searched in the order given.
	///
	/// As each registration goes to the front the list is registered back to front.
	pub fn register_in_priority_order(&mut self, repositories: impl IntoIterator<Item = Repository>) {
		let mut repositories: Vec<Repository> = repositories.into_iter().collect();
		repositories.reverse();
		for repository in repositories {
			self.register(repository);
		}
	}

	/// The current search order.
	pub fn as_ordered_list(&self) -> &[Repository] {
		&self.repositories
	}

	pub fn len(&self) -> usize {
		self.repositories.len()
	}

	pub fn is_empty(&self) -> bool {
		self.repositories.is_empty()
	}
}

impl std::fmt::Debug for RepositoryRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RepositoryRegistry").field("repositories", &self.repositories).finish()
	}
}
