//! The entry point a host uses to pull dependencies onto its load path.
//!
//! # Usage
//! ```no_run
//! use serde_json::json;
//!
//! let config = grab_rs::Config::load_from_disk()?;
//! let mut engine = grab_rs::GrabEngine::new(&config);
//! let dependency = json!({ "group": "org.slf4j", "module": "slf4j-api", "version": "1.7.36" });
//! engine.grab_single(dependency.as_object().unwrap_or(&Default::default()), None)?;
//! println!("{}", engine.load_path().to_path_string());
//! # Ok::<(), grab_rs::Error>(())
//! ```

use std::collections::HashMap;

use crate::coordinate::*;
use crate::dependency::*;
use crate::load_path::*;
use crate::progress::*;
use crate::repository::*;
use crate::resolver::*;

/// Forwards transfer events to the engine's reporter.
struct ReporterListener<'r>(&'r dyn ProgressReporter);

impl TransferListener for ReporterListener<'_> {
	fn transfer_event(&self, event: &TransferEvent) {
		self.0.transfer_event(event)
	}
}

/// Resolves dependency records against a registry of repositories, remembering every resolved
/// version so later grabs in the same session stay consistent with earlier ones.
///
/// # Concurrency
/// An engine is meant for use from one thread at a time, every operation that changes its state takes
/// `&mut self`. Build a separate engine for each independent session.
pub struct GrabEngine {
	engine: Box<dyn ResolutionEngine + Send>,
	repositories: RepositoryRegistry,
	managed: ManagedDependencySet,
	progress: Box<dyn ProgressReporter + Send + Sync>,
	load_path: ClassPath,
}

impl GrabEngine {
	/// An engine using the [`GraphEngine`], proxies from the environment, the progress reporter selected
	/// by `config` and `config`'s default repositories.
	pub fn new(config: &crate::Config) -> Self {
		Self::with_parts(
			Box::new(GraphEngine::new(config)),
			Box::new(EnvProxySelector::from_config(config)),
			progress_reporter_for(config),
			config.default_repositories().to_vec(),
			Vec::new(),
		)
	}

	/// # Parameters
	/// - `repositories` - Initial repositories, highest priority first.
	/// - `managed_dependencies` - Initial version pins.
	pub fn with_parts(
		engine: Box<dyn ResolutionEngine + Send>,
		proxy_selector: Box<dyn ProxySelector + Send>,
		progress: Box<dyn ProgressReporter + Send + Sync>,
		repositories: Vec<Repository>,
		managed_dependencies: Vec<ManagedDependency>,
	) -> Self {
		let mut registry = RepositoryRegistry::new(proxy_selector);
		registry.register_in_priority_order(repositories);
		Self {
			engine,
			repositories: registry,
			managed: ManagedDependencySet::new(managed_dependencies),
			progress,
			load_path: ClassPath::default(),
		}
	}

	/// Resolves `descriptors` and their transitive dependencies.
	///
	/// On success every resolved artifact is appended to the managed dependencies. On failure they are
	/// left untouched. The progress reporter is told the attempt finished either way.
	///
	/// # Errors
	/// [`DependencyResolutionFailed`](crate::Error::DependencyResolutionFailed) wrapping whatever the engine returned.
	pub fn resolve(&mut self, descriptors: &[DependencyDescriptor]) -> crate::Result<Vec<ResolvedArtifact>> {
		let artifacts = self.resolve_unpinned(descriptors)?;
		self.pin(&artifacts);
		Ok(artifacts)
	}

	/// Runs the engine without touching the managed dependencies.
	fn resolve_unpinned(&self, descriptors: &[DependencyDescriptor]) -> crate::Result<Vec<ResolvedArtifact>> {
		let request = CollectRequest {
			root: None,
			dependencies: descriptors.to_vec(),
			repositories: self.repositories.as_ordered_list().to_vec(),
			managed_dependencies: self.managed.as_slice().to_vec(),
		};

		let result = self.engine.collect_and_resolve(
			&request,
			&ScopeFilter::classpath(Scope::Compile),
			&ReporterListener(self.progress.as_ref()),
		);
		self.progress.finished();
		Ok(result?.artifacts)
	}

	fn pin(&mut self, artifacts: &[ResolvedArtifact]) {
		self.managed.extend(artifacts.iter().map(|a| ManagedDependency::new(a.coordinate.clone())));
	}

	/// Grabs `dependencies`, applying the `excludes` listed in `args` to all of them, and adds the
	/// resulting files to `loader` or, when `None`, to this engine's own [`load_path()`](GrabEngine::load_path()).
	///
	/// Nothing is pinned unless every resolved file could be turned into a url.
	///
	/// # Errors
	/// - [`InvalidCoordinate`](crate::Error::InvalidCoordinate) for a malformed record, before any repository is contacted.
	/// - [`DependencyResolutionFailed`](crate::Error::DependencyResolutionFailed) when resolving fails
	/// or a resolved file cannot be expressed as a url.
	pub fn grab(&mut self, args: &Record, dependencies: &[Record], loader: Option<&dyn LoadPath>) -> crate::Result<()> {
		let exclusions = parse_exclusions(args)?;
		let descriptors = build_descriptors(dependencies, &exclusions)?;
		let artifacts = self.resolve_unpinned(&descriptors)?;

		let urls = artifacts.iter()
			.map(|a| Url::from_file_path(&a.local_file).map_err(|_| ResolutionError::MalformedUrl(a.local_file.clone())))
			.collect::<Result<Vec<_>, _>>()?;
		self.pin(&artifacts);

		let loader: &dyn LoadPath = match loader {
			Some(loader) => loader,
			None => &self.load_path,
		};
		for url in urls {
			loader.add_url(url);
		}
		Ok(())
	}

	/// Grabs the one dependency `args` describes, `args` doubling as the options.
	pub fn grab_single(&mut self, args: &Record, loader: Option<&dyn LoadPath>) -> crate::Result<()> {
		self.grab(args, std::slice::from_ref(args), loader)
	}

	/// Registers the repository described by `args` (`name` and `root`) with the highest priority.
	///
	/// # Errors
	/// [`InvalidCoordinate`](crate::Error::InvalidCoordinate) when `name` or `root` is missing or not a string.
	pub fn add_resolver(&mut self, args: &Record) -> crate::Result<()> {
		let field = |key: &str| -> crate::Result<String> {
			match args.get(key) {
				Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
				_ => Err(crate::Error::InvalidCoordinate(format!("resolver is missing \"{}\"", key))),
			}
		};
		let repository = Repository::new(field("name")?, field("root")?);
		self.repositories.register(repository);
		Ok(())
	}

	/// Not supported, always fails.
	pub fn enumerate_grapes(&self) -> crate::Result<HashMap<String, HashMap<String, Vec<String>>>> {
		Err(crate::Error::UnsupportedOperation("grape enumeration"))
	}

	/// Not supported, always fails.
	pub fn resolve_to_uris(&mut self, _args: &Record, _dependencies: &[Record]) -> crate::Result<Vec<Url>> {
		Err(crate::Error::UnsupportedOperation("resolving to URIs"))
	}

	/// Not supported, always fails.
	pub fn list_dependencies(&self, _loader: &dyn LoadPath) -> crate::Result<Vec<Record>> {
		Err(crate::Error::UnsupportedOperation("listing dependencies"))
	}

	/// Not supported, always fails.
	pub fn grab_endorsed_module(&mut self, _module: &str) -> crate::Result<()> {
		Err(crate::Error::UnsupportedOperation("grabbing an endorsed module"))
	}

	/// Repositories in search order.
	pub fn repositories(&self) -> &[Repository] {
		self.repositories.as_ordered_list()
	}

	pub fn managed_dependencies(&self) -> &[ManagedDependency] {
		self.managed.as_slice()
	}

	/// The load path used when [`grab()`](GrabEngine::grab()) is not given one.
	pub fn load_path(&self) -> &ClassPath {
		&self.load_path
	}
}
