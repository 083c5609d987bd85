//! The default [`ResolutionEngine`], collecting graphs the way maven does.
//!
//! # Collection
//! Dependencies are walked breadth first from a meta node. The first occurrence of a
//! `group:module:packaging` key decides its version ("nearest wins"), later occurrences only add an
//! omitted edge. A later occurrence can still widen the scope of a transitive artifact, e.g. from
//! `runtime` to `compile`, in which case its dependencies are walked again with the wider scope.
//!
//! Beneath each artifact:
//! - Exclusions accumulate down every path, a `*:*` exclusion stops the walk and the descriptor is not read.
//! - Optional dependencies and transitive `test`, `provided`, `system` and `import` ones are skipped.
//! - Managed versions replace declared ones. Direct dependencies only take a managed version when
//!   their own version is not concrete and the managed one satisfies it.
//!
//! Afterwards every artifact accepted by the [`ScopeFilter`] is taken from the local repository or
//! downloaded from the first repository, in search order, that has it.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;

use petgraph::prelude::NodeIndex;

use crate::local_repository::*;
use crate::progress::{NoopProgressReporter, TransferListener};
use crate::repository::Repository;
use crate::transport::{HttpConnector, RepositoryConnector};
use super::*;
use super::dependency_graph::*;
use super::metadata::{self, METADATA_FILE};
use super::pom::{EffectivePom, PomSource, RawPom};

pub struct GraphEngine {
	local: LocalRepository,
	connector: Box<dyn RepositoryConnector + Send + Sync>,
	do_checksums: bool,
}

impl GraphEngine {
	/// An engine caching into [`Config::local_repository()`](crate::Config::local_repository()) and fetching with an [`HttpConnector`].
	pub fn new(config: &crate::Config) -> Self {
		Self::with_connector(config, Box::new(HttpConnector::from_config(config)))
	}

	/// A relative local repository is taken relative to the current directory at construction.
	pub fn with_connector(config: &crate::Config, connector: Box<dyn RepositoryConnector + Send + Sync>) -> Self {
		let root = std::path::absolute(config.local_repository()).unwrap_or_else(|e| {
			log::warn!("Could not make {} absolute: {}", config.local_repository().display(), e);
			config.local_repository().clone()
		});
		Self {
			local: LocalRepository::new(root),
			connector,
			do_checksums: config.do_checksums(),
		}
	}

	pub fn local_repository(&self) -> &LocalRepository {
		&self.local
	}

	/// The local copy of `relative`, downloading it from the first repository that has it when missing.
	///
	/// # Errors
	/// When no repository has it and at least one of them failed, the last failure is returned.
	fn download(&self, repositories: &[Repository], relative: &str, listener: &dyn TransferListener) -> Result<Option<PathBuf>, ResolutionError> {
		if let Some(path) = self.local.find(relative) {
			log::trace!("Using cached {}", path.display());
			return Ok(Some(path));
		}

		let mut last_error = None;
		for repository in repositories {
			match self.connector.fetch(repository, relative, listener) {
				Ok(Some(content)) => {
					self.verify_checksum(repository, relative, &content)?;
					let path = self.local.store(relative, &content)?;
					log::info!("Downloaded {} from {}", relative, repository.id());
					return Ok(Some(path));
				},
				Ok(None) => log::trace!("{} not in {}", relative, repository),
				Err(e) => {
					log::warn!("Failed to fetch {} from {}: {}", relative, repository, e);
					last_error = Some(e);
				},
			}
		}

		match last_error {
			Some(e) => Err(e.into()),
			None => Ok(None),
		}
	}

	/// Compares `content` with the repository's `.sha256` file, when it publishes one.
	///
	/// Only a published checksum that disagrees fails the download. A sidecar that cannot be fetched is
	/// logged and the file is accepted unverified.
	fn verify_checksum(&self, repository: &Repository, relative: &str, content: &[u8]) -> Result<(), ResolutionError> {
		if !self.do_checksums {
			return Ok(());
		}
		let sidecar = format!("{}.sha256", relative);
		match self.connector.fetch(repository, &sidecar, &NoopProgressReporter) {
			Ok(Some(published)) => {
				let published = String::from_utf8_lossy(&published);
				if let Some(expected) = published.split_whitespace().next() {
					if !expected.eq_ignore_ascii_case(&sha256::digest(content)) {
						return Err(ResolutionError::ChecksumMismatch(repository.url_for(relative)));
					}
				}
			},
			Ok(None) => log::trace!("No checksum published for {}", relative),
			Err(e) => log::warn!("Could not fetch checksum for {}, accepting it unverified: {}", relative, e),
		}
		Ok(())
	}
}

impl ResolutionEngine for GraphEngine {
	fn collect_and_resolve(&self, request: &CollectRequest, filter: &ScopeFilter, listener: &dyn TransferListener) -> Result<DependencyResult, ResolutionError> {
		let mut session = Session::new(self, &request.repositories, listener, &request.managed_dependencies);

		let dependencies: Vec<&DependencyDescriptor> = request.root.iter().chain(request.dependencies.iter()).collect();
		let graph = session.collect(&dependencies)?;
		log::debug!("Collected {} artifacts", graph.artifact_count());

		let mut artifacts = Vec::new();
		for node in graph.artifacts_in_order() {
			if !filter.accepts(node.scope) {
				log::debug!("Filtered out {} ({})", node.coordinate, node.scope);
				continue;
			}
			artifacts.push(ResolvedArtifact {
				coordinate: node.coordinate.clone(),
				scope: node.scope,
				local_file: session.artifact_file(&node.coordinate)?,
			});
		}
		Ok(DependencyResult { artifacts })
	}
}

/// A dependency waiting in the collection queue.
struct PendingDependency {
	parent: NodeIndex,
	group: String,
	module: String,
	packaging: String,
	version: Option<String>,
	scope: Scope,
	/// From every ancestor, they apply to this dependency's children.
	inherited_exclusions: Vec<Exclusion>,
	exclusions: Vec<Exclusion>,
	depth: usize,
	declared_by: String,
}

impl PendingDependency {
	fn key(&self) -> ArtifactKey {
		ArtifactKey { group: self.group.clone(), module: self.module.clone(), packaging: self.packaging.clone() }
	}

	fn is_direct(&self) -> bool {
		self.depth == 1
	}
}

/// What is needed to queue the dependencies of an artifact again.
#[derive(Clone)]
struct WalkedArtifact {
	coordinate: DependencyCoordinate,
	exclusions: Vec<Exclusion>,
	depth: usize,
}

/// State for one call to [`GraphEngine::collect_and_resolve()`].
struct Session<'a> {
	engine: &'a GraphEngine,
	repositories: &'a [Repository],
	listener: &'a dyn TransferListener,
	/// First pin of a key wins.
	managed: HashMap<ArtifactKey, String>,
	poms: HashMap<DependencyCoordinate, Option<Rc<RawPom>>>,
	versions: HashMap<(String, String), Rc<Vec<ArtifactVersion>>>,
}

impl<'a> Session<'a> {
	fn new(engine: &'a GraphEngine, repositories: &'a [Repository], listener: &'a dyn TransferListener, managed_dependencies: &[ManagedDependency]) -> Self {
		let mut managed = HashMap::new();
		for m in managed_dependencies {
			managed.entry(m.key()).or_insert_with(|| m.version().to_string());
		}
		Self {
			engine,
			repositories,
			listener,
			managed,
			poms: Default::default(),
			versions: Default::default(),
		}
	}

	fn collect(&mut self, dependencies: &[&DependencyDescriptor]) -> Result<DependencyGraph, ResolutionError> {
		let mut graph = DependencyGraph::default();
		let mut walked: HashMap<NodeIndex, WalkedArtifact> = HashMap::new();
		let mut queue: VecDeque<PendingDependency> = dependencies.iter().map(|d| PendingDependency {
			parent: graph.meta_node,
			group: d.coordinate.group().to_string(),
			module: d.coordinate.module().to_string(),
			packaging: d.coordinate.packaging().to_string(),
			version: Some(d.coordinate.version().to_string()),
			scope: d.scope,
			inherited_exclusions: Vec::new(),
			exclusions: d.exclusions.clone(),
			depth: 1,
			declared_by: "the request".to_string(),
		}).collect();

		while let Some(pending) = queue.pop_front() {
			let key = pending.key();
			let requested = pending.version.clone().unwrap_or_default();

			if let Some(existing) = graph.get_node_index(&key) {
				let Some(winner) = graph.get_artifact(existing).cloned() else { continue };
				log::debug!("{} {} declared by {} omitted for conflict with {}", key, requested, pending.declared_by, winner.coordinate.version());
				graph.add_omitted_edge(pending.parent, existing, requested);

				/* A direct dependency keeps the scope it was requested with */
				if winner.depth == 1 {
					continue;
				}
				if let Some(scope) = graph.widen_scope(existing, pending.scope) {
					log::debug!("Scope of {} widened from {} to {} by {}", winner.coordinate, winner.scope, scope, pending.declared_by);
					if let Some(walk) = walked.get(&existing).cloned() {
						self.queue_dependencies(&mut queue, existing, scope, walk)?;
					}
				}
				continue;
			}

			let version = self.select_version(&pending)?;
			let coordinate = DependencyCoordinate::with_packaging(&pending.group, &pending.module, version, &pending.packaging);
			log::debug!("Collected {} ({}) at depth {}", coordinate, pending.scope, pending.depth);
			let node = graph.add_artifact(pending.parent, ArtifactNode { coordinate: coordinate.clone(), scope: pending.scope, depth: pending.depth }, requested);

			let mut exclusions = pending.inherited_exclusions;
			for exclusion in pending.exclusions {
				if !exclusions.contains(&exclusion) {
					exclusions.push(exclusion);
				}
			}
			if exclusions.iter().any(Exclusion::is_wildcard) {
				log::debug!("Not walking beneath {}, everything is excluded", coordinate);
				continue;
			}

			let walk = WalkedArtifact { coordinate, exclusions, depth: pending.depth };
			walked.insert(node, walk.clone());
			self.queue_dependencies(&mut queue, node, pending.scope, walk)?;
		}

		Ok(graph)
	}

	/// Queues the transitive dependencies declared by the artifact at `node`, seen from `scope`.
	fn queue_dependencies(&mut self, queue: &mut VecDeque<PendingDependency>, node: NodeIndex, scope: Scope, walk: WalkedArtifact) -> Result<(), ResolutionError> {
		let WalkedArtifact { coordinate, exclusions, depth } = walk;
		let Some(pom) = EffectivePom::build(&coordinate, self)? else { return Ok(()) };
		for dependency in pom.dependencies {
			if dependency.optional {
				log::trace!("Skipping optional {}:{} of {}", dependency.group, dependency.module, coordinate);
				continue;
			}
			let Some(derived) = scope.derive(dependency.scope()) else {
				log::trace!("Skipping {}:{} of {}, {} scope is not transitive", dependency.group, dependency.module, coordinate, dependency.scope());
				continue;
			};
			if let Some(exclusion) = exclusions.iter().find(|e| e.matches(&dependency.group, &dependency.module)) {
				log::debug!("{}:{} of {} excluded by {}", dependency.group, dependency.module, coordinate, exclusion);
				continue;
			}
			queue.push_back(PendingDependency {
				parent: node,
				group: dependency.group,
				module: dependency.module,
				packaging: dependency.packaging,
				version: dependency.version,
				scope: derived,
				inherited_exclusions: exclusions.clone(),
				exclusions: dependency.exclusions,
				depth: depth + 1,
				declared_by: coordinate.to_string(),
			});
		}
		Ok(())
	}

	fn select_version(&mut self, pending: &PendingDependency) -> Result<String, ResolutionError> {
		let key = pending.key();
		let managed = self.managed.get(&key).cloned();

		if !pending.is_direct() {
			if let Some(version) = managed {
				log::trace!("Using managed version {} for {}", version, key);
				return Ok(version);
			}
		}

		let declared = pending.version.as_deref().ok_or_else(|| ResolutionError::MissingVersion {
			dependency: key.to_string(),
			declared_by: pending.declared_by.clone(),
		})?;
		let requirement = VersionRequirement::parse(declared).map_err(|e| ResolutionError::MalformedDescriptor {
			location: pending.declared_by.clone(),
			reason: format!("{}: {}", key, e),
		})?;

		if let Some(version) = requirement.as_concrete() {
			return Ok(version.to_string());
		}

		if let Some(version) = managed {
			if ArtifactVersion::new(&version).map(|v| requirement.matches(&v)).unwrap_or(false) {
				log::debug!("Using pinned version {} for {} {}", version, key, requirement);
				return Ok(version);
			}
		}

		let available = self.available_versions(&pending.group, &pending.module)?;
		requirement.select_highest(available.iter())
			.map(ArtifactVersion::to_string)
			.ok_or_else(|| ResolutionError::VersionNotFound { key, requirement: declared.to_string() })
	}

	/// Versions listed by the metadata of every repository.
	fn available_versions(&mut self, group: &str, module: &str) -> Result<Rc<Vec<ArtifactVersion>>, ResolutionError> {
		let cache_key = (group.to_string(), module.to_string());
		if let Some(versions) = self.versions.get(&cache_key) {
			return Ok(versions.clone());
		}

		let relative = module_path(group, module, METADATA_FILE);
		let mut versions = Vec::new();
		let mut last_error = None;
		for repository in self.repositories {
			match self.engine.connector.fetch(repository, &relative, self.listener) {
				Ok(Some(content)) => {
					let found = metadata::parse_versions(&String::from_utf8_lossy(&content), &repository.url_for(&relative))?;
					metadata::merge_versions(&mut versions, found);
				},
				Ok(None) => {},
				Err(e) => {
					log::warn!("Failed to fetch {} from {}: {}", relative, repository, e);
					last_error = Some(e);
				},
			}
		}
		if let (true, Some(e)) = (versions.is_empty(), last_error) {
			return Err(e.into());
		}

		let versions = Rc::new(versions);
		self.versions.insert(cache_key, versions.clone());
		Ok(versions)
	}

	fn artifact_file(&self, coordinate: &DependencyCoordinate) -> Result<PathBuf, ResolutionError> {
		let relative = layout_path(coordinate, extension_for(coordinate.packaging()));
		self.engine.download(self.repositories, &relative, self.listener)?
			.ok_or_else(|| ResolutionError::ArtifactNotFound {
				coordinate: coordinate.clone(),
				searched: self.repositories.iter().map(|r| r.id().to_string()).collect(),
			})
	}
}

impl PomSource for Session<'_> {
	fn raw_pom(&mut self, coordinate: &DependencyCoordinate) -> Result<Option<Rc<RawPom>>, ResolutionError> {
		if let Some(pom) = self.poms.get(coordinate) {
			return Ok(pom.clone());
		}

		let relative = layout_path(coordinate, "pom");
		let pom = match self.engine.download(self.repositories, &relative, self.listener)? {
			Some(path) => {
				let xml = std::fs::read_to_string(&path)?;
				Some(Rc::new(RawPom::parse(&xml, &path.display().to_string())?))
			},
			None => {
				log::warn!("The POM for {} is missing, no dependency information available", coordinate);
				None
			},
		};
		self.poms.insert(coordinate.clone(), pom.clone());
		Ok(pom)
	}
}
