//! The contract between the grab engine and whatever collects and downloads dependency graphs.
//!
//! # Usage
//! 1. Build a [`CollectRequest`] from descriptors, the repository search list and the managed dependencies.
//! 1. Call [`ResolutionEngine::collect_and_resolve()`] with a [`ScopeFilter`].
//! 1. Read the [`ResolvedArtifact`]s out of the [`DependencyResult`], in the order the engine produced them.
//!
//! [`GraphEngine`] is the implementation used by default, anything else implementing the trait can
//! be handed to [`GrabEngine`](crate::GrabEngine) instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::coordinate::*;
use crate::dependency::*;
use crate::repository::Repository;
use crate::progress::TransferListener;
use crate::transport::TransportError;

pub mod xml;
pub mod pom;
pub mod metadata;
mod dependency_graph;
pub mod graph_engine;
pub use graph_engine::GraphEngine;

/// Errors raised while collecting or downloading a dependency graph.
#[derive(Debug, Error)]
pub enum ResolutionError {
	#[error("could not find artifact {coordinate} in {}", .searched.join(", "))]
	ArtifactNotFound {
		coordinate: DependencyCoordinate,
		/// Ids of every repository searched.
		searched: Vec<String>,
	},
	#[error("no version of {key} matches \"{requirement}\"")]
	VersionNotFound { key: ArtifactKey, requirement: String },
	/// A transitive dependency with no version, neither declared nor managed.
	#[error("{dependency} of {declared_by} has no version")]
	MissingVersion { dependency: String, declared_by: String },
	#[error("malformed descriptor {location}: {reason}")]
	MalformedDescriptor { location: String, reason: String },
	#[error("transport error: {0}")]
	Transport(#[from] TransportError),
	#[error("checksum of {0} does not match the published checksum")]
	ChecksumMismatch(String),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("{} cannot be turned into a url", .0.display())]
	MalformedUrl(PathBuf),
	/// For engines other than [`GraphEngine`].
	#[error(transparent)]
	Other(Box<dyn std::error::Error + Send + Sync>),
}

/// A version pin applied to artifacts met during collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManagedDependency {
	/// Version is the pinned version.
	pub coordinate: DependencyCoordinate,
}

impl ManagedDependency {
	pub fn new(coordinate: DependencyCoordinate) -> Self {
		Self { coordinate }
	}

	pub fn key(&self) -> ArtifactKey {
		self.coordinate.key()
	}

	pub fn version(&self) -> &str {
		self.coordinate.version()
	}
}

/// Append only sequence of pins.
///
/// Entries are never removed or changed. When the same artifact is pinned more than once the earliest
/// entry is the one engines honour, so a version stays pinned for the life of the set.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ManagedDependencySet {
	entries: Vec<ManagedDependency>,
}

impl ManagedDependencySet {
	pub fn new(initial: impl IntoIterator<Item = ManagedDependency>) -> Self {
		Self { entries: initial.into_iter().collect() }
	}

	pub fn extend(&mut self, entries: impl IntoIterator<Item = ManagedDependency>) {
		let before = self.entries.len();
		self.entries.extend(entries);
		log::debug!("Managed dependencies grew from {} to {}", before, self.entries.len());
	}

	pub fn as_slice(&self) -> &[ManagedDependency] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Everything an engine needs to collect one graph.
#[derive(Debug, Clone)]
pub struct CollectRequest {
	/// Always `None` when resolving a set of top level dependencies.
	pub root: Option<DependencyDescriptor>,
	pub dependencies: Vec<DependencyDescriptor>,
	/// Search order, index 0 first.
	pub repositories: Vec<Repository>,
	pub managed_dependencies: Vec<ManagedDependency>,
}

/// Which scopes make it into a [`DependencyResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
	included: Vec<Scope>,
}

impl ScopeFilter {
	/// Scopes visible on the classpath of `scope`.
	pub fn classpath(scope: Scope) -> Self {
		let included = match scope {
			Scope::Compile => vec![Scope::Compile, Scope::Provided, Scope::System],
			Scope::Runtime => vec![Scope::Compile, Scope::Runtime],
			Scope::Test => vec![Scope::Compile, Scope::Runtime, Scope::Provided, Scope::System, Scope::Test],
			other => vec![other],
		};
		Self { included }
	}

	pub fn accepts(&self, scope: Scope) -> bool {
		self.included.contains(&scope)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArtifact {
	/// With the version actually selected.
	pub coordinate: DependencyCoordinate,
	pub scope: Scope,
	pub local_file: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyResult {
	pub artifacts: Vec<ResolvedArtifact>,
}

/// Collects the transitive graph of a request, downloads what survives `filter` and reports transfers to `listener`.
///
/// Either the whole request resolves or an error is returned, there are no partial results.
pub trait ResolutionEngine {
	fn collect_and_resolve(&self, request: &CollectRequest, filter: &ScopeFilter, listener: &dyn TransferListener) -> Result<DependencyResult, ResolutionError>;
}

#[cfg(test)]
mod test {
	use super::*;

	#[test] fn compile_classpath_includes_provided() { assert!(ScopeFilter::classpath(Scope::Compile).accepts(Scope::Provided)) }
	#[test] fn compile_classpath_excludes_test() { assert!(!ScopeFilter::classpath(Scope::Compile).accepts(Scope::Test)) }
	#[test] fn compile_classpath_excludes_runtime() { assert!(!ScopeFilter::classpath(Scope::Compile).accepts(Scope::Runtime)) }

	#[test]
	fn not_found_lists_searched_repositories() {
		let e = ResolutionError::ArtifactNotFound { coordinate: DependencyCoordinate::new("g", "m", "1"), searched: vec!["a".to_string(), "b".to_string()] };
		assert_eq!(e.to_string(), "could not find artifact g:m:1 in a, b");
	}

	#[test]
	fn managed_set_only_grows() {
		let mut set = ManagedDependencySet::new(vec![ManagedDependency::new(DependencyCoordinate::new("g", "m", "1"))]);
		set.extend(vec![ManagedDependency::new(DependencyCoordinate::new("g", "m", "2"))]);
		assert_eq!(set.as_slice().iter().map(|m| m.version()).collect::<Vec<_>>(), ["1", "2"]);
	}
}
