//! Turns a batch of dependency records plus the exclusions declared alongside them into descriptors
//! the resolution engine understands.

use serde::{Serialize, Deserialize};

use crate::coordinate::*;

/// Where a dependency is needed, following the maven scoping model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
	#[default] Compile,
	Runtime,
	Provided,
	Test,
	System,
	/// Only meaningful inside `<dependencyManagement>`.
	Import,
}

impl Scope {
	/// Unknown scopes are treated as `compile`, as maven does.
	pub fn parse(scope: &str) -> Scope {
		match scope.trim().to_ascii_lowercase().as_str() {
			"runtime" => Scope::Runtime,
			"provided" => Scope::Provided,
			"test" => Scope::Test,
			"system" => Scope::System,
			"import" => Scope::Import,
			_ => Scope::Compile,
		}
	}

	/// Scope of a dependency declared with `child` scope by an artifact that is itself in scope `self`.
	///
	/// `None` means the dependency is not pulled in transitively at all.
	pub fn derive(self, child: Scope) -> Option<Scope> {
		match child {
			Scope::Test | Scope::Provided | Scope::System | Scope::Import => None,
			Scope::Runtime => Some(Scope::Runtime),
			Scope::Compile => match self {
				Scope::Compile => Some(Scope::Compile),
				Scope::Runtime => Some(Scope::Runtime),
				/* Only reachable through direct descriptors built by hand */
				other => Some(other),
			},
		}
	}

	/// Whichever of the two puts an artifact on more classpaths, compile being the widest.
	pub fn widest(self, other: Scope) -> Scope {
		fn rank(scope: Scope) -> u8 {
			match scope {
				Scope::Compile => 0,
				Scope::Runtime => 1,
				Scope::Provided => 2,
				Scope::System => 3,
				Scope::Test => 4,
				Scope::Import => 5,
			}
		}
		if rank(other) < rank(self) { other } else { self }
	}
}

impl std::fmt::Display for Scope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			Scope::Compile => "compile",
			Scope::Runtime => "runtime",
			Scope::Provided => "provided",
			Scope::Test => "test",
			Scope::System => "system",
			Scope::Import => "import",
		};
		write!(f, "{}", s)
	}
}

/// A resolvable dependency.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyDescriptor {
	pub coordinate: DependencyCoordinate,
	/// Set semantics, kept ordered so logs and requests are stable.
	pub exclusions: Vec<Exclusion>,
	pub transitive: bool,
	pub scope: Scope,
}

impl DependencyDescriptor {
	/// Applies the transitivity policy to a validated request.
	///
	/// A transitive request carries `exclusions` verbatim. A non-transitive one carries only the
	/// [`wildcard`](Exclusion::wildcard()) exclusion and *drops* `exclusions`, they would be redundant
	/// since nothing beneath the artifact is resolved.
	pub fn new(request: DependencyRequest, exclusions: &[Exclusion]) -> Self {
		let exclusions = if request.transitive {
			let mut set = Vec::<Exclusion>::with_capacity(exclusions.len());
			for e in exclusions {
				if !set.contains(e) {
					set.push(e.clone());
				}
			}
			set
		} else {
			vec![Exclusion::wildcard()]
		};

		Self {
			coordinate: request.coordinate,
			exclusions,
			transitive: request.transitive,
			scope: Scope::Compile,
		}
	}

	/// True when the wildcard exclusion stops the walk beneath this dependency.
	pub fn excludes_everything(&self) -> bool {
		self.exclusions.iter().any(Exclusion::is_wildcard)
	}
}

/// Parses every record and builds one descriptor per record, in input order.
///
/// `exclusions` is shared by the whole batch.
///
/// # Errors
/// [`InvalidCoordinate`](crate::Error::InvalidCoordinate) from the first record that fails to parse,
/// no descriptor is returned in that case.
pub fn build_descriptors<'r>(records: impl IntoIterator<Item = &'r Record>, exclusions: &[Exclusion]) -> crate::Result<Vec<DependencyDescriptor>> {
	records.into_iter()
		.map(|record| parse_dependency(record).map(|request| DependencyDescriptor::new(request, exclusions)))
		.collect()
}
