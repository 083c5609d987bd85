//! Coordinates identifying artifacts and the parser turning loosely typed records into them.
//!
//! Callers describe what they want with free form key-value records (a [`Record`]), the same shape
//! a script annotation or a JSON document would produce:
//!
//! ```json
//! { "group": "com.example", "module": "lib", "version": "1.0", "transitive": false }
//! ```
//!
//! Every record is validated once here, nothing past this module ever sees a [`Record`].

use serde::{Serialize, Deserialize};
use serde_json::Value;

pub mod version;
pub use version::ArtifactVersion;
pub mod version_range;
pub use version_range::VersionRequirement;
pub use version_range::VersionBounds;

/// An untyped key-value record as supplied by the host.
pub type Record = serde_json::Map<String, Value>;

/// Packaging used when a record does not name one.
pub const DEFAULT_PACKAGING: &str = "jar";

/// Matches any group or module in an [`Exclusion`].
pub const WILDCARD: &str = "*";

/// Uniquely identifies an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyCoordinate {
	group: String,
	module: String,
	version: String,
	packaging: String,
}

impl DependencyCoordinate {
	pub fn new(group: impl Into<String>, module: impl Into<String>, version: impl Into<String>) -> Self {
		Self::with_packaging(group, module, version, DEFAULT_PACKAGING)
	}

	pub fn with_packaging(group: impl Into<String>, module: impl Into<String>, version: impl Into<String>, packaging: impl Into<String>) -> Self {
		Self {
			group: group.into(),
			module: module.into(),
			version: version.into(),
			packaging: packaging.into(),
		}
	}

	pub fn group(&self) -> &str {
		&self.group
	}

	pub fn module(&self) -> &str {
		&self.module
	}

	pub fn version(&self) -> &str {
		&self.version
	}

	pub fn packaging(&self) -> &str {
		&self.packaging
	}

	/// Parses the version field, it may be a range or wildcard.
	pub fn version_requirement(&self) -> crate::Result<VersionRequirement> {
		VersionRequirement::parse(&self.version)
	}

	/// Copy of this coordinate pointing at another version.
	pub fn with_version(&self, version: impl Into<String>) -> Self {
		Self {
			version: version.into(),
			..self.clone()
		}
	}

	/// The coordinate without its version, used to detect two versions of the same artifact.
	pub fn key(&self) -> ArtifactKey {
		ArtifactKey {
			group: self.group.clone(),
			module: self.module.clone(),
			packaging: self.packaging.clone(),
		}
	}
}

impl std::fmt::Display for DependencyCoordinate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.packaging == DEFAULT_PACKAGING {
			write!(f, "{}:{}:{}", self.group, self.module, self.version)
		} else {
			write!(f, "{}:{}:{}:{}", self.group, self.module, self.packaging, self.version)
		}
	}
}

/// A coordinate minus its version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactKey {
	pub group: String,
	pub module: String,
	pub packaging: String,
}

impl std::fmt::Display for ArtifactKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}:{}", self.group, self.module, self.packaging)
	}
}

/// Removes a `(group, module)` pair, or with [`WILDCARD`]s everything, from a transitive walk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exclusion {
	pub group: String,
	pub module: String,
}

impl Exclusion {
	pub fn new(group: impl Into<String>, module: impl Into<String>) -> Self {
		Self { group: group.into(), module: module.into() }
	}

	/// The `*:*` exclusion, nothing beneath a dependency carrying it is resolved.
	pub fn wildcard() -> Self {
		Self::new(WILDCARD, WILDCARD)
	}

	pub fn is_wildcard(&self) -> bool {
		self.group == WILDCARD && self.module == WILDCARD
	}

	pub fn matches(&self, group: &str, module: &str) -> bool {
		(self.group == WILDCARD || self.group == group) && (self.module == WILDCARD || self.module == module)
	}
}

impl std::fmt::Display for Exclusion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.group, self.module)
	}
}

/// A dependency record after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyRequest {
	pub coordinate: DependencyCoordinate,
	pub transitive: bool,
}

fn required_string(record: &Record, key: &str, what: &str) -> crate::Result<String> {
	match record.get(key) {
		Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
		Some(Value::String(_)) => Err(crate::Error::InvalidCoordinate(format!("{} has an empty \"{}\"", what, key))),
		Some(Value::Null) | None => Err(crate::Error::InvalidCoordinate(format!("{} is missing \"{}\"", what, key))),
		Some(other) => Err(crate::Error::InvalidCoordinate(format!("{} has a non string \"{}\": {}", what, key, other))),
	}
}

/// Extracts `group`, `module`, `version` and the optional `transitive` and `ext` fields.
///
/// # Errors
/// [`InvalidCoordinate`](crate::Error::InvalidCoordinate) when a required field is absent, empty or not a string,
/// when `transitive` is not a boolean, or when `version` is not a valid version, range or wildcard.
pub fn parse_dependency(record: &Record) -> crate::Result<DependencyRequest> {
	let group = required_string(record, "group", "dependency")?;
	let module = required_string(record, "module", "dependency")?;
	let version = required_string(record, "version", "dependency")?;

	VersionRequirement::parse(&version)
		.map_err(|e| crate::Error::InvalidCoordinate(format!("{}:{} has an invalid version: {}", group, module, e)))?;

	let packaging = match record.get("ext") {
		Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
		Some(Value::Null) | None => DEFAULT_PACKAGING.to_string(),
		Some(other) => return Err(crate::Error::InvalidCoordinate(format!("{}:{} has an invalid \"ext\": {}", group, module, other))),
	};

	let transitive = match record.get("transitive") {
		Some(Value::Bool(b)) => *b,
		Some(Value::Null) | None => true,
		Some(other) => return Err(crate::Error::InvalidCoordinate(format!("{}:{} has a non boolean \"transitive\": {}", group, module, other))),
	};

	Ok(DependencyRequest {
		coordinate: DependencyCoordinate::with_packaging(group, module, version, packaging),
		transitive,
	})
}

pub fn parse_exclusion(record: &Record) -> crate::Result<Exclusion> {
	Ok(Exclusion {
		group: required_string(record, "group", "exclusion")?,
		module: required_string(record, "module", "exclusion")?,
	})
}

/// Reads the `excludes` list of an options record, absent or null yields no exclusions.
pub fn parse_exclusions(record: &Record) -> crate::Result<Vec<Exclusion>> {
	match record.get("excludes") {
		Some(Value::Null) | None => Ok(Vec::new()),
		Some(Value::Array(entries)) => {
			entries.iter().map(|entry| {
				match entry {
					Value::Object(exclusion) => parse_exclusion(exclusion),
					other => Err(crate::Error::InvalidCoordinate(format!("exclusion is not a record: {}", other))),
				}
			}).collect()
		},
		Some(other) => Err(crate::Error::InvalidCoordinate(format!("\"excludes\" is not a list: {}", other))),
	}
}
