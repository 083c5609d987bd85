use serde::{Serialize, Deserialize};

use super::version::ArtifactVersion;

/// One end of a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bound<T> {
	pub version: T,
	pub inclusive: bool,
}

/// A generic enum to describe a range of versions.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub enum VersionBounds<T>
where T: std::cmp::PartialEq + std::cmp::Ord + std::clone::Clone,
{
	#[default] Any,
	Explicit(T),
	MinOnly(Bound<T>),
	MaxOnly(Bound<T>),
	MinMax(Bound<T>, Bound<T>),
}

impl<T> VersionBounds<T>
where T: std::cmp::PartialEq + std::cmp::Ord + std::clone::Clone,
{
	pub fn is_version_within(&self, other: &T) -> bool {
		match self {
			VersionBounds::Any => true,
			VersionBounds::Explicit(v) => other == v,
			VersionBounds::MinOnly(min) => Self::is_above(min, other),
			VersionBounds::MaxOnly(max) => Self::is_below(max, other),
			VersionBounds::MinMax(min, max) => Self::is_above(min, other) && Self::is_below(max, other),
		}
	}

	fn is_above(min: &Bound<T>, other: &T) -> bool {
		if min.inclusive { other >= &min.version } else { other > &min.version }
	}

	fn is_below(max: &Bound<T>, other: &T) -> bool {
		if max.inclusive { other <= &max.version } else { other < &max.version }
	}
}

pub type ArtifactVersionBounds = VersionBounds<ArtifactVersion>;

/// The version half of a coordinate as written by a caller or a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VersionRequirement {
	/// A single version such as `1.0`, used as is.
	Concrete(ArtifactVersion),
	/// A maven style range (`[1.0,2.0)`) or a wildcard (`*`, `+`, `latest`, `release`).
	Range(ArtifactVersionBounds),
	/// An ivy style dynamic revision such as `1.2.+`, matches every version starting with the prefix.
	Prefix(String),
}

impl VersionRequirement {
	pub fn parse(requirement: &str) -> crate::Result<Self> {
		let requirement = requirement.trim();
		match requirement {
			"" | "*" | "+" => return Ok(VersionRequirement::Range(VersionBounds::Any)),
			r if r.eq_ignore_ascii_case("latest") || r.eq_ignore_ascii_case("release")
				|| r.eq_ignore_ascii_case("latest.release") || r.eq_ignore_ascii_case("latest.integration") => {
				return Ok(VersionRequirement::Range(VersionBounds::Any))
			},
			_ => {},
		}

		if let Some(prefix) = requirement.strip_suffix('+') {
			return Ok(VersionRequirement::Prefix(prefix.to_string()));
		}

		if requirement.starts_with(|c| c == '[' || c == '(') {
			return Self::parse_range(requirement).map(VersionRequirement::Range);
		}

		Ok(VersionRequirement::Concrete(ArtifactVersion::new(requirement)?))
	}

	fn parse_range(range: &str) -> crate::Result<ArtifactVersionBounds> {
		let invalid = |reason: &str| crate::Error::Parse(format!("invalid version range \"{}\": {}", range, reason));

		/* Unions such as `[1.0,2.0),[3.0,)` are not supported */
		let lower_inclusive = range.starts_with('[');
		let upper_inclusive = if range.ends_with(']') {
			true
		} else if range.ends_with(')') {
			false
		} else {
			return Err(invalid("missing closing bracket"));
		};
		let inner = &range[1..range.len() - 1];

		let bound = |s: &str, inclusive: bool| -> crate::Result<Option<Bound<ArtifactVersion>>> {
			let s = s.trim();
			if s.is_empty() {
				Ok(None)
			} else {
				Ok(Some(Bound { version: ArtifactVersion::new(s)?, inclusive }))
			}
		};

		match inner.split_once(',') {
			None => {
				if !(lower_inclusive && upper_inclusive) {
					return Err(invalid("a single version must be written as [version]"));
				}
				let v = ArtifactVersion::new(inner).map_err(|_| invalid("empty version"))?;
				Ok(VersionBounds::Explicit(v))
			},
			Some((lower, upper)) => {
				if upper.contains(',') {
					return Err(invalid("unions of ranges are not supported"));
				}
				match (bound(lower, lower_inclusive)?, bound(upper, upper_inclusive)?) {
					(None, None) => Ok(VersionBounds::Any),
					(Some(min), None) => Ok(VersionBounds::MinOnly(min)),
					(None, Some(max)) => Ok(VersionBounds::MaxOnly(max)),
					(Some(min), Some(max)) => {
						if min.version > max.version {
							Err(invalid("lower bound is greater than upper bound"))
						} else {
							Ok(VersionBounds::MinMax(min, max))
						}
					},
				}
			},
		}
	}

	/// Gets the version when no lookup is needed.
	pub fn as_concrete(&self) -> Option<&ArtifactVersion> {
		match self {
			VersionRequirement::Concrete(v) => Some(v),
			VersionRequirement::Range(VersionBounds::Explicit(v)) => Some(v),
			_ => None,
		}
	}

	pub fn is_concrete(&self) -> bool {
		self.as_concrete().is_some()
	}

	pub fn matches(&self, version: &ArtifactVersion) -> bool {
		match self {
			VersionRequirement::Concrete(v) => v == version,
			VersionRequirement::Range(bounds) => bounds.is_version_within(version),
			VersionRequirement::Prefix(prefix) => version.as_str().starts_with(prefix.as_str()),
		}
	}

	/// Picks the highest version from `available` satisfying the requirement.
	pub fn select_highest<'v>(&self, available: impl IntoIterator<Item = &'v ArtifactVersion>) -> Option<&'v ArtifactVersion> {
		let wants_release = !matches!(self, VersionRequirement::Concrete(_));
		let matching: Vec<&ArtifactVersion> = available.into_iter().filter(|v| self.matches(v)).collect();
		/* Snapshots are only picked for dynamic requirements when nothing else matches */
		let releases = matching.iter().copied().filter(|v| !v.is_snapshot()).max();
		if wants_release && releases.is_some() {
			releases
		} else {
			matching.into_iter().max()
		}
	}
}

impl std::fmt::Display for VersionRequirement {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		fn lower(b: &Bound<ArtifactVersion>) -> String {
			format!("{}{}", if b.inclusive { '[' } else { '(' }, b.version)
		}
		fn upper(b: &Bound<ArtifactVersion>) -> String {
			format!("{}{}", b.version, if b.inclusive { ']' } else { ')' })
		}
		match self {
			VersionRequirement::Concrete(v) => write!(f, "{}", v),
			VersionRequirement::Prefix(p) => write!(f, "{}+", p),
			VersionRequirement::Range(bounds) => match bounds {
				VersionBounds::Any => write!(f, "*"),
				VersionBounds::Explicit(v) => write!(f, "[{}]", v),
				VersionBounds::MinOnly(min) => write!(f, "{},)", lower(min)),
				VersionBounds::MaxOnly(max) => write!(f, "(,{}", upper(max)),
				VersionBounds::MinMax(min, max) => write!(f, "{},{}", lower(min), upper(max)),
			},
		}
	}
}
