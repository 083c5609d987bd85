use serde::*;

/// A concrete artifact version such as `2.0`, `1.7.36` or `32.1.2-jre`.
///
/// # Ordering
/// Versions are compared left to right by alternately splitting off a run of non-digit characters
/// and a run of digit characters. Non-digit runs compare lexically, digit runs compare numerically
/// (an empty run counts as zero).
///
/// When one version is a prefix of the other the leftover part decides:
/// - a qualifier starting with a letter (`-SNAPSHOT`, `-rc1`, `-beta`) marks a pre-release and sorts lower,
/// - `-ga`, `-final` and `-release` are equal to the bare version,
/// - trailing zero components are equal to the bare version (`1.0` == `1.0.0`),
/// - `-sp` (service pack) sorts higher,
/// - anything else (more numeric components) sorts higher.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct ArtifactVersion {
	version: String,
}

impl ArtifactVersion {
	pub fn new(version: &str) -> crate::Result<Self> {
		let version = version.trim();
		if version.is_empty() {
			return Err(crate::Error::Parse("version string is empty".to_string()));
		}
		if version.contains(char::is_whitespace) {
			return Err(crate::Error::Parse(format!("version \"{}\" contains whitespace", version)));
		}
		Ok(ArtifactVersion { version: version.to_string() })
	}

	pub fn as_str(&self) -> &str {
		&self.version
	}

	pub fn is_snapshot(&self) -> bool {
		self.version.ends_with("-SNAPSHOT")
	}
}

impl TryFrom<&str> for ArtifactVersion {
	type Error = crate::Error;
	fn try_from(value: &str) -> Result<Self, Self::Error> { Self::new(value) }
}

impl TryFrom<String> for ArtifactVersion {
	type Error = crate::Error;
	fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(&value) }
}

impl PartialEq for ArtifactVersion {
	fn eq(&self, other: &Self) -> bool {
		without_trailing_zeros(&self.version) == without_trailing_zeros(&other.version)
	}
}

const SEPARATORS: &[char] = &['.', '-', '_'];

fn split_until_numeric(s: &str) -> (&str, &str) {
	match s.find(|c: char| c.is_ascii_digit()) {
		Some(i) => s.split_at(i),
		None => (s, ""),
	}
}

fn split_until_not_numeric(s: &str) -> (&str, &str) {
	match s.find(|c: char| !c.is_ascii_digit()) {
		Some(i) => s.split_at(i),
		None => (s, ""),
	}
}

/// `1.0.0` and `1.0` become `1`, the first component is always kept.
fn without_trailing_zeros(version: &str) -> &str {
	let mut version = version;
	while let Some(i) = version.rfind(SEPARATORS) {
		let component = &version[i + 1..];
		if i == 0 || component.is_empty() || !component.chars().all(|c| c == '0') {
			break;
		}
		version = &version[..i];
	}
	version
}

/// Compares two runs of ascii digits without parsing so arbitrarily long build numbers work.
fn compare_numeric(lhs: &str, rhs: &str) -> std::cmp::Ordering {
	let lhs = lhs.trim_start_matches('0');
	let rhs = rhs.trim_start_matches('0');
	lhs.len().cmp(&rhs.len()).then_with(|| lhs.cmp(rhs))
}

/// Weight of whatever is left over once the shared part of two versions has been consumed.
fn remainder_weight(rest: &str) -> std::cmp::Ordering {
	use std::cmp::Ordering;

	/* Zero components only matter for what follows them, `.0-rc1` weighs like `-rc1` */
	let mut rest = rest;
	loop {
		let (zeros, after) = split_until_not_numeric(rest.trim_start_matches(SEPARATORS));
		if zeros.is_empty() || !zeros.chars().all(|c| c == '0') || !(after.is_empty() || after.starts_with(SEPARATORS)) {
			break;
		}
		rest = after;
	}

	if rest.is_empty() {
		return Ordering::Equal;
	}
	let qualifier = rest.trim_start_matches(SEPARATORS).to_ascii_lowercase();
	match qualifier.as_str() {
		"" | "ga" | "final" | "release" => Ordering::Equal,
		q if q.starts_with("sp") => Ordering::Greater,
		q if q.starts_with(|c: char| c.is_ascii_alphabetic()) => Ordering::Less,
		_ => Ordering::Greater,
	}
}

impl Ord for ArtifactVersion {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		use std::cmp::Ordering;

		let lhs_version = without_trailing_zeros(&self.version);
		let rhs_version = without_trailing_zeros(&other.version);
		let mut lhs: (&str, &str) = ("", lhs_version);
		let mut rhs: (&str, &str) = ("", rhs_version);

		while !lhs.1.is_empty() && !rhs.1.is_empty() {
			let (lhs_text, lhs_rest) = split_until_numeric(lhs.1);
			let (rhs_text, rhs_rest) = split_until_numeric(rhs.1);

			/* A separator on one side against a qualifier on the other, e.g. `1.0.1` vs `1.0-rc1` */
			if lhs_text != rhs_text {
				let lhs_qualified = lhs_text.trim_start_matches(SEPARATORS);
				let rhs_qualified = rhs_text.trim_start_matches(SEPARATORS);
				if lhs_qualified.is_empty() != rhs_qualified.is_empty() {
					return if lhs_qualified.is_empty() { Ordering::Greater } else { Ordering::Less };
				}
				match lhs_qualified.to_ascii_lowercase().cmp(&rhs_qualified.to_ascii_lowercase()) {
					Ordering::Equal => {},
					ord => return ord,
				}
			}

			let (lhs_num, lhs_rest) = split_until_not_numeric(lhs_rest);
			let (rhs_num, rhs_rest) = split_until_not_numeric(rhs_rest);

			match compare_numeric(lhs_num, rhs_num) {
				Ordering::Equal => {},
				ord => return ord,
			}

			lhs = ("", lhs_rest);
			rhs = ("", rhs_rest);
		}

		remainder_weight(lhs.1).cmp(&remainder_weight(rhs.1))
			.then_with(|| lhs.1.len().cmp(&rhs.1.len()))
			.then_with(|| lhs_version.cmp(rhs_version))
	}
}

impl PartialOrd for ArtifactVersion {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl std::hash::Hash for ArtifactVersion {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		without_trailing_zeros(&self.version).hash(state);
	}
}

impl std::fmt::Display for ArtifactVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.version)
	}
}
