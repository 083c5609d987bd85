//! `maven-metadata.xml`, the list of versions a repository holds for one module.

use crate::coordinate::ArtifactVersion;
use super::ResolutionError;
use super::xml::XmlNode;

pub const METADATA_FILE: &str = "maven-metadata.xml";

/// Reads every `<versioning><versions><version>` entry, unparsable versions are skipped.
pub fn parse_versions(xml: &str, location: &str) -> Result<Vec<ArtifactVersion>, ResolutionError> {
	let metadata = XmlNode::parse(xml).map_err(|reason| ResolutionError::MalformedDescriptor { location: location.to_string(), reason })?;
	if metadata.name != "metadata" {
		return Err(ResolutionError::MalformedDescriptor {
			location: location.to_string(),
			reason: format!("root element is <{}>, expected <metadata>", metadata.name),
		});
	}

	let Some(versions) = metadata.descend(&["versioning", "versions"]) else {
		return Ok(Vec::new());
	};
	Ok(versions.children_named("version").filter_map(|v| ArtifactVersion::new(&v.text).ok()).collect())
}

/// Adds `more` to `versions` without duplicates.
///
/// Versions are kept by spelling, `1.0` and `1.0.0` compare equal but live in different directories.
pub fn merge_versions(versions: &mut Vec<ArtifactVersion>, more: Vec<ArtifactVersion>) {
	for version in more {
		if !versions.iter().any(|v| v.as_str() == version.as_str()) {
			versions.push(version);
		}
	}
}
