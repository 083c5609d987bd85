//! Project descriptors (`.pom` files).
//!
//! A [`RawPom`] is what one file says. An [`EffectivePom`] is the result of walking its `<parent>` chain,
//! merging properties and dependency management, importing `import` scoped boms and interpolating
//! `${...}` references.

use std::collections::HashMap;
use std::rc::Rc;

use regex::Regex;

use crate::coordinate::*;
use crate::dependency::Scope;
use super::ResolutionError;
use super::xml::XmlNode;

/// `<parent>` chains and bom imports longer than this are cut off with a warning.
pub const MAX_INHERITANCE_DEPTH: usize = 16;

/// How many times nested property references are expanded.
const MAX_INTERPOLATION_PASSES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
	pub group: String,
	pub module: String,
	pub version: String,
}

/// A `<dependency>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomDependency {
	pub group: String,
	pub module: String,
	pub version: Option<String>,
	/// `<type>`, `jar` when absent.
	pub packaging: String,
	pub scope: Option<String>,
	pub optional: bool,
	pub exclusions: Vec<Exclusion>,
}

impl PomDependency {
	pub fn key(&self) -> ArtifactKey {
		ArtifactKey { group: self.group.clone(), module: self.module.clone(), packaging: self.packaging.clone() }
	}

	pub fn scope(&self) -> Scope {
		self.scope.as_deref().map(Scope::parse).unwrap_or_default()
	}

	fn interpolate(&mut self, properties: &Properties) {
		self.group = properties.interpolate(&self.group);
		self.module = properties.interpolate(&self.module);
		self.version = self.version.as_deref().map(|v| properties.interpolate(v));
		self.packaging = properties.interpolate(&self.packaging);
		self.scope = self.scope.as_deref().map(|s| properties.interpolate(s));
		for exclusion in &mut self.exclusions {
			exclusion.group = properties.interpolate(&exclusion.group);
			exclusion.module = properties.interpolate(&exclusion.module);
		}
	}
}

/// One descriptor as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPom {
	/// Absent when inherited from the parent.
	pub group: Option<String>,
	pub module: String,
	pub version: Option<String>,
	pub packaging: String,
	pub parent: Option<ParentRef>,
	/// Declaration order is kept so later definitions win predictably.
	pub properties: Vec<(String, String)>,
	pub dependency_management: Vec<PomDependency>,
	pub dependencies: Vec<PomDependency>,
}

impl RawPom {
	/// `location` only labels errors.
	pub fn parse(xml: &str, location: &str) -> Result<RawPom, ResolutionError> {
		let malformed = |reason: String| ResolutionError::MalformedDescriptor { location: location.to_string(), reason };

		let project = XmlNode::parse(xml).map_err(malformed)?;
		if project.name != "project" {
			return Err(malformed(format!("root element is <{}>, expected <project>", project.name)));
		}

		let parent = match project.child("parent") {
			Some(p) => Some(ParentRef {
				group: p.child_text("groupId").ok_or_else(|| malformed("parent has no groupId".to_string()))?.to_string(),
				module: p.child_text("artifactId").ok_or_else(|| malformed("parent has no artifactId".to_string()))?.to_string(),
				version: p.child_text("version").ok_or_else(|| malformed("parent has no version".to_string()))?.to_string(),
			}),
			None => None,
		};

		let module = project.child_text("artifactId").ok_or_else(|| malformed("project has no artifactId".to_string()))?.to_string();

		let properties = project.child("properties")
			.map(|p| p.children.iter().map(|c| (c.name.clone(), c.text.clone())).collect())
			.unwrap_or_default();

		let dependency_management = match project.descend(&["dependencyManagement", "dependencies"]) {
			Some(deps) => Self::parse_dependencies(deps).map_err(malformed)?,
			None => Vec::new(),
		};
		let dependencies = match project.child("dependencies") {
			Some(deps) => Self::parse_dependencies(deps).map_err(malformed)?,
			None => Vec::new(),
		};

		Ok(RawPom {
			group: project.child_text("groupId").map(str::to_string),
			module,
			version: project.child_text("version").map(str::to_string),
			packaging: project.child_text("packaging").unwrap_or(DEFAULT_PACKAGING).to_string(),
			parent,
			properties,
			dependency_management,
			dependencies,
		})
	}

	fn parse_dependencies(dependencies: &XmlNode) -> Result<Vec<PomDependency>, String> {
		dependencies.children_named("dependency").map(|d| -> Result<PomDependency, String> {
			let group = d.child_text("groupId").ok_or("dependency has no groupId")?;
			let module = d.child_text("artifactId").ok_or_else(|| format!("dependency in {} has no artifactId", group))?;
			let exclusions = match d.child("exclusions") {
				Some(e) => e.children_named("exclusion").map(|x| -> Result<Exclusion, String> {
					Ok(Exclusion::new(
						x.child_text("groupId").unwrap_or(WILDCARD),
						x.child_text("artifactId").ok_or_else(|| format!("exclusion on {}:{} has no artifactId", group, module))?,
					))
				}).collect::<Result<Vec<_>, String>>()?,
				None => Vec::new(),
			};
			Ok(PomDependency {
				group: group.to_string(),
				module: module.to_string(),
				version: d.child_text("version").map(str::to_string),
				packaging: d.child_text("type").unwrap_or(DEFAULT_PACKAGING).to_string(),
				scope: d.child_text("scope").map(str::to_string),
				optional: d.child_text("optional").map(|o| o.eq_ignore_ascii_case("true")).unwrap_or(false),
				exclusions,
			})
		}).collect()
	}

	/// The group, falling back to the parent's.
	pub fn group(&self) -> Option<&str> {
		self.group.as_deref().or(self.parent.as_ref().map(|p| p.group.as_str()))
	}

	/// The version, falling back to the parent's.
	pub fn version(&self) -> Option<&str> {
		self.version.as_deref().or(self.parent.as_ref().map(|p| p.version.as_str()))
	}
}

/// Supplies raw descriptors, `None` when no repository has one.
pub trait PomSource {
	fn raw_pom(&mut self, coordinate: &DependencyCoordinate) -> Result<Option<Rc<RawPom>>, ResolutionError>;
}

impl PomSource for HashMap<DependencyCoordinate, Rc<RawPom>> {
	fn raw_pom(&mut self, coordinate: &DependencyCoordinate) -> Result<Option<Rc<RawPom>>, ResolutionError> {
		Ok(self.get(coordinate).cloned())
	}
}

/// Property values used to expand `${name}` references.
#[derive(Debug, Clone, Default)]
pub struct Properties {
	values: HashMap<String, String>,
}

impl Properties {
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.values.insert(name.into(), value.into());
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.values.get(name).map(String::as_str)
	}

	/// Unknown references are left as written.
	pub fn interpolate(&self, text: &str) -> String {
		if !text.contains("${") {
			return text.to_string();
		}
		/* The pattern is a literal, it always compiles */
		let Ok(reference) = Regex::new(r"\$\{([^}]+)\}") else { return text.to_string() };

		let mut current = text.to_string();
		for _ in 0..MAX_INTERPOLATION_PASSES {
			let next = reference.replace_all(&current, |caps: &regex::Captures| {
				self.get(&caps[1]).map(str::to_string).unwrap_or_else(|| caps[0].to_string())
			}).into_owned();
			if next == current {
				break;
			}
			current = next;
		}
		current
	}
}

/// A descriptor with inheritance and interpolation applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePom {
	pub coordinate: DependencyCoordinate,
	pub dependency_management: Vec<PomDependency>,
	/// With versions from dependency management filled in where they were left out.
	pub dependencies: Vec<PomDependency>,
}

impl EffectivePom {
	/// Builds the effective descriptor of `coordinate`.
	///
	/// `Ok(None)` when `source` has no descriptor for it. A missing parent is logged and the chain ends there.
	pub fn build(coordinate: &DependencyCoordinate, source: &mut dyn PomSource) -> Result<Option<EffectivePom>, ResolutionError> {
		Self::build_at_depth(coordinate, source, 0)
	}

	fn build_at_depth(coordinate: &DependencyCoordinate, source: &mut dyn PomSource, depth: usize) -> Result<Option<EffectivePom>, ResolutionError> {
		let pom_coordinate = |group: &str, module: &str, version: &str| DependencyCoordinate::with_packaging(group, module, version, "pom");

		let Some(pom) = source.raw_pom(&pom_coordinate(coordinate.group(), coordinate.module(), coordinate.version()))? else {
			return Ok(None);
		};

		/* Child first */
		let mut chain = vec![pom];
		while let Some(parent) = chain.last().and_then(|p| p.parent.clone()) {
			if chain.len() > MAX_INHERITANCE_DEPTH {
				log::warn!("Parent chain of {} is longer than {}, ignoring the rest", coordinate, MAX_INHERITANCE_DEPTH);
				break;
			}
			match source.raw_pom(&pom_coordinate(&parent.group, &parent.module, &parent.version))? {
				Some(p) => chain.push(p),
				None => {
					log::warn!("Parent {}:{}:{} of {} not found, ignoring it", parent.group, parent.module, parent.version, coordinate);
					break;
				},
			}
		}

		let properties = Self::properties(&chain, coordinate);

		/* Nearest declaration of a key wins */
		let mut dependency_management: Vec<PomDependency> = Vec::new();
		for pom in &chain {
			for managed in &pom.dependency_management {
				let mut managed = managed.clone();
				managed.interpolate(&properties);
				if !dependency_management.iter().any(|m| m.key() == managed.key()) {
					dependency_management.push(managed);
				}
			}
		}
		Self::import_boms(&mut dependency_management, source, depth, coordinate)?;

		/* Parent dependencies first, a child redeclaring one replaces it in place */
		let mut dependencies: Vec<PomDependency> = Vec::new();
		for pom in chain.iter().rev() {
			for dependency in &pom.dependencies {
				let mut dependency = dependency.clone();
				dependency.interpolate(&properties);
				match dependencies.iter_mut().find(|d| d.key() == dependency.key()) {
					Some(existing) => *existing = dependency,
					None => dependencies.push(dependency),
				}
			}
		}

		for dependency in &mut dependencies {
			if let Some(managed) = dependency_management.iter().find(|m| m.key() == dependency.key()) {
				if dependency.version.is_none() {
					dependency.version = managed.version.clone();
				}
				if dependency.scope.is_none() {
					dependency.scope = managed.scope.clone();
				}
				if dependency.exclusions.is_empty() {
					dependency.exclusions = managed.exclusions.clone();
				}
			}
		}

		Ok(Some(EffectivePom {
			coordinate: coordinate.clone(),
			dependency_management,
			dependencies,
		}))
	}

	fn properties(chain: &[Rc<RawPom>], coordinate: &DependencyCoordinate) -> Properties {
		let mut properties = Properties::default();
		/* Root ancestor first so descendants override */
		for pom in chain.iter().rev() {
			for (name, value) in &pom.properties {
				properties.insert(name.clone(), value.clone());
			}
		}

		if let Some(pom) = chain.first() {
			let group = pom.group().unwrap_or(coordinate.group()).to_string();
			let version = pom.version().unwrap_or(coordinate.version()).to_string();
			for prefix in ["project.", "pom.", ""] {
				properties.insert(format!("{}groupId", prefix), group.clone());
				properties.insert(format!("{}artifactId", prefix), pom.module.clone());
				properties.insert(format!("{}version", prefix), version.clone());
			}
			if let Some(parent) = &pom.parent {
				properties.insert("project.parent.groupId", parent.group.clone());
				properties.insert("project.parent.artifactId", parent.module.clone());
				properties.insert("project.parent.version", parent.version.clone());
			}
		}
		properties
	}

	/// Replaces `import` scoped `pom` entries with the dependency management of the bom they name.
	fn import_boms(management: &mut Vec<PomDependency>, source: &mut dyn PomSource, depth: usize, coordinate: &DependencyCoordinate) -> Result<(), ResolutionError> {
		let is_import = |m: &PomDependency| m.packaging == "pom" && m.scope() == Scope::Import;
		if !management.iter().any(is_import) {
			return Ok(());
		}
		if depth >= MAX_INHERITANCE_DEPTH {
			log::warn!("Bom imports of {} nest deeper than {}, ignoring them", coordinate, MAX_INHERITANCE_DEPTH);
			management.retain(|m| !is_import(m));
			return Ok(());
		}

		let (imports, mut merged): (Vec<PomDependency>, Vec<PomDependency>) = management.drain(..).partition(is_import);
		for import in imports {
			let Some(version) = import.version.as_deref() else {
				log::warn!("Bom {}:{} imported by {} has no version, ignoring it", import.group, import.module, coordinate);
				continue;
			};
			let bom = DependencyCoordinate::with_packaging(&import.group, &import.module, version, "pom");
			match Self::build_at_depth(&bom, source, depth + 1)? {
				Some(bom) => {
					for managed in bom.dependency_management {
						if !merged.iter().any(|m| m.key() == managed.key()) {
							merged.push(managed);
						}
					}
				},
				None => log::warn!("Bom {} imported by {} not found, ignoring it", bom, coordinate),
			}
		}
		*management = merged;
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn pom(xml: &str) -> Rc<RawPom> { Rc::new(RawPom::parse(xml, "test.pom").unwrap()) }
	fn key(g: &str, m: &str, v: &str) -> DependencyCoordinate { DependencyCoordinate::with_packaging(g, m, v, "pom") }

	const LIB: &str = r#"<project xmlns="http://maven.apache.org/POM/4.0.0">
		<modelVersion>4.0.0</modelVersion>
		<groupId>com.example</groupId>
		<artifactId>lib</artifactId>
		<version>1.0</version>
		<dependencies>
			<dependency><groupId>com.example</groupId><artifactId>helper</artifactId><version>2.0</version></dependency>
			<dependency><groupId>junit</groupId><artifactId>junit</artifactId><version>4.13</version><scope>test</scope></dependency>
			<dependency>
				<groupId>org.slf4j</groupId><artifactId>slf4j-api</artifactId><version>1.7.36</version><optional>true</optional>
				<exclusions><exclusion><groupId>*</groupId><artifactId>*</artifactId></exclusion></exclusions>
			</dependency>
		</dependencies>
	</project>"#;

	const PARENT: &str = r#"<project>
		<groupId>com.example</groupId>
		<artifactId>parent</artifactId>
		<version>3</version>
		<packaging>pom</packaging>
		<properties><helper.version>2.1</helper.version></properties>
		<dependencyManagement><dependencies>
			<dependency><groupId>com.example</groupId><artifactId>helper</artifactId><version>${helper.version}</version></dependency>
		</dependencies></dependencyManagement>
		<dependencies>
			<dependency><groupId>com.example</groupId><artifactId>common</artifactId><version>${project.version}</version></dependency>
		</dependencies>
	</project>"#;

	const CHILD: &str = r#"<project>
		<parent><groupId>com.example</groupId><artifactId>parent</artifactId><version>3</version></parent>
		<artifactId>child</artifactId>
		<dependencies>
			<dependency><groupId>com.example</groupId><artifactId>helper</artifactId></dependency>
			<dependency><groupId>${project.groupId}</groupId><artifactId>sibling</artifactId><version>${project.parent.version}</version></dependency>
		</dependencies>
	</project>"#;

	#[test]
	fn parse_reads_dependencies() {
		let p = pom(LIB);
		assert_eq!(p.dependencies.len(), 3);
		assert_eq!(p.dependencies[1].scope(), Scope::Test);
		assert!(p.dependencies[2].optional);
		assert_eq!(p.dependencies[2].exclusions, vec![Exclusion::wildcard()]);
	}

	#[test] fn parse_rejects_non_project() { assert!(matches!(RawPom::parse("<metadata/>", "x"), Err(ResolutionError::MalformedDescriptor { .. }))) }
	#[test] fn parse_rejects_broken_xml() { assert!(matches!(RawPom::parse("<project><artifactId>a</project>", "x"), Err(ResolutionError::MalformedDescriptor { .. }))) }
	#[test] fn child_inherits_group_and_version() { assert_eq!(pom(CHILD).version(), Some("3")) }

	#[test]
	fn effective_pom_applies_parent() {
		let mut source: HashMap<DependencyCoordinate, Rc<RawPom>> = HashMap::new();
		source.insert(key("com.example", "parent", "3"), pom(PARENT));
		source.insert(key("com.example", "child", "3"), pom(CHILD));
		let effective = EffectivePom::build(&DependencyCoordinate::new("com.example", "child", "3"), &mut source).unwrap().unwrap();

		let deps: Vec<(String, Option<String>)> = effective.dependencies.iter().map(|d| (d.module.clone(), d.version.clone())).collect();
		assert_eq!(deps, vec![
			("common".to_string(), Some("3".to_string())),
			("helper".to_string(), Some("2.1".to_string())),
			("sibling".to_string(), Some("3".to_string())),
		]);
	}

	#[test]
	fn missing_parent_is_tolerated() {
		let mut source: HashMap<DependencyCoordinate, Rc<RawPom>> = HashMap::new();
		source.insert(key("com.example", "child", "3"), pom(CHILD));
		let effective = EffectivePom::build(&DependencyCoordinate::new("com.example", "child", "3"), &mut source).unwrap().unwrap();
		assert_eq!(effective.dependencies[0].version, None);
	}

	#[test]
	fn missing_pom_is_none() {
		let mut source: HashMap<DependencyCoordinate, Rc<RawPom>> = HashMap::new();
		assert!(EffectivePom::build(&DependencyCoordinate::new("g", "m", "1"), &mut source).unwrap().is_none());
	}

	#[test]
	fn bom_import_supplies_management() {
		let bom = r#"<project><groupId>com.example</groupId><artifactId>bom</artifactId><version>1</version><packaging>pom</packaging>
			<dependencyManagement><dependencies>
				<dependency><groupId>com.example</groupId><artifactId>helper</artifactId><version>9.0</version></dependency>
			</dependencies></dependencyManagement></project>"#;
		let app = r#"<project><groupId>com.example</groupId><artifactId>app</artifactId><version>1</version>
			<dependencyManagement><dependencies>
				<dependency><groupId>com.example</groupId><artifactId>bom</artifactId><version>1</version><type>pom</type><scope>import</scope></dependency>
			</dependencies></dependencyManagement>
			<dependencies><dependency><groupId>com.example</groupId><artifactId>helper</artifactId></dependency></dependencies></project>"#;
		let mut source: HashMap<DependencyCoordinate, Rc<RawPom>> = HashMap::new();
		source.insert(key("com.example", "bom", "1"), pom(bom));
		source.insert(key("com.example", "app", "1"), pom(app));
		let effective = EffectivePom::build(&DependencyCoordinate::new("com.example", "app", "1"), &mut source).unwrap().unwrap();
		assert_eq!(effective.dependencies[0].version.as_deref(), Some("9.0"));
	}

	#[test]
	fn nested_properties_expand() {
		let mut p = Properties::default();
		p.insert("a", "${b}-x");
		p.insert("b", "1.0");
		assert_eq!(p.interpolate("${a}"), "1.0-x");
	}

	#[test] fn unknown_property_is_kept() { assert_eq!(Properties::default().interpolate("${nope}"), "${nope}") }

	#[test]
	fn self_reference_terminates() {
		let mut p = Properties::default();
		p.insert("a", "${a}");
		assert_eq!(p.interpolate("${a}"), "${a}");
	}
}
