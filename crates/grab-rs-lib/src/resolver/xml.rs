//! Owned element tree read out of an `sxd-document` DOM.
//!
//! Descriptors only need element names and their text, namespaces and attributes are dropped.

use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
	/// Local name, without any namespace prefix.
	pub name: String,
	/// Trimmed concatenation of the element's own text nodes.
	pub text: String,
	pub children: Vec<XmlNode>,
}

impl XmlNode {
	pub fn parse(xml: &str) -> Result<XmlNode, String> {
		let package = sxd_document::parser::parse(xml).map_err(|e| format!("{:?}", e))?;
		let document = package.as_document();
		let root = document.root().children().into_iter().find_map(|child| {
			match child {
				ChildOfRoot::Element(e) => Some(e),
				_ => None,
			}
		});
		match root {
			Some(element) => Ok(Self::from_element(element)),
			None => Err("document has no root element".to_string()),
		}
	}

	fn from_element(element: Element) -> XmlNode {
		let mut text = String::new();
		let mut children = Vec::new();
		for child in element.children() {
			match child {
				ChildOfElement::Element(e) => children.push(Self::from_element(e)),
				ChildOfElement::Text(t) => text.push_str(t.text()),
				_ => {},
			}
		}
		XmlNode {
			name: element.name().local_part().to_string(),
			text: text.trim().to_string(),
			children,
		}
	}

	pub fn child(&self, name: &str) -> Option<&XmlNode> {
		self.children.iter().find(|c| c.name == name)
	}

	pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
		self.children.iter().filter(move |c| c.name == name)
	}

	/// Text of the first child named `name`, `None` when absent or empty.
	pub fn child_text(&self, name: &str) -> Option<&str> {
		self.child(name).map(|c| c.text.as_str()).filter(|t| !t.is_empty())
	}

	/// Follows a path of child names, e.g. `["versioning", "versions"]`.
	pub fn descend(&self, path: &[&str]) -> Option<&XmlNode> {
		path.iter().try_fold(self, |node, name| node.child(name))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn namespaces_are_dropped() {
		let node = XmlNode::parse(r#"<project xmlns="http://maven.apache.org/POM/4.0.0"><groupId> g </groupId></project>"#).unwrap();
		assert_eq!(node.name, "project");
		assert_eq!(node.child_text("groupId"), Some("g"));
	}

	#[test] fn descend_follows_path() { assert_eq!(XmlNode::parse("<a><b><c>x</c></b></a>").unwrap().descend(&["b", "c"]).map(|n| n.text.as_str()), Some("x")) }
	#[test] fn empty_text_is_none() { assert_eq!(XmlNode::parse("<a><b/></a>").unwrap().child_text("b"), None) }
	#[test] fn malformed_is_error() { assert!(XmlNode::parse("<a><b></a>").is_err()) }
	#[test] fn repeated_children_in_order() { assert_eq!(XmlNode::parse("<a><v>1</v><v>2</v></a>").unwrap().children_named("v").map(|n| n.text.as_str()).collect::<Vec<_>>(), ["1", "2"]) }
}
