//! Module for only DependencyGraph functions not related to the overall collection process.

use std::collections::HashMap;

use petgraph::prelude::*;

use crate::coordinate::*;
use crate::dependency::Scope;

#[derive(Debug, Clone)]
pub struct DependencyGraph {
	pub graph: StableDiGraph<NodeData, EdgeData>,
	pub meta_node: NodeIndex,
	nodes: HashMap<ArtifactKey, NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactNode {
	/// With the selected version.
	pub coordinate: DependencyCoordinate,
	pub scope: Scope,
	pub depth: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
	/// Control node giving the caller's requests a presence in the graph.
	Meta,
	Artifact(ArtifactNode),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeData {
	/// The edge that introduced the target, `requested` is the version as declared.
	Selected { requested: String },
	/// A later request for an artifact already in the graph, its version was ignored.
	Omitted { requested: String },
}

impl DependencyGraph {
	pub fn get_node_index(&self, key: &ArtifactKey) -> Option<NodeIndex> {
		self.nodes.get(key).copied()
	}

	pub fn get_artifact(&self, src: NodeIndex) -> Option<&ArtifactNode> {
		match self.graph.node_weight(src)? {
			NodeData::Artifact(a) => Some(a),
			NodeData::Meta => None,
		}
	}

	/// Adds `artifact` beneath `parent`.
	///
	/// # Panics
	/// - In debug builds when an artifact with the same key is already present, use [`add_omitted_edge`](DependencyGraph::add_omitted_edge()) instead.
	pub fn add_artifact(&mut self, parent: NodeIndex, artifact: ArtifactNode, requested: String) -> NodeIndex {
		let key = artifact.coordinate.key();
		debug_assert!(!self.nodes.contains_key(&key), "artifact added twice.");
		let node = self.graph.add_node(NodeData::Artifact(artifact));
		self.graph.add_edge(parent, node, EdgeData::Selected { requested });
		self.nodes.insert(key, node);
		node
	}

	/// Records that `parent` also asked for `existing`, once per parent.
	pub fn add_omitted_edge(&mut self, parent: NodeIndex, existing: NodeIndex, requested: String) {
		if self.graph.find_edge(parent, existing).is_none() {
			self.graph.add_edge(parent, existing, EdgeData::Omitted { requested });
		}
	}

	/// Raises the scope of the artifact at `node` to `scope` if that is wider.
	///
	/// Returns the new scope when it changed.
	pub fn widen_scope(&mut self, node: NodeIndex, scope: Scope) -> Option<Scope> {
		match self.graph.node_weight_mut(node)? {
			NodeData::Artifact(a) if a.scope.widest(scope) != a.scope => {
				a.scope = a.scope.widest(scope);
				Some(a.scope)
			},
			_ => None,
		}
	}

	/// Artifacts in pre-order over the selected edges, children in the order they were added.
	pub fn artifacts_in_order(&self) -> Vec<&ArtifactNode> {
		let mut out = Vec::new();
		let mut stack = vec![self.meta_node];
		while let Some(node) = stack.pop() {
			if let Some(artifact) = self.get_artifact(node) {
				out.push(artifact);
			}
			let mut children: Vec<(EdgeIndex, NodeIndex)> = self.graph.edges_directed(node, Outgoing)
				.filter(|e| matches!(e.weight(), EdgeData::Selected { .. }))
				.map(|e| (e.id(), e.target()))
				.collect();
			/* Reversed so the first added child is popped first */
			children.sort_by(|a, b| b.0.cmp(&a.0));
			stack.extend(children.into_iter().map(|(_, target)| target));
		}
		out
	}

	pub fn artifact_count(&self) -> usize {
		self.nodes.len()
	}
}

impl Default for DependencyGraph {
	fn default() -> Self {
		let mut graph = StableDiGraph::<NodeData, EdgeData>::default();
		let meta_node = graph.add_node(NodeData::Meta);
		Self { graph, meta_node, nodes: Default::default() }
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn node(module: &str) -> ArtifactNode {
		ArtifactNode { coordinate: DependencyCoordinate::new("g", module, "1"), scope: Scope::Compile, depth: 1 }
	}

	fn modules(graph: &DependencyGraph) -> Vec<String> {
		graph.artifacts_in_order().iter().map(|a| a.coordinate.module().to_string()).collect()
	}

	#[test]
	fn preorder_keeps_declaration_order() {
		let mut g = DependencyGraph::default();
		let meta = g.meta_node;
		let a = g.add_artifact(meta, node("a"), "1".into());
		g.add_artifact(meta, node("b"), "1".into());
		g.add_artifact(a, node("a1"), "1".into());
		g.add_artifact(a, node("a2"), "1".into());
		assert_eq!(modules(&g), ["a", "a1", "a2", "b"]);
	}

	#[test]
	fn omitted_edges_do_not_duplicate() {
		let mut g = DependencyGraph::default();
		let meta = g.meta_node;
		let a = g.add_artifact(meta, node("a"), "1".into());
		let b = g.add_artifact(meta, node("b"), "1".into());
		g.add_omitted_edge(a, b, "2".into());
		assert_eq!(modules(&g), ["a", "b"]);
	}

	#[test]
	fn widening_only_raises() {
		let mut g = DependencyGraph::default();
		let meta = g.meta_node;
		let a = g.add_artifact(meta, ArtifactNode { scope: Scope::Runtime, ..node("a") }, "1".into());
		assert_eq!(g.widen_scope(a, Scope::Test), None);
		assert_eq!(g.widen_scope(a, Scope::Compile), Some(Scope::Compile));
		assert_eq!(g.get_artifact(a).map(|a| a.scope), Some(Scope::Compile));
	}

	#[test]
	fn repeated_omission_adds_one_edge() {
		let mut g = DependencyGraph::default();
		let meta = g.meta_node;
		let a = g.add_artifact(meta, node("a"), "1".into());
		let b = g.add_artifact(meta, node("b"), "1".into());
		g.add_omitted_edge(a, b, "2".into());
		g.add_omitted_edge(a, b, "2".into());
		assert_eq!(g.graph.edge_count(), 3);
	}

	#[test] fn lookup_by_key() { let mut g = DependencyGraph::default(); let m = g.meta_node; let a = g.add_artifact(m, node("a"), "1".into()); assert_eq!(g.get_node_index(&DependencyCoordinate::new("g", "a", "9").key()), Some(a)) }
	#[test] fn meta_is_not_an_artifact() { let g = DependencyGraph::default(); assert!(g.get_artifact(g.meta_node).is_none()) }
}
