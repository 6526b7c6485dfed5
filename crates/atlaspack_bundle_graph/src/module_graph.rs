use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::bundle_graph::AssetNode;
use crate::bundle_graph::DependencyNode;
use crate::bundle_graph::ROOT_NODE_ID;
use crate::types::Asset;
use crate::types::Dependency;

/// Nodes of the graph produced by resolving and transforming every module of a build.
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum ModuleGraphNode {
  Root,
  /// Groups the assets a single transformation produced. Groups are transparent: the bundle
  /// graph connects their predecessors directly to their successors.
  AssetGroup(String),
  Asset(AssetNode),
  Dependency(DependencyNode),
}

impl ModuleGraphNode {
  pub fn id(&self) -> &str {
    match self {
      ModuleGraphNode::Root => ROOT_NODE_ID,
      ModuleGraphNode::AssetGroup(id) => id,
      ModuleGraphNode::Asset(node) => &node.value.id,
      ModuleGraphNode::Dependency(node) => &node.value.id,
    }
  }
}

/// The immutable module dependency graph a bundle graph is built from.
///
/// The root node is always at index 0.
#[derive(Clone, Debug)]
pub struct ModuleGraph {
  graph: DiGraph<ModuleGraphNode, ()>,
}

impl Default for ModuleGraph {
  fn default() -> Self {
    Self::new()
  }
}

impl ModuleGraph {
  pub fn new() -> Self {
    let mut graph = DiGraph::new();
    graph.add_node(ModuleGraphNode::Root);

    ModuleGraph { graph }
  }

  pub fn root_node(&self) -> NodeIndex {
    NodeIndex::new(0)
  }

  pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &ModuleGraphNode)> {
    self
      .graph
      .node_indices()
      .map(|index| (index, &self.graph[index]))
  }

  pub fn node(&self, index: NodeIndex) -> &ModuleGraphNode {
    &self.graph[index]
  }

  pub fn edges(&self) -> Vec<(NodeIndex, NodeIndex)> {
    self
      .graph
      .raw_edges()
      .iter()
      .map(|edge| (edge.source(), edge.target()))
      .collect()
  }

  pub fn add_asset(&mut self, parent_idx: NodeIndex, asset: Asset) -> NodeIndex {
    self.add_asset_node(parent_idx, AssetNode::new(asset))
  }

  pub fn add_asset_node(&mut self, parent_idx: NodeIndex, asset_node: AssetNode) -> NodeIndex {
    let asset_idx = self.graph.add_node(ModuleGraphNode::Asset(asset_node));
    self.graph.add_edge(parent_idx, asset_idx, ());
    asset_idx
  }

  pub fn add_dependency(&mut self, parent_idx: NodeIndex, dependency: Dependency) -> NodeIndex {
    self.add_dependency_node(parent_idx, DependencyNode::new(dependency))
  }

  pub fn add_dependency_node(
    &mut self,
    parent_idx: NodeIndex,
    dependency_node: DependencyNode,
  ) -> NodeIndex {
    let dependency_idx = self
      .graph
      .add_node(ModuleGraphNode::Dependency(dependency_node));
    self.graph.add_edge(parent_idx, dependency_idx, ());
    dependency_idx
  }

  pub fn add_asset_group(&mut self, parent_idx: NodeIndex, id: impl Into<String>) -> NodeIndex {
    let group_idx = self.graph.add_node(ModuleGraphNode::AssetGroup(id.into()));
    self.graph.add_edge(parent_idx, group_idx, ());
    group_idx
  }

  pub fn add_edge(&mut self, parent_idx: &NodeIndex, child_idx: &NodeIndex) {
    self.graph.add_edge(*parent_idx, *child_idx, ());
  }

  pub fn incoming(&self, index: NodeIndex) -> Vec<NodeIndex> {
    self.neighbors(index, Direction::Incoming)
  }

  pub fn outgoing(&self, index: NodeIndex) -> Vec<NodeIndex> {
    self.neighbors(index, Direction::Outgoing)
  }

  // Edge insertion order, unlike `neighbors_directed`
  fn neighbors(&self, index: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
    let mut edges: Vec<_> = self
      .graph
      .edges_directed(index, direction)
      .map(|edge| {
        let other = match direction {
          Direction::Outgoing => edge.target(),
          Direction::Incoming => edge.source(),
        };
        (edge.id(), other)
      })
      .collect();

    edges.sort_by_key(|(edge, _)| *edge);
    edges.into_iter().map(|(_, other)| other).collect()
  }
}
