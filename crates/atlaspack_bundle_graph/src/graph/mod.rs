use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Debug;

use petgraph::graph::EdgeIndex;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::visit::IntoEdgeReferences;
use petgraph::Direction;

mod traversal;

pub use self::traversal::TraversalActions;
pub use self::traversal::Walker;

/// A node that can be stored in a [`Graph`], keyed by a stable string id.
pub trait GraphNode {
  fn id(&self) -> &str;
}

/// Selects which edges a query or traversal follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeFilter<E> {
  Only(E),
  All,
}

impl<E: PartialEq> EdgeFilter<E> {
  pub fn matches(&self, edge_type: &E) -> bool {
    match self {
      EdgeFilter::Only(expected) => expected == edge_type,
      EdgeFilter::All => true,
    }
  }
}

impl<E> From<E> for EdgeFilter<E> {
  fn from(edge_type: E) -> Self {
    EdgeFilter::Only(edge_type)
  }
}

#[derive(Clone, Debug)]
struct Edge<E> {
  edge_type: E,
  // Insertion sequence. Adjacency is always reported in this order.
  seq: u64,
}

/// Directed multigraph with typed edges.
///
/// Nodes are addressed by their string id. The same pair of nodes may be connected by several
/// edges as long as their types differ. Neighbours are always returned in the order their edges
/// were added, which makes every traversal deterministic.
///
/// Passing an id that is not in the graph is a programming error and panics.
#[derive(Clone, Debug)]
pub struct Graph<N, E> {
  graph: StableDiGraph<N, Edge<E>>,
  node_index_by_id: HashMap<String, NodeIndex>,
  root: Option<NodeIndex>,
  next_edge_seq: u64,
}

impl<N, E> Default for Graph<N, E>
where
  N: GraphNode,
  E: Copy + Debug + PartialEq,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<N, E> Graph<N, E>
where
  N: GraphNode,
  E: Copy + Debug + PartialEq,
{
  pub fn new() -> Self {
    Graph {
      graph: StableDiGraph::new(),
      node_index_by_id: HashMap::new(),
      root: None,
      next_edge_seq: 0,
    }
  }

  pub fn set_root_node(&mut self, node: N) -> NodeIndex {
    let index = self.add_node(node);
    self.root = Some(index);
    index
  }

  pub fn root_node(&self) -> Option<&N> {
    self.root.and_then(|index| self.graph.node_weight(index))
  }

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  /// Adds a node, replacing the value of an existing node with the same id.
  pub fn add_node(&mut self, node: N) -> NodeIndex {
    if let Some(index) = self.node_index_by_id.get(node.id()) {
      self.graph[*index] = node;
      return *index;
    }

    let id = node.id().to_string();
    let index = self.graph.add_node(node);
    self.node_index_by_id.insert(id, index);
    index
  }

  pub fn has_node(&self, id: &str) -> bool {
    self.node_index_by_id.contains_key(id)
  }

  pub fn get_node(&self, id: &str) -> Option<&N> {
    let index = self.node_index_by_id.get(id)?;
    self.graph.node_weight(*index)
  }

  pub fn get_node_mut(&mut self, id: &str) -> Option<&mut N> {
    let index = self.node_index_by_id.get(id)?;
    self.graph.node_weight_mut(*index)
  }

  pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
    self.node_index_by_id.get(id).copied()
  }

  /// The index of `id`, panicking if the node does not exist.
  pub fn index(&self, id: &str) -> NodeIndex {
    match self.node_index_by_id.get(id) {
      Some(index) => *index,
      None => panic!("Node {} does not exist in the graph", id),
    }
  }

  pub fn contains_index(&self, index: NodeIndex) -> bool {
    self.graph.contains_node(index)
  }

  /// The node at `index`, panicking if it has been removed.
  pub fn node(&self, index: NodeIndex) -> &N {
    match self.graph.node_weight(index) {
      Some(node) => node,
      None => panic!("Node index {} does not exist in the graph", index.index()),
    }
  }

  pub fn nodes(&self) -> impl Iterator<Item = &N> {
    self.graph.node_weights()
  }

  /// Every edge as `(from, to, type)`, in insertion order.
  pub fn edges(&self) -> Vec<(&str, &str, E)> {
    let mut edges: Vec<_> = self
      .graph
      .edge_references()
      .map(|edge| {
        let weight = edge.weight();
        (
          weight.seq,
          self.graph[edge.source()].id(),
          self.graph[edge.target()].id(),
          weight.edge_type,
        )
      })
      .collect();

    edges.sort_by_key(|(seq, ..)| *seq);
    edges
      .into_iter()
      .map(|(_, from, to, edge_type)| (from, to, edge_type))
      .collect()
  }

  /// Adds an edge of `edge_type`. Returns false if the edge already existed.
  pub fn add_edge(&mut self, from: &str, to: &str, edge_type: E) -> bool {
    let from_index = self.index(from);
    let to_index = self.index(to);

    if self.find_edge(from_index, to_index, edge_type).is_some() {
      return false;
    }

    let seq = self.next_edge_seq;
    self.next_edge_seq += 1;
    self
      .graph
      .add_edge(from_index, to_index, Edge { edge_type, seq });

    true
  }

  pub fn has_edge(&self, from: &str, to: &str, edge_type: E) -> bool {
    match (self.index_of(from), self.index_of(to)) {
      (Some(from_index), Some(to_index)) => self.find_edge(from_index, to_index, edge_type).is_some(),
      _ => false,
    }
  }

  /// Removes an edge. Returns false if there was no such edge.
  ///
  /// With `remove_orphans`, the target node is removed as well when it can no longer be reached
  /// from the root, cascading into its own descendants.
  pub fn remove_edge(&mut self, from: &str, to: &str, edge_type: E, remove_orphans: bool) -> bool {
    let from_index = self.index(from);
    let to_index = self.index(to);

    let Some(edge) = self.find_edge(from_index, to_index, edge_type) else {
      return false;
    };

    self.graph.remove_edge(edge);

    if remove_orphans && self.is_orphaned(to_index) {
      self.remove_node_at(to_index, true);
    }

    true
  }

  /// Removes a node and all of its edges.
  ///
  /// With `remove_orphans`, descendants that become unreachable from the root are removed too.
  pub fn remove_node(&mut self, id: &str, remove_orphans: bool) {
    let index = self.index(id);
    self.remove_node_at(index, remove_orphans);
  }

  fn remove_node_at(&mut self, index: NodeIndex, remove_orphans: bool) {
    let mut queue = vec![index];

    while let Some(index) = queue.pop() {
      if !self.graph.contains_node(index) {
        continue;
      }

      let children = self.adjacent(index, Direction::Outgoing, EdgeFilter::All);

      if let Some(node) = self.graph.remove_node(index) {
        self.node_index_by_id.remove(node.id());
      }

      if self.root == Some(index) {
        self.root = None;
      }

      if remove_orphans {
        for child in children {
          if self.graph.contains_node(child) && self.is_orphaned(child) {
            queue.push(child);
          }
        }
      }
    }
  }

  /// A node is orphaned when no path leads to it from the root, following edges of any type.
  ///
  /// Graphs without a root treat every node without incoming edges as orphaned.
  pub fn is_orphaned(&self, index: NodeIndex) -> bool {
    let Some(root) = self.root else {
      return self
        .graph
        .edges_directed(index, Direction::Incoming)
        .next()
        .is_none();
    };

    if index == root {
      return false;
    }

    let mut walker = Walker::new(index, EdgeFilter::All, Direction::Incoming);
    while let Some(ancestor) = walker.next(self) {
      if ancestor == root {
        return false;
      }
    }

    true
  }

  pub fn get_nodes_connected_from(&self, id: &str, filter: impl Into<EdgeFilter<E>>) -> Vec<&N> {
    let index = self.index(id);
    self
      .adjacent(index, Direction::Outgoing, filter.into())
      .into_iter()
      .map(|index| &self.graph[index])
      .collect()
  }

  pub fn get_nodes_connected_to(&self, id: &str, filter: impl Into<EdgeFilter<E>>) -> Vec<&N> {
    let index = self.index(id);
    self
      .adjacent(index, Direction::Incoming, filter.into())
      .into_iter()
      .map(|index| &self.graph[index])
      .collect()
  }

  /// Neighbours of `index` in edge insertion order, without duplicates.
  pub fn adjacent(
    &self,
    index: NodeIndex,
    direction: Direction,
    filter: EdgeFilter<E>,
  ) -> Vec<NodeIndex> {
    let mut edges: Vec<(u64, NodeIndex)> = self
      .graph
      .edges_directed(index, direction)
      .filter(|edge| filter.matches(&edge.weight().edge_type))
      .map(|edge| {
        let other = match direction {
          Direction::Outgoing => edge.target(),
          Direction::Incoming => edge.source(),
        };
        (edge.weight().seq, other)
      })
      .collect();

    edges.sort_by_key(|(seq, _)| *seq);

    let mut seen = HashSet::new();
    edges
      .into_iter()
      .filter_map(|(_, other)| seen.insert(other).then_some(other))
      .collect()
  }

  fn find_edge(&self, from: NodeIndex, to: NodeIndex, edge_type: E) -> Option<EdgeIndex> {
    self
      .graph
      .edges_directed(from, Direction::Outgoing)
      .find(|edge| edge.target() == to && edge.weight().edge_type == edge_type)
      .map(|edge| edge.id())
  }

  /// Starts a depth-first walk from `start` (or the root) along edges matching `filter`.
  ///
  /// The walker does not borrow the graph, so the graph may be mutated between steps.
  pub fn walker(&self, start: Option<&str>, filter: impl Into<EdgeFilter<E>>) -> Walker<E> {
    Walker::new(self.start_index(start), filter.into(), Direction::Outgoing)
  }

  /// Depth-first pre-order traversal from `start` (or the root).
  pub fn traverse<'a, F>(
    &'a self,
    start: Option<&str>,
    filter: impl Into<EdgeFilter<E>>,
    mut visit: F,
  ) where
    F: FnMut(&'a N, &mut TraversalActions),
  {
    let mut walker = self.walker(start, filter);
    while let Some(index) = walker.next(self) {
      let mut actions = TraversalActions::default();
      visit(&self.graph[index], &mut actions);
      walker.apply(actions);
    }
  }

  /// Walks the graph backwards from `start`, following incoming edges matching `filter`.
  pub fn traverse_ancestors<'a, F>(
    &'a self,
    start: &str,
    filter: impl Into<EdgeFilter<E>>,
    mut visit: F,
  ) where
    F: FnMut(&'a N, &mut TraversalActions),
  {
    let mut walker = Walker::new(self.index(start), filter.into(), Direction::Incoming);
    while let Some(index) = walker.next(self) {
      let mut actions = TraversalActions::default();
      visit(&self.graph[index], &mut actions);
      walker.apply(actions);
    }
  }

  /// Depth-first traversal where the caller decides the children of each node and their order.
  pub fn dfs<'a, F, C>(&'a self, start: &str, mut visit: F, mut get_children: C)
  where
    F: FnMut(&'a N, &mut TraversalActions),
    C: FnMut(&Self, NodeIndex) -> Vec<NodeIndex>,
  {
    let mut walker = Walker::new(self.index(start), EdgeFilter::All, Direction::Outgoing);
    while let Some(index) = walker.next_with(self, |index| get_children(self, index)) {
      let mut actions = TraversalActions::default();
      visit(&self.graph[index], &mut actions);
      walker.apply(actions);
    }
  }

  /// Traverses the graph, projecting each node through `project`.
  ///
  /// Nodes the projection yields nothing for are not passed to `visit`, but their children are
  /// still traversed unless the projection itself skips them.
  pub fn filtered_traverse<'a, T, P, F>(
    &'a self,
    start: Option<&str>,
    filter: impl Into<EdgeFilter<E>>,
    mut project: P,
    mut visit: F,
  ) where
    P: FnMut(&'a N, &mut TraversalActions) -> Option<T>,
    F: FnMut(T, &mut TraversalActions),
  {
    self.traverse(start, filter, |node, actions| {
      if let Some(value) = project(node, actions) {
        visit(value, actions);
      }
    });
  }

  fn start_index(&self, start: Option<&str>) -> NodeIndex {
    match start {
      Some(id) => self.index(id),
      None => match self.root {
        Some(root) => root,
        None => panic!("Graph has no root node to start traversing from"),
      },
    }
  }
}
