use std::collections::HashSet;
use std::fmt::Debug;

use petgraph::graph::NodeIndex;
use petgraph::Direction;

use super::EdgeFilter;
use super::Graph;
use super::GraphNode;

/// Cooperative controls handed to traversal visitors.
#[derive(Debug, Default)]
pub struct TraversalActions {
  skipped: bool,
  stopped: bool,
}

impl TraversalActions {
  /// Do not descend into the children of the node being visited.
  pub fn skip_children(&mut self) {
    self.skipped = true;
  }

  /// End the traversal after the current visit.
  pub fn stop(&mut self) {
    self.stopped = true;
  }

  pub fn is_skipped(&self) -> bool {
    self.skipped
  }

  pub fn is_stopped(&self) -> bool {
    self.stopped
  }
}

/// Pre-order depth-first walk that owns its state instead of borrowing the graph.
///
/// Each node is yielded once. Children of the last yielded node are expanded lazily on the
/// following call to `next`, so a caller can mutate the graph, skip the children or stop in
/// between steps.
#[derive(Debug)]
pub struct Walker<E> {
  filter: EdgeFilter<E>,
  direction: Direction,
  stack: Vec<NodeIndex>,
  visited: HashSet<NodeIndex>,
  pending: Option<NodeIndex>,
  stopped: bool,
}

impl<E> Walker<E>
where
  E: Copy + Debug + PartialEq,
{
  pub fn new(start: NodeIndex, filter: EdgeFilter<E>, direction: Direction) -> Self {
    Walker {
      filter,
      direction,
      stack: vec![start],
      visited: HashSet::new(),
      pending: None,
      stopped: false,
    }
  }

  pub fn next<N: GraphNode>(&mut self, graph: &Graph<N, E>) -> Option<NodeIndex> {
    let filter = self.filter;
    let direction = self.direction;
    self.next_with(graph, |index| graph.adjacent(index, direction, filter))
  }

  /// Like `next`, with the children of each node supplied by `get_children`.
  pub fn next_with<N, C>(&mut self, graph: &Graph<N, E>, mut get_children: C) -> Option<NodeIndex>
  where
    N: GraphNode,
    C: FnMut(NodeIndex) -> Vec<NodeIndex>,
  {
    if self.stopped {
      return None;
    }

    if let Some(parent) = self.pending.take() {
      if graph.contains_index(parent) {
        let children = get_children(parent);
        for child in children.into_iter().rev() {
          if !self.visited.contains(&child) {
            self.stack.push(child);
          }
        }
      }
    }

    while let Some(index) = self.stack.pop() {
      if !graph.contains_index(index) || !self.visited.insert(index) {
        continue;
      }

      self.pending = Some(index);
      return Some(index);
    }

    None
  }

  pub fn skip_children(&mut self) {
    self.pending = None;
  }

  pub fn stop(&mut self) {
    self.stopped = true;
    self.pending = None;
    self.stack.clear();
  }

  /// Applies the actions a visitor requested for the node that was just yielded.
  pub fn apply(&mut self, actions: TraversalActions) {
    if actions.stopped {
      self.stop();
    } else if actions.skipped {
      self.skip_children();
    }
  }
}
