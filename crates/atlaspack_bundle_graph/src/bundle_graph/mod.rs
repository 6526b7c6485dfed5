use std::collections::HashMap;
use std::collections::HashSet;

use crate::error::BundleGraphError;
use crate::error::BundleGraphResult;
use crate::graph::Graph;
use crate::options::BundleGraphOptions;
use crate::types::Asset;
use crate::types::Bundle;
use crate::types::BundleGroup;
use crate::types::Dependency;

mod async_dependency;
mod content_hash;
mod from_module_graph;
mod merge;
mod mutation;
mod node;
mod public_id;
mod queries;
mod reachability;
mod serialize;
mod symbols;
#[cfg(test)]
pub(crate) mod test_utils;

pub use self::async_dependency::AsyncResolution;
pub use self::mutation::CreateBundleOptions;
pub use self::node::*;
pub use self::public_id::generate_public_id;
pub use self::serialize::SerializedBundleGraph;
pub use self::symbols::ExportSymbolResolution;
pub use self::symbols::ResolvedSymbol;
pub use self::symbols::SymbolResolution;

/// The authoritative graph of which assets end up in which bundles.
///
/// Starts out as a copy of the module graph (root, assets and dependencies joined by
/// [`BundleGraphEdgeType::Null`] edges). Bundles and bundle groups are then created on top of it
/// by a bundler, which assigns assets to bundles through the mutation methods.
///
/// Reads may run freely between mutations. Mutations must be serialized by the caller.
#[derive(Clone, Debug)]
pub struct BundleGraph {
  graph: Graph<BundleGraphNode, BundleGraphEdgeType>,
  public_id_by_asset_id: HashMap<String, String>,
  asset_public_ids: HashSet<String>,
  bundle_content_hashes: HashMap<String, String>,
  options: BundleGraphOptions,
}

impl Default for BundleGraph {
  fn default() -> Self {
    Self::new()
  }
}

impl BundleGraph {
  pub fn new() -> Self {
    Self::with_options(BundleGraphOptions::default())
  }

  pub fn with_options(options: BundleGraphOptions) -> Self {
    let mut graph = Graph::new();
    graph.set_root_node(BundleGraphNode::Root);

    BundleGraph {
      graph,
      public_id_by_asset_id: HashMap::new(),
      asset_public_ids: HashSet::new(),
      bundle_content_hashes: HashMap::new(),
      options,
    }
  }

  /// Read only access to the underlying graph
  pub fn graph(&self) -> &Graph<BundleGraphNode, BundleGraphEdgeType> {
    &self.graph
  }

  pub fn options(&self) -> &BundleGraphOptions {
    &self.options
  }

  pub fn get_node(&self, id: &str) -> Option<&BundleGraphNode> {
    self.graph.get_node(id)
  }

  pub fn get_asset(&self, id: &str) -> Option<&Asset> {
    self.graph.get_node(id).and_then(BundleGraphNode::as_asset)
  }

  pub fn get_dependency(&self, id: &str) -> Option<&Dependency> {
    self
      .graph
      .get_node(id)
      .and_then(BundleGraphNode::as_dependency)
  }

  pub fn get_bundle(&self, id: &str) -> Option<&Bundle> {
    self.graph.get_node(id).and_then(BundleGraphNode::as_bundle)
  }

  pub fn get_bundle_group(&self, id: &str) -> Option<&BundleGroup> {
    self
      .graph
      .get_node(id)
      .and_then(BundleGraphNode::as_bundle_group)
  }

  fn node(&self, id: &str) -> &BundleGraphNode {
    match self.graph.get_node(id) {
      Some(node) => node,
      None => panic!("Node {} does not exist in the bundle graph", id),
    }
  }

  fn node_mut(&mut self, id: &str) -> &mut BundleGraphNode {
    match self.graph.get_node_mut(id) {
      Some(node) => node,
      None => panic!("Node {} does not exist in the bundle graph", id),
    }
  }

  pub(crate) fn asset_node(&self, id: &str) -> &AssetNode {
    match self.node(id) {
      BundleGraphNode::Asset(node) => node,
      other => panic!("Expected an asset but found {}", other),
    }
  }

  #[cfg(test)]
  pub(crate) fn asset_node_mut(&mut self, id: &str) -> &mut AssetNode {
    match self.node_mut(id) {
      BundleGraphNode::Asset(node) => node,
      other => panic!("Expected an asset but found {}", other),
    }
  }

  pub(crate) fn dependency_node(&self, id: &str) -> &DependencyNode {
    match self.node(id) {
      BundleGraphNode::Dependency(node) => node,
      other => panic!("Expected a dependency but found {}", other),
    }
  }

  #[cfg(test)]
  pub(crate) fn dependency_node_mut(&mut self, id: &str) -> &mut DependencyNode {
    match self.node_mut(id) {
      BundleGraphNode::Dependency(node) => node,
      other => panic!("Expected a dependency but found {}", other),
    }
  }

  pub(crate) fn bundle(&self, id: &str) -> &Bundle {
    match self.node(id) {
      BundleGraphNode::Bundle(bundle) => bundle,
      other => panic!("Expected a bundle but found {}", other),
    }
  }

  pub(crate) fn bundle_mut(&mut self, id: &str) -> &mut Bundle {
    match self.node_mut(id) {
      BundleGraphNode::Bundle(bundle) => bundle,
      other => panic!("Expected a bundle but found {}", other),
    }
  }

  pub(crate) fn bundle_group(&self, id: &str) -> &BundleGroup {
    match self.node(id) {
      BundleGraphNode::BundleGroup(node) => &node.value,
      other => panic!("Expected a bundle group but found {}", other),
    }
  }

  pub(crate) fn bundle_group_mut(&mut self, id: &str) -> &mut BundleGroup {
    match self.node_mut(id) {
      BundleGraphNode::BundleGroup(node) => &mut node.value,
      other => panic!("Expected a bundle group but found {}", other),
    }
  }

  /// Drops the cached content hash of a bundle whose membership changed.
  ///
  /// Every mutation that adds or removes `contains` edges from a bundle must call this.
  fn invalidate_content_hash(&mut self, bundle_id: &str) {
    if self.bundle_content_hashes.remove(bundle_id).is_some() {
      tracing::trace!(bundle_id, "Invalidated bundle content hash");
    }
  }

  /// Checks the structural invariants of a settled bundle graph.
  ///
  /// Intended for tests and for debugging bundler plugins; returns the first violation found.
  pub fn verify(&self) -> BundleGraphResult<()> {
    let mut seen_public_ids = HashSet::new();
    for (asset_id, public_id) in &self.public_id_by_asset_id {
      if !seen_public_ids.insert(public_id) {
        return Err(BundleGraphError::InvalidOperation(format!(
          "Public id {} of asset {} is not unique",
          public_id, asset_id
        )));
      }
    }

    for node in self.graph.nodes() {
      match node {
        BundleGraphNode::Bundle(bundle) => {
          let has_content = self
            .graph
            .get_nodes_connected_from(&bundle.id, BundleGraphEdgeType::Null)
            .iter()
            .any(|node| node.as_asset().is_some());

          if !has_content {
            return Err(BundleGraphError::InvalidOperation(format!(
              "Bundle {} has no entry assets",
              bundle.id
            )));
          }
        }
        BundleGraphNode::BundleGroup(group) => {
          if group.value.bundle_ids.is_empty() {
            return Err(BundleGraphError::InvalidOperation(format!(
              "Bundle group {} has no bundles",
              group.id
            )));
          }

          for bundle_id in &group.value.bundle_ids {
            if !self
              .graph
              .has_edge(&group.id, bundle_id, BundleGraphEdgeType::Bundle)
            {
              return Err(BundleGraphError::InvalidOperation(format!(
                "Bundle {} is listed in bundle group {} without being linked to it",
                bundle_id, group.id
              )));
            }
          }
        }
        BundleGraphNode::Root | BundleGraphNode::Asset(_) | BundleGraphNode::Dependency(_) => {}
      }
    }

    for (from, to, edge_type) in self.graph.edges() {
      if edge_type != BundleGraphEdgeType::Contains {
        continue;
      }

      let valid = matches!(self.node(from), BundleGraphNode::Bundle(_))
        && self.node(to).is_asset_or_dependency();

      if !valid {
        return Err(BundleGraphError::InvalidOperation(format!(
          "Contains edge from {} to {} does not link a bundle to its contents",
          from, to
        )));
      }
    }

    Ok(())
  }

  fn verify_if_enabled(&self) {
    if !self.options.verify_mutations {
      return;
    }

    if let Err(error) = self.verify() {
      panic!("Bundle graph is inconsistent after mutation: {}", error);
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::test_utils::*;
  use super::*;

  #[test]
  fn new_graph_only_contains_the_root() {
    let graph = BundleGraph::new();

    assert_eq!(graph.graph().node_count(), 1);
    assert_eq!(graph.graph().root_node(), Some(&BundleGraphNode::Root));
    assert!(graph.verify().is_ok());
  }

  #[test]
  fn typed_getters_return_none_for_other_variants() {
    let graph = ModuleGraphBuilder::new()
      .entry("entry_dep", asset("a"))
      .build();

    assert!(graph.get_asset("a").is_some());
    assert!(graph.get_dependency("a").is_none());
    assert!(graph.get_bundle("a").is_none());
    assert!(graph.get_dependency("entry_dep").is_some());
    assert!(graph.get_asset("missing").is_none());
  }

  #[test]
  #[should_panic(expected = "Expected a bundle but found Asset: a")]
  fn panics_on_the_wrong_node_variant() {
    let graph = ModuleGraphBuilder::new()
      .entry("entry_dep", asset("a"))
      .build();

    graph.bundle("a");
  }

  #[test]
  fn verify_reports_empty_bundle_groups() {
    let mut graph = ModuleGraphBuilder::new()
      .entry("entry_dep", asset("a"))
      .build();

    graph.create_bundle_group("entry_dep", target()).unwrap();

    let error = graph.verify().unwrap_err();
    assert_eq!(
      error.to_string(),
      "Bundle group bundle_group:a has no bundles"
    );
  }

  #[test]
  fn verify_accepts_a_bundled_graph() {
    let mut graph = ModuleGraphBuilder::new()
      .entry("entry_dep", asset("a"))
      .build();

    create_entry_bundle(&mut graph, "entry_dep");

    assert!(graph.verify().is_ok());
  }
}
