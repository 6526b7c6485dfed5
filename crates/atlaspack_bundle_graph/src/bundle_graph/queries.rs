use std::collections::HashSet;

use petgraph::Direction;

use super::BundleGraph;
use super::BundleGraphEdgeType;
use super::BundleGraphNode;
use crate::error::BundleGraphError;
use crate::error::BundleGraphResult;
use crate::graph::EdgeFilter;
use crate::graph::GraphNode;
use crate::graph::TraversalActions;
use crate::types::Asset;
use crate::types::Bundle;
use crate::types::BundleGroup;
use crate::types::Dependency;
use crate::types::FileType;

impl BundleGraph {
  pub fn get_bundles(&self) -> Vec<&Bundle> {
    let mut bundles = Vec::new();
    self.traverse_bundles(None, |bundle, _| bundles.push(bundle));
    bundles
  }

  /// Depth-first traversal of the bundle hierarchy, from `start` or the root.
  pub fn traverse_bundles<'a, F>(&'a self, start: Option<&str>, visit: F)
  where
    F: FnMut(&'a Bundle, &mut TraversalActions),
  {
    self.graph.filtered_traverse(
      start,
      BundleGraphEdgeType::Bundle,
      |node, _| node.as_bundle(),
      visit,
    );
  }

  /// Visits the assets and dependencies of a bundle.
  ///
  /// Entry assets are visited first, in the order of the bundle's entry list. Nodes that are not
  /// contained in the bundle are not visited and neither are their children.
  pub fn traverse_bundle<'a, F>(&'a self, bundle_id: &str, mut visit: F)
  where
    F: FnMut(&'a BundleGraphNode, &mut TraversalActions),
  {
    let entry_asset_ids = &self.bundle(bundle_id).entry_asset_ids;
    let mut is_bundle_node = true;

    self.graph.dfs(
      bundle_id,
      |node, actions| {
        if node.id() == bundle_id {
          return;
        }

        if node.is_asset_or_dependency()
          && self
            .graph
            .has_edge(bundle_id, node.id(), BundleGraphEdgeType::Contains)
        {
          visit(node, actions);
        } else {
          actions.skip_children();
        }
      },
      |graph, index| {
        let mut children = graph.adjacent(
          index,
          Direction::Outgoing,
          EdgeFilter::Only(BundleGraphEdgeType::Null),
        );

        if is_bundle_node {
          is_bundle_node = false;
          children.sort_by_key(|child| {
            let id = graph.node(*child).id();
            entry_asset_ids
              .iter()
              .position(|entry| entry == id)
              .unwrap_or(usize::MAX)
          });
        }

        children
      },
    );
  }

  /// Visits the assets of a bundle in [`BundleGraph::traverse_bundle`] order.
  pub fn traverse_assets<'a, F>(&'a self, bundle_id: &str, mut visit: F)
  where
    F: FnMut(&'a Asset, &mut TraversalActions),
  {
    self.traverse_bundle(bundle_id, |node, actions| {
      if let Some(asset) = node.as_asset() {
        visit(asset, actions);
      }
    });
  }

  /// Visits every asset and dependency reachable from the root.
  pub fn traverse_contents<'a, F>(&'a self, visit: F)
  where
    F: FnMut(&'a BundleGraphNode, &mut TraversalActions),
  {
    self.graph.filtered_traverse(
      None,
      BundleGraphEdgeType::Null,
      |node, _| node.is_asset_or_dependency().then_some(node),
      visit,
    );
  }

  pub fn get_child_bundles(&self, bundle_id: &str) -> Vec<&Bundle> {
    let mut bundles = Vec::new();
    self.traverse_bundles(Some(bundle_id), |bundle, actions| {
      if bundle.id == bundle_id {
        return;
      }

      bundles.push(bundle);
      actions.skip_children();
    });

    bundles
  }

  /// Bundles that load a bundle group containing `bundle_id`
  pub fn get_parent_bundles(&self, bundle_id: &str) -> Vec<&Bundle> {
    let mut seen = HashSet::new();
    let mut parents = Vec::new();

    for group in self
      .graph
      .get_nodes_connected_to(bundle_id, BundleGraphEdgeType::Bundle)
    {
      let BundleGraphNode::BundleGroup(group) = group else {
        continue;
      };

      for parent in self
        .graph
        .get_nodes_connected_to(&group.id, BundleGraphEdgeType::Bundle)
      {
        if let BundleGraphNode::Bundle(parent) = parent {
          if seen.insert(&parent.id) {
            parents.push(parent);
          }
        }
      }
    }

    parents
  }

  pub fn get_bundle_groups_containing_bundle(&self, bundle_id: &str) -> Vec<&BundleGroup> {
    self
      .graph
      .get_nodes_connected_to(bundle_id, BundleGraphEdgeType::Bundle)
      .into_iter()
      .filter_map(BundleGraphNode::as_bundle_group)
      .collect()
  }

  pub(crate) fn get_bundle_group_ids_containing_bundle(&self, bundle_id: &str) -> Vec<String> {
    self
      .get_bundle_groups_containing_bundle(bundle_id)
      .into_iter()
      .map(BundleGroup::id)
      .collect()
  }

  /// Member bundles of a group, most recently added first
  pub fn get_bundles_in_bundle_group(&self, bundle_group_id: &str) -> Vec<&Bundle> {
    self
      .bundle_group(bundle_group_id)
      .bundle_ids
      .iter()
      .rev()
      .map(|bundle_id| self.bundle(bundle_id))
      .collect()
  }

  /// Bundles loaded together with `bundle_id` in any of its bundle groups
  pub fn get_sibling_bundles(&self, bundle_id: &str) -> Vec<&Bundle> {
    let mut seen = HashSet::new();
    let mut siblings = Vec::new();

    for group_id in self.get_bundle_group_ids_containing_bundle(bundle_id) {
      for bundle in self.get_bundles_in_bundle_group(&group_id) {
        if bundle.id != bundle_id && seen.insert(&bundle.id) {
          siblings.push(bundle);
        }
      }
    }

    siblings
  }

  pub fn get_referenced_bundles(&self, bundle_id: &str) -> Vec<&Bundle> {
    self
      .graph
      .get_nodes_connected_from(bundle_id, BundleGraphEdgeType::References)
      .into_iter()
      .filter_map(BundleGraphNode::as_bundle)
      .collect()
  }

  pub fn get_parent_bundles_of_bundle_group(&self, bundle_group_id: &str) -> Vec<&Bundle> {
    self
      .graph
      .get_nodes_connected_to(bundle_group_id, BundleGraphEdgeType::Bundle)
      .into_iter()
      .filter_map(BundleGraphNode::as_bundle)
      .collect()
  }

  pub fn has_parent_bundle_of_type(&self, bundle_id: &str, file_type: &FileType) -> bool {
    let parents = self.get_parent_bundles(bundle_id);
    !parents.is_empty() && parents.iter().all(|parent| &parent.bundle_type == file_type)
  }

  pub fn find_bundles_with_asset(&self, asset_id: &str) -> Vec<&Bundle> {
    self.find_bundles_containing(asset_id)
  }

  pub fn find_bundles_with_dependency(&self, dependency_id: &str) -> Vec<&Bundle> {
    self.find_bundles_containing(dependency_id)
  }

  fn find_bundles_containing(&self, id: &str) -> Vec<&Bundle> {
    self
      .graph
      .get_nodes_connected_to(id, BundleGraphEdgeType::Contains)
      .into_iter()
      .filter_map(BundleGraphNode::as_bundle)
      .collect()
  }

  pub fn bundle_has_asset(&self, bundle_id: &str, asset_id: &str) -> bool {
    self
      .graph
      .has_edge(bundle_id, asset_id, BundleGraphEdgeType::Contains)
  }

  pub fn bundle_has_dependency(&self, bundle_id: &str, dependency_id: &str) -> bool {
    self
      .graph
      .has_edge(bundle_id, dependency_id, BundleGraphEdgeType::Contains)
  }

  /// Assets a dependency resolves to directly
  pub fn get_dependency_assets(&self, dependency_id: &str) -> Vec<&Asset> {
    self
      .graph
      .get_nodes_connected_from(dependency_id, BundleGraphEdgeType::Null)
      .into_iter()
      .filter_map(BundleGraphNode::as_asset)
      .collect()
  }

  /// The asset a dependency resolves to.
  ///
  /// When `bundle_id` is given, an asset contained in that bundle is preferred. Dependencies that
  /// were split into a bundle group or turned into a reference are resolved through their
  /// `references` edges.
  pub fn get_dependency_resolution(
    &self,
    dependency_id: &str,
    bundle_id: Option<&str>,
  ) -> Option<&Asset> {
    if !self.graph.has_node(dependency_id) {
      return None;
    }

    let assets = self.get_dependency_assets(dependency_id);
    let first = assets.first().copied();
    let resolved = match bundle_id {
      Some(bundle_id) => assets
        .iter()
        .copied()
        .find(|asset| self.bundle_has_asset(bundle_id, &asset.id))
        .or(first),
      None => first,
    };

    if resolved.is_some() {
      return resolved;
    }

    let mut referenced = None;
    self.graph.traverse(
      Some(dependency_id),
      BundleGraphEdgeType::References,
      |node, actions| {
        if node.id() == dependency_id {
          return;
        }

        if let BundleGraphNode::Asset(asset) = node {
          referenced = Some(&asset.value);
          actions.stop();
        } else {
          actions.skip_children();
        }
      },
    );

    referenced
  }

  /// Dependencies of an asset, in source order
  pub fn get_dependencies(&self, asset_id: &str) -> Vec<&Dependency> {
    self
      .graph
      .get_nodes_connected_from(asset_id, BundleGraphEdgeType::Null)
      .into_iter()
      .map(|node| match node {
        BundleGraphNode::Dependency(node) => &node.value,
        other => panic!("Expected a dependency but found {}", other),
      })
      .collect()
  }

  /// Dependencies pointing at an asset through any kind of edge
  pub fn get_incoming_dependencies(&self, asset_id: &str) -> Vec<&Dependency> {
    if !self.graph.has_node(asset_id) {
      return Vec::new();
    }

    self
      .graph
      .get_nodes_connected_to(asset_id, EdgeFilter::All)
      .into_iter()
      .filter_map(BundleGraphNode::as_dependency)
      .collect()
  }

  pub fn is_asset_referenced(&self, asset_id: &str) -> bool {
    !self
      .graph
      .get_nodes_connected_to(asset_id, BundleGraphEdgeType::References)
      .is_empty()
  }

  /// Size of an asset and everything it synchronously depends on
  pub fn get_total_size(&self, asset_id: &str) -> u64 {
    let mut size = 0;
    self
      .graph
      .traverse(Some(asset_id), BundleGraphEdgeType::Null, |node, actions| {
        match node {
          BundleGraphNode::BundleGroup(_) => actions.skip_children(),
          BundleGraphNode::Asset(asset) => size += asset.value.stats.size,
          _ => {}
        }
      });

    size
  }

  pub fn is_dependency_skipped(&self, dependency_id: &str) -> bool {
    self.dependency_node(dependency_id).is_skipped()
  }

  pub fn get_asset_by_id(&self, asset_id: &str) -> BundleGraphResult<&Asset> {
    self
      .get_asset(asset_id)
      .ok_or_else(|| BundleGraphError::AssetNotFound(asset_id.to_string()))
  }

  pub fn get_asset_public_id(&self, asset_id: &str) -> BundleGraphResult<&str> {
    self
      .public_id_by_asset_id
      .get(asset_id)
      .map(String::as_str)
      .ok_or_else(|| BundleGraphError::PublicIdNotFound(asset_id.to_string()))
  }

  /// Finds the asset a public id was assigned to
  pub fn get_asset_by_public_id(&self, public_id: &str) -> BundleGraphResult<&Asset> {
    self
      .public_id_by_asset_id
      .iter()
      .find(|(_, candidate)| candidate.as_str() == public_id)
      .map(|(asset_id, _)| asset_id)
      .and_then(|asset_id| self.get_asset(asset_id))
      .ok_or_else(|| BundleGraphError::PublicIdNotFound(public_id.to_string()))
  }

  /// Exports of an asset that are used somewhere in the build
  pub fn get_used_symbols_asset(&self, asset_id: &str) -> &HashSet<String> {
    &self.asset_node(asset_id).used_symbols
  }

  /// Symbols the resolved asset provides through a dependency
  pub fn get_used_symbols_dependency(&self, dependency_id: &str) -> &HashSet<String> {
    &self.dependency_node(dependency_id).used_symbols_up
  }
}
