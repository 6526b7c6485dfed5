use std::collections::HashSet;

use super::BundleGraph;
use super::BundleGraphEdgeType;
use super::BundleGraphNode;
use crate::graph::GraphNode;
use crate::types::Bundle;

impl BundleGraph {
  /// Whether `asset_id` is guaranteed to be loaded whenever `bundle_id` is, without the bundle
  /// containing it.
  ///
  /// That is the case when, for every bundle group of the bundle, either a sibling bundle contains
  /// the asset or every parent of the group has an ancestor bundle group that does. The search
  /// does not cross into a different environment context.
  pub fn is_asset_reachable_from_bundle(&self, asset_id: &str, bundle_id: &str) -> bool {
    let bundle = self.bundle(bundle_id);

    self
      .get_bundle_group_ids_containing_bundle(bundle_id)
      .iter()
      .all(|bundle_group_id| {
        if self
          .sibling_with_asset(bundle_group_id, bundle_id, asset_id)
          .is_some()
        {
          return true;
        }

        self
          .graph
          .get_nodes_connected_to(bundle_group_id, BundleGraphEdgeType::Bundle)
          .into_iter()
          .all(|parent| {
            self
              .find_in_ancestor_bundle_groups(parent.id(), bundle, asset_id)
              .is_some()
          })
      })
  }

  /// Finds a sibling or ancestor bundle that already provides `asset_id` to `bundle_id`.
  ///
  /// Siblings win over ancestors and more recently added bundles win over older ones.
  pub fn find_reachable_bundle_with_asset(&self, bundle_id: &str, asset_id: &str) -> Option<&Bundle> {
    let bundle = self.bundle(bundle_id);

    for bundle_group_id in self.get_bundle_group_ids_containing_bundle(bundle_id) {
      if let Some(sibling) = self.sibling_with_asset(&bundle_group_id, bundle_id, asset_id) {
        return Some(sibling);
      }

      for parent in self
        .graph
        .get_nodes_connected_to(&bundle_group_id, BundleGraphEdgeType::Bundle)
      {
        if let Some(ancestor) = self.find_in_ancestor_bundle_groups(parent.id(), bundle, asset_id) {
          return Some(ancestor);
        }
      }
    }

    None
  }

  fn sibling_with_asset(
    &self,
    bundle_group_id: &str,
    bundle_id: &str,
    asset_id: &str,
  ) -> Option<&Bundle> {
    self
      .get_bundles_in_bundle_group(bundle_group_id)
      .into_iter()
      .find(|candidate| candidate.id != bundle_id && self.bundle_has_asset(&candidate.id, asset_id))
  }

  fn find_in_ancestor_bundle_groups(
    &self,
    start_id: &str,
    bundle: &Bundle,
    asset_id: &str,
  ) -> Option<&Bundle> {
    let mut found = None;

    self
      .graph
      .traverse_ancestors(start_id, BundleGraphEdgeType::Bundle, |node, actions| {
        match node {
          BundleGraphNode::BundleGroup(bundle_group) => {
            if let Some(candidate) = self.sibling_with_asset(&bundle_group.id, &bundle.id, asset_id) {
              found = Some(candidate);
              actions.stop();
            }
          }
          BundleGraphNode::Bundle(ancestor) if ancestor.env.context != bundle.env.context => {
            actions.skip_children();
          }
          _ => {}
        }
      });

    found
  }

  /// Whether a bundle below `bundle_id` (or a sibling of one) of the same type and context depends
  /// on `asset_id` without containing it, and so expects to find it in `bundle_id`.
  pub fn is_asset_referenced_by_dependant(&self, bundle_id: &str, asset_id: &str) -> bool {
    let mut visited = HashSet::new();
    self.is_referenced_by_dependant(bundle_id, asset_id, &mut visited)
  }

  fn is_referenced_by_dependant(
    &self,
    bundle_id: &str,
    asset_id: &str,
    visited: &mut HashSet<String>,
  ) -> bool {
    let bundle = self.bundle(bundle_id);
    let dependency_ids: Vec<&str> = self
      .graph
      .get_nodes_connected_to(asset_id, BundleGraphEdgeType::Null)
      .into_iter()
      .filter_map(BundleGraphNode::as_dependency)
      .map(|dependency| dependency.id.as_str())
      .collect();

    let has_reference = |candidate: &Bundle| {
      !self.bundle_has_asset(&candidate.id, asset_id)
        && dependency_ids
          .iter()
          .any(|dependency_id| self.bundle_has_dependency(&candidate.id, dependency_id))
    };

    let is_similar = |candidate: &Bundle| {
      candidate.bundle_type == bundle.bundle_type && candidate.env.context == bundle.env.context
    };

    let mut is_referenced = false;
    self.traverse_bundles(Some(bundle_id), |descendant, actions| {
      if !visited.insert(descendant.id.clone()) || !is_similar(descendant) {
        actions.skip_children();
        return;
      }

      if descendant.id != bundle_id && has_reference(descendant) {
        is_referenced = true;
        actions.stop();
        return;
      }

      let referenced_by_sibling = self
        .get_sibling_bundles(&descendant.id)
        .into_iter()
        .filter(|sibling| is_similar(sibling))
        .any(|sibling| {
          has_reference(sibling) || self.is_referenced_by_dependant(&sibling.id, asset_id, visited)
        });

      if referenced_by_sibling {
        is_referenced = true;
        actions.stop();
      }
    });

    is_referenced
  }
}
