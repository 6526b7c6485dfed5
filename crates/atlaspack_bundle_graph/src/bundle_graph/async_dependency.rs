use super::BundleGraph;
use super::BundleGraphEdgeType;
use super::BundleGraphNode;
use crate::error::BundleGraphError;
use crate::error::BundleGraphResult;
use crate::types::Asset;
use crate::types::Bundle;
use crate::types::BundleGroup;

/// What an async dependency is loaded as.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AsyncResolution<'a> {
  /// The dependency loads a separate bundle group at runtime
  BundleGroup(&'a BundleGroup),
  /// The bundle has internalized the dependency and contains the resolved asset itself
  Asset(&'a Asset),
}

impl BundleGraph {
  /// Marks an async dependency as resolved within `bundle_id` instead of by loading its bundle
  /// group, and unlinks the group from the bundle when nothing else in it needs the group.
  pub fn internalize_async_dependency(
    &mut self,
    bundle_id: &str,
    dependency_id: &str,
  ) -> BundleGraphResult<()> {
    if !self.dependency_node(dependency_id).value.is_async() {
      return Err(BundleGraphError::InvalidOperation(format!(
        "Expected an async dependency but {} is not async",
        dependency_id
      )));
    }

    self
      .graph
      .add_edge(bundle_id, dependency_id, BundleGraphEdgeType::InternalAsync);
    self.remove_external_dependency(bundle_id, dependency_id);

    tracing::debug!(bundle_id, dependency_id, "Internalized async dependency");
    Ok(())
  }

  /// Resolves an async dependency to either the bundle group it loads, or to the resolved asset
  /// when `bundle_id` internalized it. Returns `None` for dependencies that are not split.
  pub fn resolve_async_dependency(
    &self,
    dependency_id: &str,
    bundle_id: Option<&str>,
  ) -> Option<AsyncResolution<'_>> {
    if let Some(bundle_id) = bundle_id {
      if self
        .graph
        .has_edge(bundle_id, dependency_id, BundleGraphEdgeType::InternalAsync)
      {
        return self
          .get_dependency_resolution(dependency_id, Some(bundle_id))
          .map(AsyncResolution::Asset);
      }
    }

    self
      .dependency_bundle_group(dependency_id)
      .map(AsyncResolution::BundleGroup)
  }

  /// The bundle a dependency loads when evaluated in `from_bundle_id`.
  ///
  /// For async dependencies this is the main bundle of the dependency's group. Otherwise the
  /// referenced asset is looked up in the bundles `from_bundle_id` references.
  pub fn get_referenced_bundle(&self, dependency_id: &str, from_bundle_id: &str) -> Option<&Bundle> {
    if let Some(bundle_group) = self.dependency_bundle_group(dependency_id) {
      return self
        .get_bundles_in_bundle_group(&bundle_group.id())
        .into_iter()
        .find(|bundle| bundle.main_entry_id() == Some(&bundle_group.entry_asset_id));
    }

    let referenced = self
      .graph
      .get_nodes_connected_from(dependency_id, BundleGraphEdgeType::References)
      .into_iter()
      .find_map(BundleGraphNode::as_asset)?;

    self
      .get_referenced_bundles(from_bundle_id)
      .into_iter()
      .find(|bundle| self.bundle_has_asset(&bundle.id, &referenced.id))
  }

  fn dependency_bundle_group(&self, dependency_id: &str) -> Option<&BundleGroup> {
    self
      .graph
      .get_nodes_connected_from(dependency_id, BundleGraphEdgeType::Null)
      .into_iter()
      .find_map(BundleGraphNode::as_bundle_group)
  }
}
