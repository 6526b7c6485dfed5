use super::BundleGraph;
use super::BundleGraphEdgeType;
use super::BundleGraphNode;
use super::BundleGroupNode;
use super::DependencyNode;
use super::ROOT_NODE_ID;
use crate::error::BundleGraphError;
use crate::error::BundleGraphResult;
use crate::graph::GraphNode;
use crate::hash::hash_string;
use crate::types::Bundle;
use crate::types::BundleBehavior;
use crate::types::BundleGroup;
use crate::types::BundleStats;
use crate::types::Environment;
use crate::types::FileType;
use crate::types::Target;

/// Describes a bundle to create with [`BundleGraph::create_bundle`].
///
/// Either `entry_asset_id` or `unique_key` must be set. The bundle type and environment default to
/// those of the entry asset.
#[derive(Clone, Debug, Default)]
pub struct CreateBundleOptions {
  pub entry_asset_id: Option<String>,
  pub unique_key: Option<String>,
  pub bundle_behavior: Option<BundleBehavior>,
  pub bundle_type: Option<FileType>,
  pub env: Option<Environment>,
  pub is_splittable: Option<bool>,
  pub name: Option<String>,
  pub target: Target,
}

/// Pending steps of a cascading removal
enum Removal {
  Bundle(String),
  BundleGroup(String),
  /// Removes the group node once its exclusive members are gone
  BundleGroupNode {
    bundle_group_id: String,
    members: Vec<String>,
  },
}

impl BundleGraph {
  /// Creates a bundle and returns its id.
  ///
  /// The id is derived from the entry asset (or unique key) and the target, so creating the same
  /// bundle twice returns the existing one. When an entry asset is given it is added with
  /// [`BundleGraph::add_entry_to_bundle`].
  pub fn create_bundle(&mut self, options: CreateBundleOptions) -> BundleGraphResult<String> {
    let entry_asset = match &options.entry_asset_id {
      Some(asset_id) => Some(self.get_asset_by_id(asset_id)?.clone()),
      None => None,
    };

    let key = match (&entry_asset, &options.unique_key) {
      (Some(asset), _) => asset.id.clone(),
      (None, Some(unique_key)) => unique_key.clone(),
      (None, None) => {
        return Err(BundleGraphError::InvalidOperation(String::from(
          "A bundle needs either an entry asset or a unique key",
        )))
      }
    };

    let bundle_id = hash_string(&format!(
      "bundle:{}{}",
      key,
      options.target.dist_dir.display()
    ));

    if self.graph.has_node(&bundle_id) {
      return Ok(bundle_id);
    }

    let bundle_type = match (&entry_asset, options.bundle_type) {
      (Some(asset), _) => asset.file_type.clone(),
      (None, bundle_type) => bundle_type.unwrap_or_default(),
    };

    let env = match (&entry_asset, options.env) {
      (Some(asset), _) => Environment::clone(&asset.env),
      (None, Some(env)) => env,
      (None, None) => Environment::clone(&options.target.env),
    };

    self.graph.add_node(BundleGraphNode::Bundle(Bundle {
      id: bundle_id.clone(),
      bundle_behavior: options.bundle_behavior,
      bundle_type,
      entry_asset_ids: Vec::new(),
      env,
      is_splittable: options.is_splittable.unwrap_or(true),
      name: options.name,
      stats: BundleStats::default(),
      target: options.target,
    }));

    tracing::debug!(%bundle_id, %key, "Created bundle");

    if let Some(asset) = entry_asset {
      self.add_entry_to_bundle(&asset.id, &bundle_id);
    }

    Ok(bundle_id)
  }

  /// Splits the graph at `dependency_id`, creating a bundle group for its resolved asset.
  ///
  /// The dependency now leads to the group, which leads to the resolved assets, and the direct
  /// edge to the resolved asset becomes a reference. Entry dependencies are attached to the root;
  /// otherwise every bundle that contains the dependency becomes a parent of the group.
  pub fn create_bundle_group(
    &mut self,
    dependency_id: &str,
    target: Target,
  ) -> BundleGraphResult<String> {
    let is_entry = self.dependency_node(dependency_id).value.is_entry;
    let resolved_id = match self.get_dependency_resolution(dependency_id, None) {
      Some(asset) => asset.id.clone(),
      None => {
        return Err(BundleGraphError::InvalidOperation(format!(
          "Dependency {} does not resolve to an asset",
          dependency_id
        )))
      }
    };

    let asset_ids: Vec<String> = self
      .get_dependency_assets(dependency_id)
      .into_iter()
      .map(|asset| asset.id.clone())
      .collect();

    let bundle_group = BundleGroup::new(resolved_id.clone(), target);
    let bundle_group_id = bundle_group.id();
    if !self.graph.has_node(&bundle_group_id) {
      self
        .graph
        .add_node(BundleGraphNode::BundleGroup(BundleGroupNode::new(
          bundle_group,
        )));
    }

    self
      .graph
      .add_edge(dependency_id, &bundle_group_id, BundleGraphEdgeType::Null);
    for asset_id in &asset_ids {
      self
        .graph
        .add_edge(&bundle_group_id, asset_id, BundleGraphEdgeType::Null);
    }

    self.create_asset_reference(dependency_id, &resolved_id);

    if is_entry {
      self
        .graph
        .add_edge(ROOT_NODE_ID, &bundle_group_id, BundleGraphEdgeType::Bundle);
    } else {
      let parent_ids: Vec<String> = self
        .find_bundles_with_dependency(dependency_id)
        .into_iter()
        .map(|bundle| bundle.id.clone())
        .collect();

      for parent_id in parent_ids {
        self
          .graph
          .add_edge(&parent_id, &bundle_group_id, BundleGraphEdgeType::Bundle);
      }
    }

    tracing::debug!(dependency_id, %bundle_group_id, "Created bundle group");

    Ok(bundle_group_id)
  }

  pub fn add_bundle_to_bundle_group(&mut self, bundle_id: &str, bundle_group_id: &str) {
    let entry_asset_ids = self.bundle(bundle_id).entry_asset_ids.clone();
    let bundle_group = self.bundle_group_mut(bundle_group_id);
    if bundle_group.bundle_ids.iter().any(|id| id == bundle_id) {
      return;
    }

    bundle_group.bundle_ids.push(bundle_id.to_string());

    self
      .graph
      .add_edge(bundle_group_id, bundle_id, BundleGraphEdgeType::Null);
    self
      .graph
      .add_edge(bundle_group_id, bundle_id, BundleGraphEdgeType::Bundle);

    // The group now reaches its entry assets through the bundle
    for entry_asset_id in entry_asset_ids {
      self.graph.remove_edge(
        bundle_group_id,
        &entry_asset_id,
        BundleGraphEdgeType::Null,
        false,
      );
    }

    tracing::debug!(bundle_id, bundle_group_id, "Added bundle to bundle group");
  }

  /// Redirects a dependency to `asset_id` through a `references` edge.
  pub fn create_asset_reference(&mut self, dependency_id: &str, asset_id: &str) {
    self
      .graph
      .add_edge(dependency_id, asset_id, BundleGraphEdgeType::References);
    self
      .graph
      .remove_edge(dependency_id, asset_id, BundleGraphEdgeType::Null, true);
  }

  pub fn create_bundle_reference(&mut self, from_bundle_id: &str, to_bundle_id: &str) {
    self
      .graph
      .add_edge(from_bundle_id, to_bundle_id, BundleGraphEdgeType::References);
  }

  /// Adds `asset_id` and everything it synchronously depends on to a bundle.
  ///
  /// Traversal stops at bundle groups and at dependencies that are deferred or excluded.
  pub fn add_asset_graph_to_bundle(&mut self, asset_id: &str, bundle_id: &str) {
    self.add_asset_graph_to_bundle_with(asset_id, bundle_id, DependencyNode::is_skipped);
  }

  /// Like [`BundleGraph::add_asset_graph_to_bundle`], with `should_skip` deciding which
  /// dependencies are not followed.
  pub fn add_asset_graph_to_bundle_with<S>(
    &mut self,
    asset_id: &str,
    bundle_id: &str,
    mut should_skip: S,
  ) where
    S: FnMut(&DependencyNode) -> bool,
  {
    // Bundle and asset have to exist
    self.bundle(bundle_id);
    self.asset_node(asset_id);

    self
      .graph
      .add_edge(bundle_id, asset_id, BundleGraphEdgeType::Null);

    let mut walker = self
      .graph
      .walker(Some(asset_id), BundleGraphEdgeType::Null);

    while let Some(index) = walker.next(&self.graph) {
      match self.graph.node(index) {
        BundleGraphNode::BundleGroup(_) => walker.skip_children(),
        BundleGraphNode::Dependency(dependency) => {
          if should_skip(dependency) {
            walker.skip_children();
            continue;
          }

          let dependency_id = dependency.value.id.clone();
          let bundle_group_ids: Vec<String> = self
            .graph
            .get_nodes_connected_from(&dependency_id, BundleGraphEdgeType::Null)
            .into_iter()
            .filter(|node| matches!(node, BundleGraphNode::BundleGroup(_)))
            .map(|node| node.id().to_string())
            .collect();

          self
            .graph
            .add_edge(bundle_id, &dependency_id, BundleGraphEdgeType::Contains);

          for bundle_group_id in bundle_group_ids {
            self
              .graph
              .add_edge(bundle_id, &bundle_group_id, BundleGraphEdgeType::Bundle);
          }
        }
        BundleGraphNode::Asset(asset) => {
          let child_id = asset.value.id.clone();
          let size = asset.value.stats.size;

          if !self.bundle_has_asset(bundle_id, &child_id) {
            self.bundle_mut(bundle_id).stats.size += size;
          }

          self
            .graph
            .add_edge(bundle_id, &child_id, BundleGraphEdgeType::Contains);
        }
        BundleGraphNode::Root | BundleGraphNode::Bundle(_) => {}
      }
    }

    tracing::trace!(asset_id, bundle_id, "Added asset graph to bundle");
    self.invalidate_content_hash(bundle_id);
  }

  /// Adds an asset graph to a bundle and records the asset as one of the bundle's entries.
  pub fn add_entry_to_bundle(&mut self, asset_id: &str, bundle_id: &str) {
    self.add_entry_to_bundle_with(asset_id, bundle_id, DependencyNode::is_skipped);
  }

  pub fn add_entry_to_bundle_with<S>(&mut self, asset_id: &str, bundle_id: &str, should_skip: S)
  where
    S: FnMut(&DependencyNode) -> bool,
  {
    self.add_asset_graph_to_bundle_with(asset_id, bundle_id, should_skip);

    let bundle = self.bundle_mut(bundle_id);
    if !bundle.entry_asset_ids.iter().any(|id| id == asset_id) {
      bundle.entry_asset_ids.push(asset_id.to_string());
    }
  }

  /// Removes an asset graph from a bundle.
  ///
  /// Assets are only dropped when they stay reachable from the bundle through other bundles that
  /// are already loaded. The bundle itself is removed once it has no assets left.
  pub fn remove_asset_graph_from_bundle(&mut self, asset_id: &str, bundle_id: &str) {
    let mut walker = self
      .graph
      .walker(Some(asset_id), BundleGraphEdgeType::Null);

    while let Some(index) = walker.next(&self.graph) {
      let (node_id, asset_size, is_dependency) = match self.graph.node(index) {
        BundleGraphNode::BundleGroup(_) => {
          walker.skip_children();
          continue;
        }
        BundleGraphNode::Asset(asset) => (asset.value.id.clone(), Some(asset.value.stats.size), false),
        BundleGraphNode::Dependency(dependency) => (dependency.value.id.clone(), None, true),
        BundleGraphNode::Root | BundleGraphNode::Bundle(_) => continue,
      };

      let removable = self
        .graph
        .has_edge(bundle_id, &node_id, BundleGraphEdgeType::Contains)
        && (is_dependency || self.is_asset_reachable_from_bundle(&node_id, bundle_id));

      if removable {
        self
          .graph
          .remove_edge(bundle_id, &node_id, BundleGraphEdgeType::Contains, false);

        if let Some(size) = asset_size {
          let stats = &mut self.bundle_mut(bundle_id).stats;
          stats.size = stats.size.saturating_sub(size);
        }
      } else {
        walker.skip_children();
      }

      if is_dependency {
        self.remove_external_dependency(bundle_id, &node_id);
      }
    }

    self
      .graph
      .remove_edge(bundle_id, asset_id, BundleGraphEdgeType::Null, false);

    tracing::trace!(asset_id, bundle_id, "Removed asset graph from bundle");
    self.invalidate_content_hash(bundle_id);

    let has_assets = !self
      .graph
      .get_nodes_connected_from(bundle_id, BundleGraphEdgeType::Null)
      .is_empty();

    // An emptied bundle keeps its entries so that removal still finds the groups it owns
    if has_assets {
      self
        .bundle_mut(bundle_id)
        .entry_asset_ids
        .retain(|id| id != asset_id);
    } else {
      self.remove_bundle(bundle_id);
    }
  }

  /// Removes a bundle, and every bundle group it owns or leaves empty.
  ///
  /// Removing a bundle group removes the bundles that belong to no other group, which may in turn
  /// remove further groups. Removing something that is already gone is a no-op.
  #[tracing::instrument(level = "debug", skip(self))]
  pub fn remove_bundle(&mut self, bundle_id: &str) {
    self.process_removals(Removal::Bundle(bundle_id.to_string()));
  }

  /// Removes a bundle group along with the bundles that belong to no other group.
  #[tracing::instrument(level = "debug", skip(self))]
  pub fn remove_bundle_group(&mut self, bundle_group_id: &str) {
    self.process_removals(Removal::BundleGroup(bundle_group_id.to_string()));
  }

  fn process_removals(&mut self, removal: Removal) {
    let mut stack = vec![removal];

    while let Some(removal) = stack.pop() {
      match removal {
        Removal::Bundle(bundle_id) => self.remove_bundle_node(&bundle_id, &mut stack),
        Removal::BundleGroup(bundle_group_id) => {
          self.remove_bundle_group_members(&bundle_group_id, &mut stack)
        }
        Removal::BundleGroupNode {
          bundle_group_id,
          members,
        } => self.remove_bundle_group_node(&bundle_group_id, &members),
      }
    }

    self.verify_if_enabled();
  }

  fn remove_bundle_node(&mut self, bundle_id: &str, stack: &mut Vec<Removal>) {
    let entry_asset_ids = match self.graph.get_node(bundle_id) {
      Some(BundleGraphNode::Bundle(bundle)) => bundle.entry_asset_ids.clone(),
      Some(other) => panic!("Expected a bundle but found {}", other),
      None => return,
    };

    let bundle_group_ids = self.get_bundle_group_ids_containing_bundle(bundle_id);
    self.graph.remove_node(bundle_id, true);
    self.bundle_content_hashes.remove(bundle_id);

    tracing::debug!(bundle_id, "Removed bundle");

    // Pushed in reverse so that groups are handled in the order the bundle was added to them
    for bundle_group_id in bundle_group_ids.into_iter().rev() {
      if !self.graph.has_node(&bundle_group_id) {
        continue;
      }

      let bundle_group = self.bundle_group_mut(&bundle_group_id);
      bundle_group.bundle_ids.retain(|id| id != bundle_id);

      let is_owner = entry_asset_ids.contains(&bundle_group.entry_asset_id);
      if is_owner || bundle_group.bundle_ids.is_empty() {
        stack.push(Removal::BundleGroup(bundle_group_id));
      }
    }
  }

  fn remove_bundle_group_members(&mut self, bundle_group_id: &str, stack: &mut Vec<Removal>) {
    if !self.graph.has_node(bundle_group_id) {
      return;
    }

    let members: Vec<String> = self
      .get_bundles_in_bundle_group(bundle_group_id)
      .into_iter()
      .map(|bundle| bundle.id.clone())
      .collect();

    let exclusive: Vec<String> = members
      .iter()
      .filter(|bundle_id| {
        self
          .get_bundle_groups_containing_bundle(bundle_id)
          .len()
          == 1
      })
      .cloned()
      .collect();

    // The group node goes last, after its exclusive members
    stack.push(Removal::BundleGroupNode {
      bundle_group_id: bundle_group_id.to_string(),
      members,
    });

    for bundle_id in exclusive.into_iter().rev() {
      stack.push(Removal::Bundle(bundle_id));
    }
  }

  fn remove_bundle_group_node(&mut self, bundle_group_id: &str, members: &[String]) {
    if self.graph.has_node(bundle_group_id) {
      self.graph.remove_node(bundle_group_id, true);
      tracing::debug!(bundle_group_id, "Removed bundle group");
    }

    debug_assert!(
      members
        .iter()
        .filter(|bundle_id| self.graph.has_node(bundle_id))
        .all(|bundle_id| !self.get_bundle_groups_containing_bundle(bundle_id).is_empty()),
      "Bundles of removed bundle group {} must belong to another group",
      bundle_group_id
    );
  }

  /// Unlinks a bundle from the bundle groups of `dependency_id` when no dependency the bundle
  /// still loads leads into them.
  pub fn remove_external_dependency(&mut self, bundle_id: &str, dependency_id: &str) {
    let bundle_group_ids: Vec<String> = self
      .graph
      .get_nodes_connected_from(dependency_id, BundleGraphEdgeType::Null)
      .into_iter()
      .filter(|node| matches!(node, BundleGraphNode::BundleGroup(_)))
      .map(|node| node.id().to_string())
      .collect();

    for bundle_group_id in bundle_group_ids {
      let unused = self
        .graph
        .get_nodes_connected_to(&bundle_group_id, BundleGraphEdgeType::Null)
        .into_iter()
        .filter_map(BundleGraphNode::as_dependency)
        .all(|dependency| {
          !self.bundle_has_dependency(bundle_id, &dependency.id)
            || self
              .graph
              .has_edge(bundle_id, &dependency.id, BundleGraphEdgeType::InternalAsync)
        });

      if unused
        && self
          .graph
          .remove_edge(bundle_id, &bundle_group_id, BundleGraphEdgeType::Bundle, false)
      {
        tracing::trace!(bundle_id, %bundle_group_id, "Removed external dependency");
      }
    }
  }
}
