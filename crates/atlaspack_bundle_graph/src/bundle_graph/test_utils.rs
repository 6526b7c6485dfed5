use std::collections::HashMap;
use std::path::PathBuf;

use petgraph::graph::NodeIndex;

use super::BundleGraph;
use super::CreateBundleOptions;
use crate::module_graph::ModuleGraph;
use crate::types::Asset;
use crate::types::AssetStats;
use crate::types::Dependency;
use crate::types::Priority;
use crate::types::Symbol;
use crate::types::Target;

pub(crate) fn target() -> Target {
  Target::default()
}

pub(crate) fn asset(id: &str) -> Asset {
  Asset {
    id: id.to_string(),
    file_path: PathBuf::from(format!("{}.js", id)),
    output_hash: format!("hash-{}", id),
    stats: AssetStats { size: 10, time: 0 },
    symbols: Some(Vec::new()),
    ..Asset::default()
  }
}

/// An asset exporting `(exported, local)` pairs
pub(crate) fn asset_with_symbols(id: &str, symbols: &[(&str, &str)]) -> Asset {
  Asset {
    symbols: Some(
      symbols
        .iter()
        .map(|(exported, local)| Symbol::new(*exported, *local))
        .collect(),
    ),
    ..asset(id)
  }
}

pub(crate) fn dependency(id: &str) -> Dependency {
  Dependency::new(id, format!("./{}", id))
}

pub(crate) fn async_dependency(id: &str) -> Dependency {
  Dependency {
    priority: Priority::Lazy,
    ..dependency(id)
  }
}

/// A dependency requesting `(exported, local)` pairs from the resolved asset
pub(crate) fn dependency_with_symbols(id: &str, symbols: &[(&str, &str)]) -> Dependency {
  Dependency {
    symbols: Some(
      symbols
        .iter()
        .map(|(exported, local)| Symbol::new(*exported, *local))
        .collect(),
    ),
    ..dependency(id)
  }
}

/// Builds module graphs for tests, addressing nodes by id
pub(crate) struct ModuleGraphBuilder {
  graph: ModuleGraph,
  indices: HashMap<String, NodeIndex>,
}

impl ModuleGraphBuilder {
  pub(crate) fn new() -> Self {
    ModuleGraphBuilder {
      graph: ModuleGraph::new(),
      indices: HashMap::new(),
    }
  }

  /// Adds an entry dependency from the root resolving to `asset`
  pub(crate) fn entry(&mut self, dependency_id: &str, asset: Asset) -> &mut Self {
    let root = self.graph.root_node();
    let dependency = Dependency {
      is_entry: true,
      ..dependency(dependency_id)
    };

    let dependency_idx = self.graph.add_dependency(root, dependency);
    self.indices.insert(dependency_id.to_string(), dependency_idx);
    self.link_asset(dependency_idx, asset);
    self
  }

  /// Adds `dependency` to the asset `from`, resolving to `to` when given.
  ///
  /// Assets that were added before are linked to rather than added again.
  pub(crate) fn dependency(
    &mut self,
    from: &str,
    dependency: Dependency,
    to: Option<Asset>,
  ) -> &mut Self {
    let from_idx = self.index(from);
    let dependency_id = dependency.id.clone();
    let dependency_idx = self.graph.add_dependency(
      from_idx,
      Dependency {
        source_asset_id: Some(from.to_string()),
        ..dependency
      },
    );

    self.indices.insert(dependency_id, dependency_idx);
    if let Some(asset) = to {
      self.link_asset(dependency_idx, asset);
    }

    self
  }

  pub(crate) fn build(&self) -> BundleGraph {
    BundleGraph::from_module_graph(&self.graph, &HashMap::new()).unwrap()
  }

  pub(crate) fn module_graph(&self) -> &ModuleGraph {
    &self.graph
  }

  fn index(&self, id: &str) -> NodeIndex {
    *self
      .indices
      .get(id)
      .unwrap_or_else(|| panic!("{} was not added to the module graph", id))
  }

  fn link_asset(&mut self, parent_idx: NodeIndex, asset: Asset) {
    match self.indices.get(&asset.id) {
      Some(asset_idx) => self.graph.add_edge(&parent_idx, asset_idx),
      None => {
        let asset_id = asset.id.clone();
        let asset_idx = self.graph.add_asset(parent_idx, asset);
        self.indices.insert(asset_id, asset_idx);
      }
    }
  }
}

/// Creates a bundle group for `dependency_id` with a single bundle for the resolved asset.
///
/// Returns the ids of the group and of the bundle.
pub(crate) fn create_entry_bundle(graph: &mut BundleGraph, dependency_id: &str) -> (String, String) {
  let bundle_group_id = graph.create_bundle_group(dependency_id, target()).unwrap();
  let entry_asset_id = graph.bundle_group(&bundle_group_id).entry_asset_id.clone();

  let bundle_id = graph
    .create_bundle(CreateBundleOptions {
      entry_asset_id: Some(entry_asset_id),
      target: target(),
      ..CreateBundleOptions::default()
    })
    .unwrap();

  graph.add_bundle_to_bundle_group(&bundle_id, &bundle_group_id);
  (bundle_group_id, bundle_id)
}
