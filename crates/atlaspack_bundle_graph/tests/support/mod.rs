#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;

use atlaspack_bundle_graph::bundle_graph::AssetNode;
use atlaspack_bundle_graph::bundle_graph::CreateBundleOptions;
use atlaspack_bundle_graph::module_graph::ModuleGraph;
use atlaspack_bundle_graph::types::Asset;
use atlaspack_bundle_graph::types::AssetStats;
use atlaspack_bundle_graph::types::Dependency;
use atlaspack_bundle_graph::types::Priority;
use atlaspack_bundle_graph::types::Symbol;
use atlaspack_bundle_graph::types::Target;
use atlaspack_bundle_graph::BundleGraph;
use petgraph::graph::NodeIndex;

pub fn asset(id: &str) -> Asset {
  asset_with_symbols(id, &[])
}

pub fn asset_with_symbols(id: &str, symbols: &[(&str, &str)]) -> Asset {
  Asset {
    id: id.to_string(),
    file_path: PathBuf::from(format!("src/{}.js", id)),
    output_hash: format!("{}-output", id),
    stats: AssetStats { size: 100, time: 0 },
    symbols: Some(
      symbols
        .iter()
        .map(|(exported, local)| Symbol::new(*exported, *local))
        .collect(),
    ),
    ..Asset::default()
  }
}

pub fn dependency(id: &str, symbols: Option<&[(&str, &str)]>) -> Dependency {
  Dependency {
    symbols: symbols.map(|symbols| {
      symbols
        .iter()
        .map(|(exported, local)| Symbol::new(*exported, *local))
        .collect()
    }),
    ..Dependency::new(id, format!("./{}", id))
  }
}

pub fn lazy(dependency: Dependency) -> Dependency {
  Dependency {
    priority: Priority::Lazy,
    ..dependency
  }
}

/// Builds a module graph with nodes addressed by id
pub struct Modules {
  graph: ModuleGraph,
  indices: HashMap<String, NodeIndex>,
}

impl Modules {
  pub fn new() -> Self {
    Modules {
      graph: ModuleGraph::new(),
      indices: HashMap::new(),
    }
  }

  pub fn entry(mut self, dependency_id: &str, asset: Asset) -> Self {
    let root = self.graph.root_node();
    let dependency = Dependency {
      is_entry: true,
      ..Dependency::new(dependency_id, format!("./{}", asset.id))
    };

    let dependency_idx = self.graph.add_dependency(root, dependency);
    self.indices.insert(dependency_id.to_string(), dependency_idx);
    self.link(dependency_idx, AssetNode::new(asset))
  }

  pub fn dependency(mut self, from: &str, dependency: Dependency, to: AssetNode) -> Self {
    let from_idx = self.indices[from];
    let dependency_id = dependency.id.clone();
    let dependency_idx = self.graph.add_dependency(
      from_idx,
      Dependency {
        source_asset_id: Some(from.to_string()),
        ..dependency
      },
    );

    self.indices.insert(dependency_id, dependency_idx);
    self.link(dependency_idx, to)
  }

  fn link(mut self, parent_idx: NodeIndex, node: AssetNode) -> Self {
    match self.indices.get(&node.value.id) {
      Some(asset_idx) => self.graph.add_edge(&parent_idx, asset_idx),
      None => {
        let asset_id = node.value.id.clone();
        let asset_idx = self.graph.add_asset_node(parent_idx, node);
        self.indices.insert(asset_id, asset_idx);
      }
    }

    self
  }

  pub fn module_graph(&self) -> &ModuleGraph {
    &self.graph
  }

  pub fn build(&self) -> anyhow::Result<BundleGraph> {
    Ok(BundleGraph::from_module_graph(
      &self.graph,
      &HashMap::new(),
    )?)
  }
}

/// Creates the bundle group of `dependency_id` and a bundle for its entry asset.
///
/// Returns the ids of the group and the bundle.
pub fn bundle_dependency(
  graph: &mut BundleGraph,
  dependency_id: &str,
) -> anyhow::Result<(String, String)> {
  let bundle_group_id = graph.create_bundle_group(dependency_id, Target::default())?;
  let entry_asset_id = graph
    .get_bundle_group(&bundle_group_id)
    .map(|bundle_group| bundle_group.entry_asset_id.clone());

  let bundle_id = graph.create_bundle(CreateBundleOptions {
    entry_asset_id,
    target: Target::default(),
    ..CreateBundleOptions::default()
  })?;

  graph.add_bundle_to_bundle_group(&bundle_id, &bundle_group_id);
  Ok((bundle_group_id, bundle_id))
}

pub fn bundle_ids(graph: &BundleGraph) -> Vec<String> {
  graph
    .get_bundles()
    .into_iter()
    .map(|bundle| bundle.id.clone())
    .collect()
}
