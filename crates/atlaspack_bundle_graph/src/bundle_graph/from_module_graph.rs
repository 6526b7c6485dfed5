use std::collections::HashMap;

use petgraph::graph::NodeIndex;

use super::generate_public_id;
use super::BundleGraph;
use super::BundleGraphEdgeType;
use super::BundleGraphNode;
use crate::error::BundleGraphResult;
use crate::module_graph::ModuleGraph;
use crate::module_graph::ModuleGraphNode;
use crate::options::BundleGraphOptions;

impl BundleGraph {
  /// Builds the initial bundle graph from a module graph.
  ///
  /// `previous_public_ids` maps asset ids to the public ids they were given by an earlier build,
  /// which keeps public ids stable across incremental rebuilds.
  pub fn from_module_graph(
    module_graph: &ModuleGraph,
    previous_public_ids: &HashMap<String, String>,
  ) -> BundleGraphResult<Self> {
    Self::from_module_graph_with_options(
      module_graph,
      previous_public_ids,
      BundleGraphOptions::default(),
    )
  }

  #[tracing::instrument(level = "debug", skip_all, fields(nodes = module_graph.nodes().count()))]
  pub fn from_module_graph_with_options(
    module_graph: &ModuleGraph,
    previous_public_ids: &HashMap<String, String>,
    options: BundleGraphOptions,
  ) -> BundleGraphResult<Self> {
    let mut bundle_graph = BundleGraph::with_options(options);

    // Previous ids stay reserved, even for assets that are visited after new ids are generated
    bundle_graph
      .asset_public_ids
      .extend(previous_public_ids.values().cloned());

    for (_, node) in module_graph.nodes() {
      match node {
        ModuleGraphNode::Root | ModuleGraphNode::AssetGroup(_) => {}
        ModuleGraphNode::Asset(asset_node) => {
          let previous = previous_public_ids.get(&asset_node.value.id);
          bundle_graph.assign_public_id(&asset_node.value.id, previous.map(String::as_str))?;
          bundle_graph
            .graph
            .add_node(BundleGraphNode::Asset(asset_node.clone()));
        }
        ModuleGraphNode::Dependency(dependency_node) => {
          bundle_graph
            .graph
            .add_node(BundleGraphNode::Dependency(dependency_node.clone()));
        }
      }
    }

    // Asset groups are not copied. Edges into a group are redirected to the group's assets and
    // edges out of a group originate from every node pointing at the group instead.
    for (from, to) in module_graph.edges() {
      let from_ids = resolve_asset_groups(module_graph, from, ModuleGraph::incoming);
      let to_ids = resolve_asset_groups(module_graph, to, ModuleGraph::outgoing);

      for from_id in &from_ids {
        for to_id in &to_ids {
          bundle_graph
            .graph
            .add_edge(from_id, to_id, BundleGraphEdgeType::Null);
        }
      }
    }

    tracing::debug!(
      nodes = bundle_graph.graph.node_count(),
      public_ids = bundle_graph.public_id_by_asset_id.len(),
      "Created bundle graph from module graph"
    );

    Ok(bundle_graph)
  }

  /// Assigns a public id to `asset_id`, reusing `previous` when given.
  pub(crate) fn assign_public_id(
    &mut self,
    asset_id: &str,
    previous: Option<&str>,
  ) -> BundleGraphResult<String> {
    if let Some(public_id) = self.public_id_by_asset_id.get(asset_id) {
      return Ok(public_id.clone());
    }

    let public_id = match previous {
      Some(public_id) => public_id.to_string(),
      None => generate_public_id(asset_id, self.options.min_public_id_length, |candidate| {
        self.asset_public_ids.contains(candidate)
      })?,
    };

    self.asset_public_ids.insert(public_id.clone());
    self
      .public_id_by_asset_id
      .insert(asset_id.to_string(), public_id.clone());

    Ok(public_id)
  }
}

fn resolve_asset_groups<'a>(
  module_graph: &'a ModuleGraph,
  index: NodeIndex,
  neighbours: fn(&ModuleGraph, NodeIndex) -> Vec<NodeIndex>,
) -> Vec<&'a str> {
  match module_graph.node(index) {
    ModuleGraphNode::AssetGroup(_) => neighbours(module_graph, index)
      .into_iter()
      .map(|index| module_graph.node(index).id())
      .collect(),
    node => vec![node.id()],
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::super::test_utils::*;
  use super::*;
  use crate::bundle_graph::ROOT_NODE_ID;

  fn edges(graph: &BundleGraph) -> Vec<(&str, &str, BundleGraphEdgeType)> {
    graph.graph().edges()
  }

  #[test]
  fn copies_assets_and_dependencies_with_null_edges() {
    let graph = ModuleGraphBuilder::new()
      .entry("entry_dep", asset("a"))
      .dependency("a", dependency("a_to_b"), Some(asset("b")))
      .build();

    assert_eq!(
      edges(&graph),
      vec![
        (ROOT_NODE_ID, "entry_dep", BundleGraphEdgeType::Null),
        ("entry_dep", "a", BundleGraphEdgeType::Null),
        ("a", "a_to_b", BundleGraphEdgeType::Null),
        ("a_to_b", "b", BundleGraphEdgeType::Null),
      ]
    );
  }

  #[test]
  fn rewrites_edges_through_asset_groups() {
    let mut module_graph = ModuleGraph::new();
    let root = module_graph.root_node();
    let dep_1 = module_graph.add_dependency(root, dependency("dep_1"));
    let dep_2 = module_graph.add_dependency(root, dependency("dep_2"));
    let group = module_graph.add_asset_group(dep_1, "group");
    module_graph.add_edge(&dep_2, &group);
    module_graph.add_asset(group, asset("a"));
    module_graph.add_asset(group, asset("b"));

    let graph = BundleGraph::from_module_graph(&module_graph, &HashMap::new()).unwrap();

    assert!(!graph.graph().has_node("group"));
    assert_eq!(
      edges(&graph),
      vec![
        (ROOT_NODE_ID, "dep_1", BundleGraphEdgeType::Null),
        (ROOT_NODE_ID, "dep_2", BundleGraphEdgeType::Null),
        ("dep_1", "a", BundleGraphEdgeType::Null),
        ("dep_1", "b", BundleGraphEdgeType::Null),
        ("dep_2", "a", BundleGraphEdgeType::Null),
        ("dep_2", "b", BundleGraphEdgeType::Null),
      ]
    );
  }

  #[test]
  fn assigns_unique_public_ids() {
    let graph = ModuleGraphBuilder::new()
      .entry("entry_dep", asset("a"))
      .dependency("a", dependency("a_to_b"), Some(asset("b")))
      .build();

    let a = graph.get_asset_public_id("a").unwrap();
    let b = graph.get_asset_public_id("b").unwrap();

    assert_eq!(a.len(), 5);
    assert_ne!(a, b);
  }

  #[test]
  fn reuses_previous_public_ids() {
    let builder = {
      let mut builder = ModuleGraphBuilder::new();
      builder.entry("entry_dep", asset("a"));
      builder
    };

    let previous = HashMap::from([(String::from("a"), String::from("prev1"))]);
    let graph = BundleGraph::from_module_graph(builder.module_graph(), &previous).unwrap();

    assert_eq!(graph.get_asset_public_id("a").unwrap(), "prev1");
  }

  #[test]
  fn generated_public_ids_avoid_previous_ids_of_later_assets() {
    let mut builder = ModuleGraphBuilder::new();
    builder
      .entry("entry_dep", asset("a"))
      .dependency("a", dependency("a_to_b"), Some(asset("b")));

    // b previously held the id a would be generated
    let taken = generate_public_id("a", 5, |_| false).unwrap();
    let previous = HashMap::from([(String::from("b"), taken.clone())]);
    let graph = BundleGraph::from_module_graph(builder.module_graph(), &previous).unwrap();

    assert_eq!(graph.get_asset_public_id("b").unwrap(), taken);
    assert_ne!(graph.get_asset_public_id("a").unwrap(), taken);
    assert!(graph.verify().is_ok());
  }

  #[test]
  fn honours_the_minimum_public_id_length() {
    let mut builder = ModuleGraphBuilder::new();
    builder.entry("entry_dep", asset("a"));

    let graph = BundleGraph::from_module_graph_with_options(
      builder.module_graph(),
      &HashMap::new(),
      BundleGraphOptions {
        min_public_id_length: 8,
        ..BundleGraphOptions::default()
      },
    )
    .unwrap();

    assert_eq!(graph.get_asset_public_id("a").unwrap().len(), 8);
  }
}
