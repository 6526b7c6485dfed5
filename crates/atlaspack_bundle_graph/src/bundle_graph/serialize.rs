use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use super::BundleGraph;
use super::BundleGraphEdgeType;
use super::BundleGraphNode;
use crate::error::BundleGraphError;
use crate::error::BundleGraphResult;
use crate::options::BundleGraphOptions;

/// A snapshot of a bundle graph that can be cached and restored.
///
/// Edges are stored as `(from, to, type)` triples in insertion order, which keeps traversal order
/// and therefore content hashes identical after a round trip.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedBundleGraph {
  pub nodes: Vec<BundleGraphNode>,
  pub edges: Vec<(String, String, BundleGraphEdgeType)>,
  pub public_id_by_asset_id: BTreeMap<String, String>,
  pub asset_public_ids: BTreeSet<String>,
  #[serde(default)]
  pub bundle_content_hashes: BTreeMap<String, String>,
  #[serde(default)]
  pub options: BundleGraphOptions,
}

impl BundleGraph {
  pub fn serialize(&self) -> SerializedBundleGraph {
    SerializedBundleGraph {
      nodes: self.graph.nodes().cloned().collect(),
      edges: self
        .graph
        .edges()
        .into_iter()
        .map(|(from, to, edge_type)| (from.to_string(), to.to_string(), edge_type))
        .collect(),
      public_id_by_asset_id: self
        .public_id_by_asset_id
        .iter()
        .map(|(asset_id, public_id)| (asset_id.clone(), public_id.clone()))
        .collect(),
      asset_public_ids: self.asset_public_ids.iter().cloned().collect(),
      bundle_content_hashes: self
        .bundle_content_hashes
        .iter()
        .map(|(bundle_id, hash)| (bundle_id.clone(), hash.clone()))
        .collect(),
      options: self.options.clone(),
    }
  }

  /// Restores a graph from a snapshot, including its cached content hashes.
  #[tracing::instrument(
    level = "debug",
    skip_all,
    fields(nodes = serialized.nodes.len(), edges = serialized.edges.len())
  )]
  pub fn deserialize(serialized: SerializedBundleGraph) -> BundleGraphResult<Self> {
    let mut bundle_graph = BundleGraph::with_options(serialized.options);

    for node in serialized.nodes {
      bundle_graph.graph.add_node(node);
    }

    for (from, to, edge_type) in &serialized.edges {
      for id in [from, to] {
        if !bundle_graph.graph.has_node(id) {
          return Err(BundleGraphError::NodeNotFound(id.clone()));
        }
      }

      bundle_graph.graph.add_edge(from, to, *edge_type);
    }

    bundle_graph.public_id_by_asset_id = serialized.public_id_by_asset_id.into_iter().collect();
    bundle_graph.asset_public_ids = serialized.asset_public_ids.into_iter().collect();
    bundle_graph.bundle_content_hashes = serialized.bundle_content_hashes.into_iter().collect();

    Ok(bundle_graph)
  }

  pub fn to_json(&self) -> BundleGraphResult<String> {
    Ok(serde_json::to_string(&self.serialize())?)
  }

  pub fn from_json(json: &str) -> BundleGraphResult<Self> {
    let serialized: SerializedBundleGraph = serde_json::from_str(json)?;
    Self::deserialize(serialized)
  }
}
