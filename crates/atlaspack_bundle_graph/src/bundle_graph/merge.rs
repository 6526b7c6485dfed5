use std::collections::HashSet;

use super::generate_public_id;
use super::BundleGraph;
use super::BundleGraphEdgeType;
use super::BundleGraphNode;
use crate::error::BundleGraphResult;
use crate::graph::GraphNode;

impl BundleGraph {
  /// Merges a bundle graph computed independently, e.g. for another entry, into this one.
  ///
  /// Used symbols of shared assets and dependencies are unioned, and a shared dependency stays
  /// excluded only if both graphs excluded or deferred it. Nodes and edges only `other` has are
  /// copied over. Merging is commutative on the shared nodes and merging the same graph twice
  /// changes nothing.
  ///
  /// Public ids are resolved before anything is copied, so a merge that fails leaves this graph
  /// as it was.
  #[tracing::instrument(level = "debug", skip_all, fields(nodes = other.graph.node_count()))]
  pub fn merge(&mut self, other: &BundleGraph) -> BundleGraphResult<()> {
    let public_ids = self.merged_public_ids(other)?;
    let mut added_nodes = 0;

    for node in other.graph.nodes() {
      let Some(existing) = self.graph.get_node_mut(node.id()) else {
        self.graph.add_node(node.clone());
        added_nodes += 1;
        continue;
      };

      match (existing, node) {
        (BundleGraphNode::Asset(existing), BundleGraphNode::Asset(node)) => {
          existing
            .used_symbols
            .extend(node.used_symbols.iter().cloned());
        }
        (BundleGraphNode::Dependency(existing), BundleGraphNode::Dependency(node)) => {
          existing
            .used_symbols_down
            .extend(node.used_symbols_down.iter().cloned());
          existing
            .used_symbols_up
            .extend(node.used_symbols_up.iter().cloned());
          existing.excluded = existing.is_skipped() && node.is_skipped();
        }
        (BundleGraphNode::Asset(_) | BundleGraphNode::Dependency(_), node) => {
          panic!("Cannot merge {} into a node of another type", node)
        }
        _ => {}
      }
    }

    let mut added_edges = 0;
    for (from, to, edge_type) in other.graph.edges() {
      if !self.graph.add_edge(from, to, edge_type) {
        continue;
      }

      added_edges += 1;
      if edge_type == BundleGraphEdgeType::Contains {
        self.invalidate_content_hash(from);
      }
    }

    for (asset_id, public_id) in public_ids {
      self.asset_public_ids.insert(public_id.clone());
      self.public_id_by_asset_id.insert(asset_id, public_id);
    }

    tracing::debug!(added_nodes, added_edges, "Merged bundle graph");
    Ok(())
  }

  /// Public ids for the assets only `other` knows, keeping theirs unless it is already taken.
  fn merged_public_ids(&self, other: &BundleGraph) -> BundleGraphResult<Vec<(String, String)>> {
    let mut public_ids: Vec<(&String, &String)> = other.public_id_by_asset_id.iter().collect();
    public_ids.sort();

    let mut reserved: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    for (asset_id, public_id) in public_ids {
      if self.public_id_by_asset_id.contains_key(asset_id) {
        continue;
      }

      let taken =
        |candidate: &str| self.asset_public_ids.contains(candidate) || reserved.contains(candidate);

      let public_id = if taken(public_id.as_str()) {
        let regenerated =
          generate_public_id(asset_id, self.options.min_public_id_length, taken)?;
        tracing::debug!(
          asset_id = %asset_id,
          public_id = %regenerated,
          "Regenerated colliding public id"
        );
        regenerated
      } else {
        public_id.clone()
      };

      reserved.insert(public_id.clone());
      merged.push((asset_id.clone(), public_id));
    }

    Ok(merged)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;
  use std::collections::HashSet;

  use pretty_assertions::assert_eq;

  use super::super::test_utils::*;
  use super::*;
  use crate::error::BundleGraphError;

  fn symbols(names: &[&str]) -> HashSet<String> {
    names.iter().map(|name| name.to_string()).collect()
  }

  fn fragment_with_public_id(asset_id: &str, public_id: &str) -> BundleGraph {
    let mut builder = ModuleGraphBuilder::new();
    builder.entry("entry_dep", asset(asset_id));

    let previous = HashMap::from([(asset_id.to_string(), public_id.to_string())]);
    BundleGraph::from_module_graph(builder.module_graph(), &previous).unwrap()
  }

  fn fragment() -> BundleGraph {
    ModuleGraphBuilder::new()
      .entry("entry_dep", asset("a"))
      .dependency("a", dependency("a_to_b"), Some(asset("b")))
      .build()
  }

  #[test]
  fn merging_an_empty_graph_changes_nothing() {
    let mut graph = fragment();
    let (_, bundle_id) = create_entry_bundle(&mut graph, "entry_dep");
    let hash = graph.get_content_hash(&bundle_id).unwrap();
    let before = graph.clone();

    graph.merge(&BundleGraph::new()).unwrap();

    assert_eq!(graph.graph().edges(), before.graph().edges());
    assert_eq!(graph.public_id_by_asset_id, before.public_id_by_asset_id);
    assert_eq!(graph.get_content_hash(&bundle_id).unwrap(), hash);
  }

  #[test]
  fn unions_used_symbols() {
    let mut graph = fragment();
    graph
      .asset_node_mut("b")
      .used_symbols
      .insert(String::from("foo"));
    graph
      .dependency_node_mut("a_to_b")
      .used_symbols_down
      .insert(String::from("foo"));

    let mut other = fragment();
    other
      .asset_node_mut("b")
      .used_symbols
      .insert(String::from("bar"));
    other
      .dependency_node_mut("a_to_b")
      .used_symbols_up
      .insert(String::from("bar"));

    graph.merge(&other).unwrap();
    graph.merge(&other).unwrap();

    assert_eq!(graph.get_used_symbols_asset("b"), &symbols(&["foo", "bar"]));
    assert_eq!(
      graph.dependency_node("a_to_b").used_symbols_down,
      symbols(&["foo"])
    );
    assert_eq!(graph.get_used_symbols_dependency("a_to_b"), &symbols(&["bar"]));
  }

  #[test]
  fn dependencies_stay_excluded_only_if_excluded_everywhere() {
    let merged = |excluded: bool, other_excluded: bool, other_deferred: bool| {
      let mut graph = fragment();
      graph.dependency_node_mut("a_to_b").excluded = excluded;

      let mut other = fragment();
      let node = other.dependency_node_mut("a_to_b");
      node.excluded = other_excluded;
      node.has_deferred = other_deferred;

      graph.merge(&other).unwrap();
      graph.dependency_node("a_to_b").excluded
    };

    assert!(merged(true, true, false));
    assert!(merged(true, false, true));
    assert!(!merged(true, false, false));
    assert!(!merged(false, true, false));
  }

  #[test]
  fn copies_nodes_edges_and_public_ids_from_other() {
    let mut graph = fragment();

    let mut other = ModuleGraphBuilder::new()
      .entry("entry_dep", asset("a"))
      .dependency("a", dependency("a_to_c"), Some(asset("c")))
      .build();
    let (_, bundle_id) = create_entry_bundle(&mut other, "entry_dep");

    graph.merge(&other).unwrap();

    assert!(graph.get_asset("c").is_some());
    assert!(graph.bundle_has_asset(&bundle_id, "c"));
    assert_eq!(
      graph.get_asset_public_id("c").unwrap(),
      other.get_asset_public_id("c").unwrap()
    );
    assert!(graph.verify().is_ok());
  }

  #[test]
  fn regenerates_colliding_public_ids() {
    let mut graph = fragment_with_public_id("a", "prev1");
    graph.merge(&fragment_with_public_id("b", "prev1")).unwrap();

    assert_eq!(graph.get_asset_public_id("a").unwrap(), "prev1");
    assert_ne!(graph.get_asset_public_id("b").unwrap(), "prev1");
    assert!(graph.verify().is_ok());
  }

  #[test]
  fn failed_merges_leave_the_graph_untouched() {
    let mut graph = fragment_with_public_id("a", "prev1");

    // Every id c could be given is already in use
    let full = generate_public_id("c", usize::MAX, |_| false).unwrap();
    for end in 5..=full.len() {
      graph.asset_public_ids.insert(full[..end].to_string());
    }
    let before = graph.clone();

    let result = graph.merge(&fragment_with_public_id("c", "prev1"));

    assert!(matches!(
      result,
      Err(BundleGraphError::PublicIdCollision(id)) if id == "c"
    ));
    assert!(graph.get_asset("c").is_none());
    assert_eq!(graph.graph().edges(), before.graph().edges());
    assert_eq!(graph.public_id_by_asset_id, before.public_id_by_asset_id);
    assert_eq!(graph.asset_public_ids, before.asset_public_ids);
  }

  #[test]
  fn invalidates_content_hashes_of_bundles_that_gained_contents() {
    let mut graph = fragment();
    let (_, bundle_id) = create_entry_bundle(&mut graph, "entry_dep");
    let hash = graph.get_content_hash(&bundle_id).unwrap();

    let mut other = fragment();
    create_entry_bundle(&mut other, "entry_dep");
    graph.merge(&other).unwrap();
    assert_eq!(graph.bundle_content_hashes.get(&bundle_id), Some(&hash));

    let mut other = ModuleGraphBuilder::new()
      .entry("entry_dep", asset("a"))
      .dependency("a", dependency("a_to_b"), Some(asset("b")))
      .dependency("b", dependency("b_to_c"), Some(asset("c")))
      .build();
    create_entry_bundle(&mut other, "entry_dep");
    graph.merge(&other).unwrap();

    assert!(graph.bundle_has_asset(&bundle_id, "c"));
    assert_ne!(graph.get_content_hash(&bundle_id).unwrap(), hash);
  }
}
