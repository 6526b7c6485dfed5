use std::collections::HashSet;

use atlaspack_bundle_graph::bundle_graph::AssetNode;
use atlaspack_bundle_graph::BundleGraph;
use pretty_assertions::assert_eq;
use rayon::prelude::*;

mod support;

use support::*;

const ENTRIES: [&str; 3] = ["home", "search", "checkout"];

/// Bundles a single entry that uses `shared` through one export named after the entry
fn entry_fragment(entry: &str) -> anyhow::Result<BundleGraph> {
  let mut shared = AssetNode::new(asset("shared"));
  shared.used_symbols.insert(entry.to_string());

  let mut graph = Modules::new()
    .entry(&format!("{}_dep", entry), asset(entry))
    .dependency(entry, dependency(&format!("{}_to_shared", entry), None), shared)
    .build()?;

  bundle_dependency(&mut graph, &format!("{}_dep", entry))?;
  Ok(graph)
}

fn fragments() -> anyhow::Result<Vec<BundleGraph>> {
  ENTRIES.into_par_iter().map(entry_fragment).collect()
}

fn merge_all<'a>(fragments: impl IntoIterator<Item = &'a BundleGraph>) -> anyhow::Result<BundleGraph> {
  let mut graph = BundleGraph::new();
  for fragment in fragments {
    graph.merge(fragment)?;
  }

  Ok(graph)
}

fn sorted_bundle_ids(graph: &BundleGraph) -> Vec<String> {
  let mut bundle_ids = bundle_ids(graph);
  bundle_ids.sort();
  bundle_ids
}

#[test]
fn merges_bundle_graphs_built_in_parallel() -> anyhow::Result<()> {
  let fragments = fragments()?;
  let graph = merge_all(&fragments)?;

  let expected: HashSet<String> = ENTRIES.iter().map(|entry| entry.to_string()).collect();
  assert_eq!(graph.get_used_symbols_asset("shared"), &expected);
  assert_eq!(graph.get_bundles().len(), ENTRIES.len());

  for entry in ENTRIES {
    let bundles = graph.find_bundles_with_asset(entry);
    assert_eq!(bundles.len(), 1);
    assert!(graph.bundle_has_asset(&bundles[0].id, "shared"));
  }

  graph.verify()?;
  Ok(())
}

#[test]
fn merge_order_does_not_matter() -> anyhow::Result<()> {
  let fragments = fragments()?;

  let mut forward = merge_all(&fragments)?;
  let mut backward = merge_all(fragments.iter().rev())?;

  assert_eq!(sorted_bundle_ids(&forward), sorted_bundle_ids(&backward));
  assert_eq!(
    forward.get_used_symbols_asset("shared"),
    backward.get_used_symbols_asset("shared")
  );

  for bundle_id in sorted_bundle_ids(&forward) {
    assert_eq!(
      forward.get_content_hash(&bundle_id)?,
      backward.get_content_hash(&bundle_id)?
    );
  }

  for asset_id in ENTRIES.iter().copied().chain(["shared"]) {
    assert_eq!(
      forward.get_asset_public_id(asset_id)?,
      backward.get_asset_public_id(asset_id)?
    );
  }

  Ok(())
}

#[test]
fn merging_a_fragment_twice_changes_nothing() -> anyhow::Result<()> {
  let fragments = fragments()?;
  let mut graph = merge_all(&fragments)?;
  let before = graph.serialize();

  graph.merge(&fragments[0])?;

  assert_eq!(graph.graph().edges().len(), before.edges.len());
  assert_eq!(graph.serialize().public_id_by_asset_id, before.public_id_by_asset_id);
  assert_eq!(
    graph.get_used_symbols_asset("shared").len(),
    ENTRIES.len()
  );
  graph.verify()?;

  Ok(())
}
