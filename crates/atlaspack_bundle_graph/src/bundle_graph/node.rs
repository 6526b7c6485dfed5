use std::collections::HashSet;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;
use serde_repr::Deserialize_repr;
use serde_repr::Serialize_repr;

use crate::graph::GraphNode;
use crate::types::Asset;
use crate::types::Bundle;
use crate::types::BundleGroup;
use crate::types::Dependency;

pub const ROOT_NODE_ID: &str = "@@root";

/// Edge types in the bundle graph.
///
/// Numeric values match the JS bundle graph edge types.
#[derive(Clone, Copy, Debug, Default, Deserialize_repr, Eq, Hash, PartialEq, Serialize_repr)]
#[repr(u8)]
pub enum BundleGraphEdgeType {
  /// Structural edges: root -> dependency -> asset -> dependency..., bundle -> entry asset,
  /// dependency -> bundle group -> bundle. Followed when traversing a bundle's contents.
  #[default]
  Null = 1,
  /// Constant time membership of an asset or dependency in a bundle.
  Contains = 2,
  /// Links between bundles and bundle groups, forming the bundle hierarchy.
  Bundle = 3,
  /// The target of the edge lives in another bundle, or is an inline bundle.
  References = 4,
  /// The bundle has inlined the resolution of an async dependency.
  InternalAsync = 5,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetNode {
  pub value: Asset,

  /// Exports of the asset that are used somewhere in the build
  #[serde(default)]
  pub used_symbols: HashSet<String>,
}

impl AssetNode {
  pub fn new(value: Asset) -> Self {
    AssetNode {
      value,
      used_symbols: HashSet::new(),
    }
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyNode {
  pub value: Dependency,

  /// The resolved asset has not been requested by any symbol and was never built
  #[serde(default)]
  pub has_deferred: bool,

  /// Symbol propagation proved that nothing is used through this dependency
  #[serde(default)]
  pub excluded: bool,

  /// Symbols requested from the resolved asset by the importing side
  #[serde(default)]
  pub used_symbols_down: HashSet<String>,

  /// Symbols the resolved asset actually provides to the importing side
  #[serde(default)]
  pub used_symbols_up: HashSet<String>,
}

impl DependencyNode {
  pub fn new(value: Dependency) -> Self {
    DependencyNode {
      value,
      has_deferred: false,
      excluded: false,
      used_symbols_down: HashSet::new(),
      used_symbols_up: HashSet::new(),
    }
  }

  /// Whether the dependency is tree-shaken and must not be followed into bundles
  pub fn is_skipped(&self) -> bool {
    self.has_deferred || self.excluded
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleGroupNode {
  pub id: String,
  pub value: BundleGroup,
}

impl BundleGroupNode {
  pub fn new(value: BundleGroup) -> Self {
    BundleGroupNode {
      id: value.id(),
      value,
    }
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[allow(clippy::large_enum_variant)]
pub enum BundleGraphNode {
  Root,
  Asset(AssetNode),
  Dependency(DependencyNode),
  Bundle(Bundle),
  BundleGroup(BundleGroupNode),
}

impl GraphNode for BundleGraphNode {
  fn id(&self) -> &str {
    match self {
      BundleGraphNode::Root => ROOT_NODE_ID,
      BundleGraphNode::Asset(node) => &node.value.id,
      BundleGraphNode::Dependency(node) => &node.value.id,
      BundleGraphNode::Bundle(bundle) => &bundle.id,
      BundleGraphNode::BundleGroup(node) => &node.id,
    }
  }
}

impl BundleGraphNode {
  pub fn as_asset(&self) -> Option<&Asset> {
    match self {
      BundleGraphNode::Asset(node) => Some(&node.value),
      _ => None,
    }
  }

  pub fn as_dependency(&self) -> Option<&Dependency> {
    match self {
      BundleGraphNode::Dependency(node) => Some(&node.value),
      _ => None,
    }
  }

  pub fn as_bundle(&self) -> Option<&Bundle> {
    match self {
      BundleGraphNode::Bundle(bundle) => Some(bundle),
      _ => None,
    }
  }

  pub fn as_bundle_group(&self) -> Option<&BundleGroup> {
    match self {
      BundleGraphNode::BundleGroup(node) => Some(&node.value),
      _ => None,
    }
  }

  pub fn is_asset_or_dependency(&self) -> bool {
    matches!(
      self,
      BundleGraphNode::Asset(_) | BundleGraphNode::Dependency(_)
    )
  }

  fn type_name(&self) -> &'static str {
    match self {
      BundleGraphNode::Root => "Root",
      BundleGraphNode::Asset(_) => "Asset",
      BundleGraphNode::Dependency(_) => "Dependency",
      BundleGraphNode::Bundle(_) => "Bundle",
      BundleGraphNode::BundleGroup(_) => "BundleGroup",
    }
  }
}

impl Display for BundleGraphNode {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: {}", self.type_name(), self.id())
  }
}
