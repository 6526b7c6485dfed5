use serde::Deserialize;
use serde::Serialize;

use super::asset::AssetId;
use super::environment::Environment;
use super::file_type::FileType;
use super::target::Target;

/// Determines how a bundle is emitted relative to the bundles that load it
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleBehavior {
  /// The bundle is embedded into the output of the bundle that references it
  Inline,
  /// The bundle is emitted separately and never shares assets with other bundles
  Isolated,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct BundleStats {
  /// The sum of the sizes of every asset in the bundle
  pub size: u64,
}

/// A bundle is an output file containing a set of assets
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
  pub id: String,

  #[serde(default)]
  pub bundle_behavior: Option<BundleBehavior>,

  #[serde(rename = "type")]
  pub bundle_type: FileType,

  /// The assets the bundle was created for, in load order
  ///
  /// The last entry is the main entry of the bundle.
  ///
  pub entry_asset_ids: Vec<AssetId>,

  pub env: Environment,

  /// Whether the bundle may be split into multiple bundles by the bundler
  #[serde(default)]
  pub is_splittable: bool,

  #[serde(default)]
  pub name: Option<String>,

  #[serde(default)]
  pub stats: BundleStats,

  pub target: Target,
}

impl Bundle {
  pub fn is_inline(&self) -> bool {
    self.bundle_behavior == Some(BundleBehavior::Inline)
  }

  /// The entry asset whose execution the bundle exists for
  pub fn main_entry_id(&self) -> Option<&AssetId> {
    self.entry_asset_ids.last()
  }
}
