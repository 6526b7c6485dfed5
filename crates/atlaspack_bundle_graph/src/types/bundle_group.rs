use serde::Deserialize;
use serde::Serialize;

use super::asset::AssetId;
use super::target::Target;

/// The bundles loaded together for an entry or an async split point
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleGroup {
  /// The asset the group was created for
  pub entry_asset_id: AssetId,

  pub target: Target,

  /// Member bundles in the order they were added
  pub bundle_ids: Vec<String>,
}

impl BundleGroup {
  pub fn new(entry_asset_id: AssetId, target: Target) -> Self {
    BundleGroup {
      entry_asset_id,
      target,
      bundle_ids: Vec::new(),
    }
  }

  pub fn id(&self) -> String {
    bundle_group_id(&self.entry_asset_id)
  }
}

/// Bundle group ids are derived from the id of their entry asset
pub fn bundle_group_id(entry_asset_id: &str) -> String {
  format!("bundle_group:{}", entry_asset_id)
}
