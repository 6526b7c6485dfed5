use serde::Deserialize;
use serde::Serialize;

/// Options that control how a [`crate::BundleGraph`] is built and checked.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleGraphOptions {
  /// The shortest public id prefix that is handed out to an asset
  ///
  /// Longer prefixes are only tried when a shorter one collides with an existing id.
  ///
  pub min_public_id_length: usize,

  /// Re-check the graph invariants after every bundle or bundle group removal
  ///
  /// This is expensive and is meant for debugging bundler plugins.
  ///
  pub verify_mutations: bool,
}

impl Default for BundleGraphOptions {
  fn default() -> Self {
    Self {
      min_public_id_length: 5,
      verify_mutations: false,
    }
  }
}
