use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::environment::Environment;
use super::file_type::FileType;
use super::symbol::find_exported;
use super::symbol::Symbol;

pub type AssetId = String;

/// Statistics about an asset
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct AssetStats {
  /// The size of the transformed asset in bytes
  pub size: u64,
  pub time: u64,
}

/// An asset is a file or part of a file that has been transformed and is ready to be bundled
///
/// The bundle graph never looks at the asset's code. Everything it needs for symbol resolution
/// and content hashing is described by the fields below.
///
#[derive(Default, PartialEq, Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
  /// The main identify hash for the asset. It is consistent for the entire
  /// build and between builds.
  pub id: AssetId,

  /// The environment of the asset
  pub env: Arc<Environment>,

  /// The file path to the asset
  pub file_path: PathBuf,

  /// The file type of the asset, which may change during transformation
  #[serde(rename = "type")]
  pub file_type: FileType,

  /// Hash of the transformed output
  ///
  /// Changes whenever the code of the asset changes, and invalidates any bundle content hash
  /// the asset contributes to.
  ///
  #[serde(default)]
  pub output_hash: String,

  /// The transformer options for the asset from the dependency query string
  #[serde(default)]
  pub query: Option<String>,

  /// Statistics about the asset
  #[serde(default)]
  pub stats: AssetStats,

  /// The symbols that the asset exports
  ///
  /// `None` means the exports of the asset are not statically known, e.g. CommonJS.
  ///
  #[serde(default)]
  pub symbols: Option<Vec<Symbol>>,

  /// A unique key that identifies an asset returned by a transformer alongside others
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub unique_key: Option<String>,
}

impl Asset {
  /// Finds the symbol this asset exports as `exported`
  pub fn symbol(&self, exported: &str) -> Option<&Symbol> {
    self
      .symbols
      .as_deref()
      .and_then(|symbols| find_exported(symbols, exported))
  }

  pub fn has_symbol(&self, exported: &str) -> bool {
    self.symbol(exported).is_some()
  }
}
