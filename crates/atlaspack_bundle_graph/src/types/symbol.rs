use serde::Deserialize;
use serde::Serialize;

use super::source::SourceLocation;

/// The exported name used for namespace re-exports and `import *`
pub const WILDCARD: &str = "*";

/// The exported name of a module's default export
pub const DEFAULT_EXPORT: &str = "default";

/// A map of export names to the corresponding local variable names
///
/// On an asset, `exported` is the name other modules import and `local` is the binding that
/// holds the value inside the asset. On a dependency, `exported` is the name requested from the
/// resolved asset and `local` is the binding it is assigned to in the importing asset.
///
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
  /// The name the symbol is exported as
  pub exported: String,

  /// The local variable name of the symbol
  pub local: String,

  /// The location of the declaration, if known
  #[serde(default)]
  pub loc: Option<SourceLocation>,

  /// Whether the symbol is only re-exported and not used by the importing asset
  #[serde(default)]
  pub is_weak: bool,
}

impl Symbol {
  pub fn new(exported: impl Into<String>, local: impl Into<String>) -> Self {
    Symbol {
      exported: exported.into(),
      local: local.into(),
      ..Symbol::default()
    }
  }
}

/// Looks up the symbol exported under `exported`
pub fn find_exported<'a>(symbols: &'a [Symbol], exported: &str) -> Option<&'a Symbol> {
  symbols.iter().find(|symbol| symbol.exported == exported)
}
