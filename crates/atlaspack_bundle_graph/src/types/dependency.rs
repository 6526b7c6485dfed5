use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::asset::AssetId;
use super::environment::Environment;
use super::source::SourceLocation;
use super::symbol::find_exported;
use super::symbol::Symbol;
use super::symbol::WILDCARD;
use super::target::Target;

/// Determines when a dependency should be loaded
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  /// Resolves the dependency synchronously, placing the resolved asset in the same bundle as the parent or another bundle that is already on the page
  #[default]
  Sync,
  /// Places the dependency in a separate bundle loaded in parallel with the current bundle
  Parallel,
  /// The dependency should be placed in a separate bundle that is loaded later
  Lazy,
}

/// A dependency denotes a connection between two assets
#[derive(PartialEq, Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
  pub id: String,

  /// The environment of the dependency
  pub env: Arc<Environment>,

  /// The location within the source file where the dependency was found
  #[serde(default)]
  pub loc: Option<SourceLocation>,

  /// Determines when the dependency should be loaded
  #[serde(default)]
  pub priority: Priority,

  /// The id of the asset with this dependency
  #[serde(default)]
  pub source_asset_id: Option<AssetId>,

  /// The import or export specifier that connects two assets together
  pub specifier: String,

  /// The symbols imported or re-exported through this dependency
  ///
  /// `None` means the dependency is opaque, e.g. a CommonJS `require`, and any symbol may be
  /// accessed through it.
  ///
  #[serde(default)]
  pub symbols: Option<Vec<Symbol>>,

  /// The target associated with an entry, if any
  #[serde(default)]
  pub target: Option<Box<Target>>,

  /// Whether the dependency is an entry
  #[serde(default)]
  pub is_entry: bool,

  /// Whether the dependency is optional
  #[serde(default)]
  pub is_optional: bool,
}

impl Dependency {
  pub fn new(id: impl Into<String>, specifier: impl Into<String>) -> Self {
    Dependency {
      id: id.into(),
      specifier: specifier.into(),
      ..Dependency::default()
    }
  }

  /// Async dependencies are split into their own bundle group
  pub fn is_async(&self) -> bool {
    self.priority == Priority::Lazy
  }

  pub fn symbol(&self, exported: &str) -> Option<&Symbol> {
    self
      .symbols
      .as_deref()
      .and_then(|symbols| find_exported(symbols, exported))
  }

  /// Whether this dependency is an `export * from` of the resolved asset
  pub fn is_wildcard_reexport(&self) -> bool {
    self
      .symbol(WILDCARD)
      .is_some_and(|symbol| symbol.local == WILDCARD)
  }
}
