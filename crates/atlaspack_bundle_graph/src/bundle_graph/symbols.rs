use std::collections::HashSet;

use super::BundleGraph;
use crate::types::Asset;
use crate::types::SourceLocation;
use crate::types::DEFAULT_EXPORT;
use crate::types::WILDCARD;

/// The outcome of resolving an exported symbol to its binding
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ResolvedSymbol {
  /// The local binding that declares the symbol in the resolved asset
  Binding(String),
  /// The symbol may exist, but is only known at runtime, e.g. behind `export *` of a CommonJS
  /// module or an opaque dependency
  Indeterminate,
  /// The asset provably does not export the symbol
  NotFound,
  /// The re-export that provides the symbol was tree-shaken
  Skipped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SymbolResolution<'a> {
  /// The asset the resolution ended in
  pub asset: &'a Asset,
  /// The name the symbol is exported as from `asset`
  pub export_symbol: String,
  pub symbol: ResolvedSymbol,
  pub loc: Option<SourceLocation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportSymbolResolution<'a> {
  pub asset: &'a Asset,
  pub export_symbol: String,
  pub symbol: ResolvedSymbol,
  pub loc: Option<SourceLocation>,
  /// The name importers of the queried asset see the symbol as
  pub export_as: String,
}

impl<'a> ExportSymbolResolution<'a> {
  fn new(resolution: SymbolResolution<'a>, export_as: String) -> Self {
    ExportSymbolResolution {
      asset: resolution.asset,
      export_symbol: resolution.export_symbol,
      symbol: resolution.symbol,
      loc: resolution.loc,
      export_as,
    }
  }
}

/// (asset id, symbol) pairs being resolved further up the current resolution chain
type ResolutionStack = HashSet<(String, String)>;

impl BundleGraph {
  /// Follows re-exports of `symbol` from `asset_id` to the asset and local binding that declare it.
  ///
  /// Later dependencies shadow earlier ones. When `boundary` is given, resolution does not follow
  /// re-exports out of assets that the boundary bundle does not contain.
  pub fn resolve_symbol(
    &self,
    asset_id: &str,
    symbol: &str,
    boundary: Option<&str>,
  ) -> SymbolResolution<'_> {
    let asset = &self.asset_node(asset_id).value;
    self.resolve_symbol_in(asset, symbol, boundary, &mut ResolutionStack::new())
  }

  fn resolve_symbol_in<'a>(
    &'a self,
    asset: &'a Asset,
    symbol: &str,
    boundary: Option<&str>,
    stack: &mut ResolutionStack,
  ) -> SymbolResolution<'a> {
    let declared = asset.symbol(symbol);
    let identifier = declared.map(|declared| declared.local.as_str());
    let declared_loc = || declared.and_then(|declared| declared.loc.clone());

    if symbol == WILDCARD {
      return SymbolResolution {
        asset,
        export_symbol: symbol.to_string(),
        symbol: identifier.map_or(ResolvedSymbol::Indeterminate, |local| {
          ResolvedSymbol::Binding(local.to_string())
        }),
        loc: declared_loc(),
      };
    }

    // Cyclic re-exports resolve to nothing on the second visit
    let key = (asset.id.clone(), symbol.to_string());
    if !stack.insert(key.clone()) {
      tracing::trace!(asset_id = %asset.id, symbol, "Cyclic re-export");
      return SymbolResolution {
        asset,
        export_symbol: symbol.to_string(),
        symbol: ResolvedSymbol::NotFound,
        loc: None,
      };
    }

    let asset_outside = boundary.is_some_and(|boundary| !self.bundle_has_asset(boundary, &asset.id));
    let mut found = false;
    let mut skipped = false;
    let mut candidates = Vec::new();

    for dependency in self.get_dependencies(&asset.id).into_iter().rev() {
      let Some(dependency_symbols) = &dependency.symbols else {
        found = true;
        continue;
      };

      let reexport = identifier.and_then(|identifier| {
        dependency_symbols
          .iter()
          .rev()
          .find(|dependency_symbol| dependency_symbol.local == identifier)
      });

      if let Some(reexport) = reexport {
        let Some(resolved) = self.get_dependency_resolution(&dependency.id, None) else {
          // External module
          stack.remove(&key);
          return SymbolResolution {
            asset,
            export_symbol: symbol.to_string(),
            symbol: ResolvedSymbol::Binding(reexport.local.clone()),
            loc: declared_loc(),
          };
        };

        if asset_outside {
          found = true;
          break;
        }

        if self.is_dependency_skipped(&dependency.id) {
          skipped = true;
          break;
        }

        let mut resolution = self.resolve_symbol_in(resolved, &reexport.exported, boundary, stack);
        if resolution.loc.is_none() {
          resolution.loc = declared_loc();
        }

        stack.remove(&key);
        return resolution;
      }

      // Wildcard re-exports never list the symbol on the re-exporting asset and never include
      // the default export
      if identifier.is_some() || !dependency.is_wildcard_reexport() || symbol == DEFAULT_EXPORT {
        continue;
      }

      let Some(resolved) = self.get_dependency_resolution(&dependency.id, None) else {
        continue;
      };

      let resolution = self.resolve_symbol_in(resolved, symbol, boundary, stack);
      let resolution = SymbolResolution {
        loc: resolved.symbol(symbol).and_then(|declared| declared.loc.clone()),
        ..resolution
      };

      match resolution.symbol {
        ResolvedSymbol::Binding(_) | ResolvedSymbol::Skipped => {
          if asset_outside {
            found = true;
            break;
          }

          if self.is_dependency_skipped(&dependency.id) {
            skipped = true;
            break;
          }

          stack.remove(&key);
          return resolution;
        }
        ResolvedSymbol::Indeterminate => {
          found = true;

          let resolved_outside = boundary
            .is_some_and(|boundary| !self.bundle_has_asset(boundary, &resolution.asset.id));

          if !resolved_outside {
            // Keep looking for a re-export that binds the symbol statically
            candidates.push(resolution);
          } else if asset_outside {
            break;
          } else {
            stack.remove(&key);
            return resolution;
          }
        }
        ResolvedSymbol::NotFound => {}
      }
    }

    stack.remove(&key);

    if candidates.len() == 1 {
      return candidates.swap_remove(0);
    }

    let symbol_state = if skipped {
      ResolvedSymbol::Skipped
    } else if found {
      ResolvedSymbol::Indeterminate
    } else if let Some(identifier) = identifier {
      ResolvedSymbol::Binding(identifier.to_string())
    } else if asset.has_symbol(WILDCARD) {
      ResolvedSymbol::Indeterminate
    } else {
      ResolvedSymbol::NotFound
    };

    SymbolResolution {
      asset,
      export_symbol: symbol.to_string(),
      symbol: symbol_state,
      loc: declared_loc(),
    }
  }

  /// Resolves every symbol `asset_id` exports, including those it re-exports through `export *`.
  ///
  /// Assets without known exports export nothing. Default exports are not carried through
  /// wildcard re-exports.
  pub fn get_exported_symbols(
    &self,
    asset_id: &str,
    boundary: Option<&str>,
  ) -> Vec<ExportSymbolResolution<'_>> {
    let asset = &self.asset_node(asset_id).value;
    self.exported_symbols_of(asset, boundary, &mut HashSet::new())
  }

  fn exported_symbols_of<'a>(
    &'a self,
    asset: &'a Asset,
    boundary: Option<&str>,
    stack: &mut HashSet<&'a str>,
  ) -> Vec<ExportSymbolResolution<'a>> {
    let Some(symbols) = &asset.symbols else {
      return Vec::new();
    };

    if !stack.insert(&asset.id) {
      return Vec::new();
    }

    let mut exported: Vec<ExportSymbolResolution<'a>> = symbols
      .iter()
      .map(|symbol| {
        ExportSymbolResolution::new(
          self.resolve_symbol_in(asset, &symbol.exported, boundary, &mut ResolutionStack::new()),
          symbol.exported.clone(),
        )
      })
      .collect();

    for dependency in self.get_dependencies(&asset.id) {
      if !dependency.is_wildcard_reexport() {
        continue;
      }

      let Some(resolved) = self.get_dependency_resolution(&dependency.id, None) else {
        continue;
      };

      exported.extend(
        self
          .exported_symbols_of(resolved, boundary, stack)
          .into_iter()
          .filter(|resolution| resolution.export_symbol != DEFAULT_EXPORT)
          .map(|resolution| ExportSymbolResolution {
            export_as: resolution.export_symbol.clone(),
            ..resolution
          }),
      );
    }

    stack.remove(asset.id.as_str());
    exported
  }
}
