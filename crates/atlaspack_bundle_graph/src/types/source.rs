use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// A line and column position within a source file
///
/// Lines and columns are 1-based.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Location {
  pub line: u32,
  pub column: u32,
}

/// The span of source code a symbol or dependency was declared at
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
  pub file_path: PathBuf,
  pub start: Location,
  pub end: Location,
}
