use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// The environment the built code will run in
///
/// Bundles only share assets with, and deduplicate against, bundles of the same context.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
  /// The environment the output should run in
  pub context: EnvironmentContext,

  /// The engines supported by the environment, e.g. `browsers` or `node`
  #[serde(default)]
  pub engines: BTreeMap<String, String>,

  /// Whether node_modules should be bundled rather than left external
  #[serde(default = "default_include_node_modules")]
  pub include_node_modules: bool,

  /// Whether this is a library build
  #[serde(default)]
  pub is_library: bool,

  /// Determines what type of module to output
  #[serde(default)]
  pub output_format: OutputFormat,

  /// Determines whether scope hoisting should be enabled
  #[serde(default)]
  pub should_scope_hoist: bool,

  /// Determines whether the output should be optimised
  #[serde(default)]
  pub should_optimize: bool,

  #[serde(default)]
  pub source_type: SourceType,
}

fn default_include_node_modules() -> bool {
  true
}

impl Environment {
  /// Serializes the environment as JSON with every object's keys sorted
  ///
  /// The output is independent of field declaration order and is used when hashing bundles.
  pub fn canonical_json(&self) -> String {
    let value = serde_json::to_value(self).unwrap_or(Value::Null);
    sort_json_keys(value).to_string()
  }
}

fn sort_json_keys(value: Value) -> Value {
  match value {
    Value::Object(object) => {
      let mut entries: Vec<(String, Value)> = object.into_iter().collect();
      entries.sort_by(|(a, _), (b, _)| a.cmp(b));

      let mut sorted = Map::new();
      for (key, value) in entries {
        sorted.insert(key, sort_json_keys(value));
      }
      Value::Object(sorted)
    }
    Value::Array(values) => Value::Array(values.into_iter().map(sort_json_keys).collect()),
    value => value,
  }
}

/// The environment the output should run in
///
/// This informs Atlaspack what environment-specific APIs are available.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvironmentContext {
  #[default]
  Browser,
  ElectronMain,
  ElectronRenderer,
  Node,
  ServiceWorker,
  WebWorker,
  Worklet,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
  #[default]
  Global,
  CommonJS,
  EsModule,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
  #[default]
  Module,
  Script,
}
