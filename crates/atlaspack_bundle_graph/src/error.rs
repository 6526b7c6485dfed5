use thiserror::Error;

pub type BundleGraphResult<T> = std::result::Result<T, BundleGraphError>;

/// Recoverable failures returned by the bundle graph.
///
/// Caller misuse such as passing an id that was never added to the graph is not
/// represented here; those are invariant violations and panic.
#[derive(Error, Debug)]
pub enum BundleGraphError {
  #[error("Asset {0} not found in bundle graph")]
  AssetNotFound(String),

  #[error("Asset {0} or its public id not found")]
  PublicIdNotFound(String),

  #[error("Node {0} not found in bundle graph")]
  NodeNotFound(String),

  #[error("Original id was not unique: {0}")]
  PublicIdCollision(String),

  #[error("{0}")]
  InvalidOperation(String),

  #[error("Failed to serialize bundle graph: {0}")]
  Serialization(#[from] serde_json::Error),
}
