pub mod bundle_graph;
pub mod error;
pub mod graph;
pub mod hash;
pub mod module_graph;
pub mod options;
pub mod types;

pub use bundle_graph::BundleGraph;
pub use error::{BundleGraphError, BundleGraphResult};
pub use options::BundleGraphOptions;
