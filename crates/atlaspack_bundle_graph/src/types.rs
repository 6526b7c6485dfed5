pub use self::asset::*;
pub use self::bundle::*;
pub use self::bundle_group::*;
pub use self::dependency::*;
pub use self::environment::*;
pub use self::file_type::*;
pub use self::source::*;
pub use self::symbol::*;
pub use self::target::*;

mod asset;
mod bundle;
mod bundle_group;
mod dependency;
mod environment;
mod file_type;
mod source;
mod symbol;
mod target;
