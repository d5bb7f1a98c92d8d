//! GitHub API model types.

mod actions;
mod common;
mod environments;
mod packages;
mod properties;
mod pulls;
mod rate_limit;
mod secrets;
mod tokens;

pub use actions::*;
pub use common::*;
pub use environments::*;
pub use packages::*;
pub use properties::*;
pub use pulls::*;
pub use rate_limit::*;
pub use secrets::*;
pub use tokens::*;
