//! Configuration types for courier.
//!
//! Settings live in `.courier/config.yaml` and may reference environment
//! variables as `${VAR}` or `${VAR:-default}`.

pub mod env;
pub mod loader;
pub mod types;


pub use env::*;
pub use loader::*;
pub use types::*;
