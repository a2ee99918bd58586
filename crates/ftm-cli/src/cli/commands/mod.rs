//! CLI command handlers, one per file.

mod config;
mod resolve;
mod serve;

pub use config::run_config;
pub use resolve::{run_resolve, ResolveArgs};
pub use serve::run_serve;
