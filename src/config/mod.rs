//! Configuration model for rlock.
//!
//! Settings come from three layers, highest precedence first: command-line
//! flags (and their environment variables), an optional YAML file, and
//! built-in defaults. [`Config`] is one partially filled layer; resolving the
//! merged layers yields the validated [`RunConfig`] the rest of the crate uses.

mod model;
mod operations;


// Re-export public API
pub use model::{Config, RunConfig};
