//! Manifest types for mkit.
//!
//! The only manifest mkit manages is the project's YAML Kitfile.

pub mod kitfile;

pub use kitfile::*;
