//! CLI command implementations.

pub mod completions;
pub mod kitfile;
pub mod modelkit;
