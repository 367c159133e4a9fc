//! mkit - manage Kitfiles and ModelKits for ML projects
//!
//! A library for the two chores of a KitOps-based ML workflow:
//!
//! - keeping the project's YAML `Kitfile` up to date (code, datasets, model
//!   and package sections), see [`manifest`];
//! - driving the external `kit` CLI to log in, pack, push and unpack
//!   ModelKits, see [`kit`].
//!
//! Every path is explicit: a [`manifest::KitfileStore`] is rooted at a
//! project directory and [`kit::Kit`] runs `kit` from that same directory.

pub mod cli;
pub mod command_runner;
pub mod commands;
pub mod error;
pub mod kit;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod secret;

pub use cli::{Cli, Commands};
pub use error::{KitError, KitfileError};
