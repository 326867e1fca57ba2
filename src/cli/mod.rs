//! Command line surface
//!
//! [`args`] holds the clap definitions, [`output`] the report types and
//! their table, JSON and compact renderings.

pub mod args;
pub mod output;

pub use args::{Cli, Commands};
