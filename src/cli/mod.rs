//! Command-line interface for labforge.
//!
//! Provides commands for dataset generation, listing stored datasets and
//! tables, schema inspection, querying, and summary statistics.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
