//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the
//! canvasapi binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Canvas LMS API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "canvasapi", about = "Canvas LMS API CLI", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an operation on a Canvas resource.
    Run {
        /// The resource to operate on (course, user, enrollment, ...).
        resource: String,

        /// The operation to run (create, get, getAll, update, delete, ...).
        operation: String,

        /// Operation parameters as a JSON object.
        #[arg(long, default_value = "{}")]
        params: String,

        /// File to attach for upload operations.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Content type of the attached file.
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,

        /// Emit an error record for a failed item instead of aborting.
        #[arg(long, default_value = "false")]
        continue_on_fail: bool,

        /// Fetch every page of a listing instead of the first page.
        #[arg(long, conflicts_with = "limit", default_value = "false")]
        all: bool,

        /// Maximum number of records for a listing.
        #[arg(long)]
        limit: Option<u64>,
    },
}
