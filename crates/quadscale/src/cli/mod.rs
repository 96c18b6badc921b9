//! cli subcommands for quadscale.
//!
//! - `quadscale serve` - run the realm control plane

mod serve;

pub use serve::ServeCommand;

use clap::{Parser, Subcommand};

/// quadscale - campus mesh control plane
#[derive(Parser, Debug)]
#[command(name = "quadscale")]
#[command(about = "Campus mesh control plane", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// top-level commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// run the realm control plane
    Serve(ServeCommand),
}
