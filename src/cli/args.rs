//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::infrastructure::traits::ArchiveMode;

/// Resolve export targets in flow-cytometry experiment trees and hand them to archival
#[derive(Parser, Debug)]
#[command(name = "flowexport")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// A node in a tree snapshot, addressed by the titles from the root down.
#[derive(Args, Debug, Clone)]
pub struct NodeTarget {
    /// JSON tree snapshot
    #[arg(value_hint = ValueHint::FilePath)]
    pub snapshot: PathBuf,

    /// Node titles from the root, e.g. `EXP1 Tubes Specimen_A`
    #[arg(required = true, num_args = 1..)]
    pub path: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the snapshot as a tree
    Tree {
        /// JSON tree snapshot
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: PathBuf,
    },

    /// Resolve the export target of a node
    Resolve {
        #[command(flatten)]
        target: NodeTarget,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the export actions offered for a node
    Actions {
        #[command(flatten)]
        target: NodeTarget,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Hand the export of a node to the archival service
    Export {
        #[command(flatten)]
        target: NodeTarget,
        /// normal = personal folder, zip = download archive
        #[arg(short, long, value_enum, default_value_t = ArchiveMode::Zip)]
        mode: ArchiveMode,
    },

    /// Show node and experiment details
    Details {
        #[command(flatten)]
        target: NodeTarget,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Create global config template
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}
