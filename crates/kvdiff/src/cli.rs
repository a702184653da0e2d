//! Command line arguments

use clap::{Parser, ValueEnum};
use kvdiff_core::ChangeKind;
use serde::Deserialize;
use std::path::PathBuf;

/// Compare JSON objects key by key, each file against the next
#[derive(Parser, Debug, Clone)]
#[command(name = "kvdiff", version, about)]
pub struct Args {
    /// JSON files, each holding one object
    #[arg(value_name = "FILE", num_args = 2.., required = true)]
    pub files: Vec<PathBuf>,

    /// Only show changes of this kind
    #[arg(long, value_enum)]
    pub only: Option<ActionFilter>,

    /// With --only, list keys without their old and new values
    #[arg(long)]
    pub keys_only: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Indent JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Print a flat alpha/beta list (exactly two files)
    #[arg(long, conflicts_with_all = ["only", "pairing"])]
    pub flat: bool,

    /// Pairing label of a single change to print, e.g. "0::1"
    #[arg(long, requires = "index")]
    pub pairing: Option<String>,

    /// Index of the change within --pairing
    #[arg(long, requires = "pairing")]
    pub index: Option<usize>,

    /// Field of the change to print (key, action, sets, old, new)
    #[arg(long, requires = "pairing")]
    pub field: Option<String>,

    /// Config file (defaults to the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFilter {
    Added,
    Removed,
    Altered,
}

impl From<ActionFilter> for ChangeKind {
    fn from(filter: ActionFilter) -> Self {
        match filter {
            ActionFilter::Added => ChangeKind::Added,
            ActionFilter::Removed => ChangeKind::Removed,
            ActionFilter::Altered => ChangeKind::Altered,
        }
    }
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}
