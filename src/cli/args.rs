//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};

/// Run oasis-node genesis over a directory of unpacked entity packages
#[derive(Parser, Debug)]
#[command(name = "genesis-init")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory with one unpacked package per entity
    #[arg(value_hint = ValueHint::DirPath)]
    pub entities_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Config file layered over the global one
    #[arg(short, long, env = "GENESIS_INIT_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Node binary to run (overrides config)
    #[arg(long, value_hint = ValueHint::CommandName)]
    pub node_binary: Option<String>,

    /// Print the command line instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Print effective configuration as TOML and exit
    #[arg(long)]
    pub show_config: bool,

    /// Generate shell completions
    #[arg(long = "generate", value_enum)]
    pub generator: Option<clap_complete::Shell>,
}
