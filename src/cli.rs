use crate::output::OutputFormat;
use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "untrak")]
#[command(version)]
#[command(about = "Find cluster resources that no local manifest declares", long_about = None)]
pub struct Cli {
    /// Manifest file or directory holding the declared resources
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Config file listing the commands to run and the kinds to exclude
    #[arg(short, long, env = "UNTRAK_CONFIG", default_value = "untrak.yaml")]
    pub config: String,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print a completion script for the given shell and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}
