use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// GPU usage of a Slurm cluster: free/used GPUs per type, the top users and accounts, and jobs
/// above the configured limits.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(version)]
pub struct Args {
    /// Read `scontrol show nodes -d` output from this file instead of running scontrol.
    #[arg(long)]
    pub nodes_file: Option<PathBuf>,

    /// Read `squeue` output from this file instead of running squeue.
    #[arg(long)]
    pub jobs_file: Option<PathBuf>,

    /// Extra config file, on top of /etc/sstatus/config.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// More logging, repeat for even more.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
