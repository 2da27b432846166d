use std::io::Write;

use chrono::Local;
use clap::Parser as _;
use color_eyre::{eyre::WrapErr as _, Result};
use log::{info, LevelFilter};

mod cli;
mod config;
mod source;

use cli::Args;
use config::Settings;
use source::SlurmCommand;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logger(args.verbose);

    let settings = read_config(&args)?;

    let nodes = source::pick(args.nodes_file, SlurmCommand::scontrol_nodes(&settings.scontrol))
        .fetch()
        .wrap_err("getting node info")?;
    let jobs = source::pick(args.jobs_file, SlurmCommand::squeue_running(&settings.squeue))
        .fetch()
        .wrap_err("getting running jobs")?;

    // nothing is printed unless both reports came out fine
    let node_report = sstatus_data::node_report(&nodes)?;
    let job_report = sstatus_data::job_report(&jobs, &settings.job_report_options())?;
    print!("{node_report}\n{job_report}");
    Ok(())
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .parse_env("SSTATUS_LOG")
        .target(env_logger::Target::Stderr)
        .init();
}

fn read_config(args: &Args) -> Result<Settings> {
    info!("Loading config");
    Settings::new(args.config.as_deref()).wrap_err("parsing config file")
}
