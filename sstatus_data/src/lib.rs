pub mod error;
pub mod job;
pub mod node;
pub mod render;
pub mod resources;
pub mod slurm;
pub mod summary;
pub mod usage;

pub mod misc {
    pub mod parsing;
}

use color_eyre::Result;
use log::info;
use serde::Deserialize;

use render::{AccountReport, NodeReport, OverUsageReport, UserReport};
use summary::NodeSummary;
use usage::UsageSummary;

/// Header lines before the first job: a title row and a rule under it.
pub const DEFAULT_HEADER_LINES: usize = 2;

/// Per-job limits for the over-usage report.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Jobs with this many GPUs or more are flagged.
    pub gpus: u64,
    /// GPU jobs with more CPUs than this are flagged.
    pub cpus: u64,
    /// GPU jobs asking for more memory than this are flagged, unit suffix ignored.
    pub mem: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            gpus: 2,
            cpus: 8,
            mem: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobReportOptions {
    pub header_lines: usize,
    pub thresholds: Thresholds,
}

impl Default for JobReportOptions {
    fn default() -> Self {
        JobReportOptions {
            header_lines: DEFAULT_HEADER_LINES,
            thresholds: Thresholds::default(),
        }
    }
}

/// Node report of `scontrol show nodes -d` output.
pub fn node_report(text: &str) -> Result<String> {
    let nodes = node::parse_nodes(text)?;
    info!("parsed {} nodes", nodes.len());
    let summary = NodeSummary::from_nodes(&nodes);
    Ok(NodeReport(&summary).to_string())
}

/// User, account and over-usage reports of `squeue` output, separated by blank lines.
pub fn job_report(text: &str, options: &JobReportOptions) -> Result<String> {
    let jobs = job::parse_jobs(text, options.header_lines)?;
    info!("parsed {} running jobs", jobs.len());
    let summary = UsageSummary::from_jobs(jobs);
    let over_usage = summary.over_usage(&options.thresholds)?;
    Ok(format!(
        "{}\n{}\n{}",
        UserReport(&summary),
        AccountReport(&summary),
        OverUsageReport(&over_usage)
    ))
}
