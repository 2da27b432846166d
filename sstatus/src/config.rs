use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use sstatus_data::{JobReportOptions, Thresholds};

use crate::source::SQUEUE_HEADER_LINES;

/// Looked up with any supported extension, e.g. `/etc/sstatus/config.toml`.
const SYSTEM_CONFIG: &str = "/etc/sstatus/config";
const DEFAULT_SCONTROL: &str = "scontrol";
const DEFAULT_SQUEUE: &str = "squeue";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub scontrol: PathBuf,
    pub squeue: PathBuf,
    pub job_header_lines: usize,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Settings {
    /// Defaults, then the system config, then `extra`, then `SSTATUS_*` environment variables
    /// (`SSTATUS_THRESHOLDS__GPUS=4`).
    pub fn new(extra: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_files(SYSTEM_CONFIG, extra)
    }

    fn from_files(system: &str, extra: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("scontrol", DEFAULT_SCONTROL.to_string())?
            .set_default("squeue", DEFAULT_SQUEUE.to_string())?
            .set_default("job_header_lines", SQUEUE_HEADER_LINES.to_string())?
            .add_source(File::with_name(system).required(false));
        if let Some(path) = extra {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(Environment::with_prefix("SSTATUS").prefix_separator("_").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn job_report_options(&self) -> JobReportOptions {
        JobReportOptions {
            header_lines: self.job_header_lines,
            thresholds: self.thresholds,
        }
    }
}
