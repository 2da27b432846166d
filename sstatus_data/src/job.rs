use color_eyre::{eyre::WrapErr as _, Result};
use itertools::Itertools as _;
use log::{debug, warn};

use crate::error::ParseError;
use crate::misc::parsing::{ascii_digits, parse_count};
use crate::slurm::{GpuTable, MemQuantity, SlurmAccount, SlurmUser, GPU_MARKER};

/// Fields of a job line, in `squeue --Format` order. The TRES list is always the last field.
const JOB_FIELDS: [&str; 6] = ["JobId", "UserName", "Account", "Partition", "QOS", "tres-alloc"];

/// A running job, from one line of
/// `squeue --state=R --Format=JobId:|,UserName:|,Account:|,partition:|,QOS:|,tres-alloc:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub user: SlurmUser,
    pub account: SlurmAccount,
    pub partition: String,
    pub qos: String,
    pub cpus: u64,
    pub mem: MemQuantity,
    pub gpus: GpuTable,
}

impl Job {
    /// `4242|alice|vision|gpu|vision|cpu=8,mem=64G,node=1,billing=8,gres/gpu=1,gres/gpu:a100=1`
    ///
    /// Empty fields (`||`) are dropped before the fields are assigned by position.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let fields = line.split('|').map(str::trim).filter(|field| !field.is_empty()).collect_vec();
        let &[id, user, account, partition, qos, .., tres] = fields.as_slice() else {
            return Err(ParseError::MissingField {
                field: JOB_FIELDS[fields.len().min(JOB_FIELDS.len() - 1)],
            });
        };

        let mut cpus = 0;
        let mut mem = MemQuantity::default();
        let mut gpus = GpuTable::new();
        for (key, value) in tres.split(',').filter_map(|token| token.split_once('=')) {
            if let Some(gpu_type) = key.strip_prefix(GPU_MARKER) {
                // squeue sometimes pads or quotes the counts
                gpus.insert(gpu_type, parse_count("gres/gpu", &ascii_digits(value))?);
            } else if key == "cpu" {
                cpus = parse_count("cpu", value)?;
            } else if key == "mem" {
                mem = MemQuantity::from(value);
            }
        }

        Ok(Job {
            id: id.to_owned(),
            user: user.into(),
            account: account.into(),
            partition: partition.to_owned(),
            qos: qos.to_owned(),
            cpus,
            mem,
            gpus,
        })
    }

    /// Jobs running under the QoS named like their account use the account's own share.
    pub fn qos_matches_account(&self) -> bool {
        self.qos == *self.account
    }

    pub fn gpu_count(&self) -> u64 {
        self.gpus.total()
    }
}

/// Job lines of the `squeue` output, without the leading `header_lines` and blank lines.
pub fn split_lines(text: &str, header_lines: usize) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .skip(header_lines)
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Whether `line` starts with a job id, i.e. is a job line rather than a header.
pub fn looks_like_job(line: &str) -> bool {
    line.contains('|')
        && line
            .trim_start()
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
}

/// Parses all job lines of `text`.
///
/// Lines with too few fields are skipped with a warning, unparsable numbers abort.
pub fn parse_jobs(text: &str, header_lines: usize) -> Result<Vec<Job>> {
    for (line_number, line) in text.lines().enumerate().take(header_lines) {
        if looks_like_job(line) {
            warn!("skipped header line {line_number} looks like a job, check the header line count: {line:?}");
        }
    }

    let mut jobs = Vec::new();
    for (line_number, line) in split_lines(text, header_lines) {
        match Job::parse(line) {
            Ok(job) => {
                debug!("job {} of {} in {}", job.id, job.user, job.partition);
                jobs.push(job);
            }
            Err(e) if !e.is_fatal() => {
                warn!("skipping job line {line_number} ({line:?}): {e}");
            }
            Err(e) => {
                return Err(e).wrap_err_with(|| format!("parsing job line {line_number} ({line:?})"));
            }
        }
    }
    Ok(jobs)
}
