use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

use color_eyre::{eyre::WrapErr as _, Result};
use itertools::Itertools as _;

use crate::error::ParseError;
use crate::job::Job;
use crate::slurm::{GpuTable, MemQuantity, SlurmAccount, SlurmUser};
use crate::Thresholds;

/// GPUs in use, plus the part of it running under a QoS named like the job's account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuUsage {
    pub gpus: GpuTable,
    pub qos: GpuTable,
}

impl GpuUsage {
    fn add_job(&mut self, job: &Job) {
        self.gpus.accumulate(&job.gpus);
        if job.qos_matches_account() {
            self.qos.accumulate(&job.gpus);
        }
    }

    pub fn total(&self) -> u64 {
        self.gpus.total()
    }

    pub fn qos_total(&self) -> u64 {
        self.qos.total()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUsage {
    pub user: SlurmUser,
    /// Account of the user's last job.
    pub account: SlurmAccount,
    pub usage: GpuUsage,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUsage {
    pub account: SlurmAccount,
    pub usage: GpuUsage,
}

/// Running jobs grouped by user and by account, both sorted by GPUs in use (most first). Equal
/// usage keeps the order in which the user/account first showed up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSummary {
    pub users: Vec<UserUsage>,
    pub accounts: Vec<AccountUsage>,
    /// All GPU types in use, sorted.
    pub gpu_types: Vec<String>,
}

impl UsageSummary {
    pub fn from_jobs(jobs: impl IntoIterator<Item = Job>) -> Self {
        let mut users = Vec::<UserUsage>::new();
        let mut accounts = Vec::<AccountUsage>::new();
        let mut user_idx = HashMap::<SlurmUser, usize>::new();
        let mut account_idx = HashMap::<SlurmAccount, usize>::new();

        for job in jobs {
            let idx = *account_idx.entry(job.account.clone()).or_insert_with(|| {
                accounts.push(AccountUsage {
                    account: job.account.clone(),
                    usage: GpuUsage::default(),
                });
                accounts.len() - 1
            });
            accounts[idx].usage.add_job(&job);

            let idx = *user_idx.entry(job.user.clone()).or_insert_with(|| {
                users.push(UserUsage {
                    user: job.user.clone(),
                    account: job.account.clone(),
                    usage: GpuUsage::default(),
                    jobs: Vec::new(),
                });
                users.len() - 1
            });
            let user = &mut users[idx];
            user.account = job.account.clone();
            user.usage.add_job(&job);
            user.jobs.push(job);
        }

        // stable, ties keep their order
        users.sort_by_key(|user| Reverse(user.usage.total()));
        accounts.sort_by_key(|account| Reverse(account.usage.total()));

        let gpu_types = users
            .iter()
            .flat_map(|user| user.usage.gpus.keys())
            .sorted()
            .dedup()
            .cloned()
            .collect_vec();

        UsageSummary {
            users,
            accounts,
            gpu_types,
        }
    }

    /// Flagged jobs per user, users in ranking order. Users without flagged jobs are left out.
    pub fn over_usage(&self, thresholds: &Thresholds) -> Result<Vec<UserOverUsage<'_>>> {
        let mut report = Vec::new();
        for user in &self.users {
            let mut jobs = Vec::new();
            for job in &user.jobs {
                let exceeded = thresholds
                    .exceeded(job)
                    .wrap_err_with(|| format!("checking limits of job {} ({})", job.id, job.user))?;
                if !exceeded.is_empty() {
                    jobs.push(FlaggedJob { job, exceeded });
                }
            }
            if !jobs.is_empty() {
                report.push(UserOverUsage { user: &user.user, jobs });
            }
        }
        Ok(report)
    }
}

/// A limit a job went over, with the job's value.
#[derive(Debug, Clone, PartialEq)]
pub enum Exceeded {
    Gpu(u64),
    Cpu(u64),
    Mem(MemQuantity),
}

impl fmt::Display for Exceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exceeded::Gpu(count) => write!(f, "Gpu:{count}"),
            Exceeded::Cpu(count) => write!(f, "Cpu:{count}"),
            Exceeded::Mem(mem) => write!(f, "Mem:{mem}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedJob<'a> {
    pub job: &'a Job,
    pub exceeded: Vec<Exceeded>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserOverUsage<'a> {
    pub user: &'a SlurmUser,
    pub jobs: Vec<FlaggedJob<'a>>,
}

impl Thresholds {
    /// The limits `job` goes over.
    ///
    /// A job holding `gpus` GPUs or more is always flagged. CPU and memory only count for jobs
    /// with at least one GPU; memory compares the bare number, `101M` is over a limit of 100.
    pub fn exceeded(&self, job: &Job) -> Result<Vec<Exceeded>, ParseError> {
        let gpus = job.gpu_count();
        let mut exceeded = Vec::new();
        if gpus >= self.gpus {
            exceeded.push(Exceeded::Gpu(gpus));
        }
        if gpus > 0 && job.cpus > self.cpus {
            exceeded.push(Exceeded::Cpu(job.cpus));
        }
        if gpus > 0 {
            if let Some(mem) = job.mem.magnitude()? {
                if mem > self.mem {
                    exceeded.push(Exceeded::Mem(job.mem.clone()));
                }
            }
        }
        Ok(exceeded)
    }
}
