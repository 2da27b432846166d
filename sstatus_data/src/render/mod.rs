pub mod table;

use std::fmt;
use std::iter;

use crate::slurm::NodeState;
use crate::summary::NodeSummary;
use crate::usage::{GpuUsage, UsageSummary, UserOverUsage};

pub use table::{display_width, Align, Table};

/// Decoration of the first three places in the usage tables.
pub const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

const SECTION_RULE_WIDTH: usize = 84;

/// Medal for the first three, 1-based place after that.
pub fn rank_label(idx: usize) -> String {
    match MEDALS.get(idx) {
        Some(medal) => medal.to_string(),
        None => (idx + 1).to_string(),
    }
}

fn section_rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(SECTION_RULE_WIDTH))
}

/// GPU table over node states, node counts and the lists of drained and down nodes.
pub struct NodeReport<'a>(pub &'a NodeSummary);

impl NodeReport<'_> {
    pub fn gpu_table(&self) -> Table {
        let summary = self.0;
        let gpu_types = summary.gpu_types();
        let mut table = gpu_types
            .iter()
            .fold(Table::new().column("GpuType"), |table, gpu_type| table.column(*gpu_type))
            .column("Total");

        let rows: [(&str, &dyn Fn(&str) -> i64); 5] = [
            ("Free", &|gpu_type: &str| summary.free(gpu_type)),
            ("Used", &|gpu_type: &str| summary.allocated.signed_count(gpu_type)),
            ("From", &|gpu_type: &str| summary.configured.signed_count(gpu_type)),
            ("Drain", &|gpu_type: &str| summary.drain.signed_count(gpu_type)),
            ("Down", &|gpu_type: &str| summary.down.signed_count(gpu_type)),
        ];
        for (label, per_type) in rows {
            let counts: Vec<i64> = gpu_types.iter().map(|gpu_type| per_type(gpu_type)).collect();
            let total = counts.iter().copied().fold(0, i64::saturating_add);
            table.row(
                iter::once(label.to_owned())
                    .chain(counts.iter().map(i64::to_string))
                    .chain(iter::once(total.to_string())),
            );
        }
        table
    }
}

impl fmt::Display for NodeReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;

        writeln!(f, "Node Gpu Summary:")?;
        write!(f, "{}", self.gpu_table())?;
        writeln!(f)?;

        writeln!(f, "Nodes Summary:")?;
        for state in NodeState::ALL {
            writeln!(f, "{state}: {}", summary.state_count(state))?;
        }
        writeln!(f, "Total Nodes: {}", summary.node_count())?;
        section_rule(f)?;
        writeln!(f)?;

        writeln!(f, "Nodes Details:")?;
        for (title, notes) in [("Drain List", &summary.drained_nodes), ("Down List", &summary.down_nodes)] {
            writeln!(f, "   {title}:")?;
            for note in notes {
                writeln!(f, "{}", format!("         {} {}", note.name, note.reason).trim_end())?;
            }
        }
        section_rule(f)
    }
}

fn with_qos(total: u64, qos: u64) -> String {
    format!("{total}({qos})")
}

/// Ranked `TOTAL(QOS)` table. Rows are expected in ranking order, the ones without any GPUs are
/// left out (but keep their place in the ranking).
fn usage_table<'a>(
    label: &str,
    gpu_types: &[String],
    entries: impl Iterator<Item = (String, &'a GpuUsage)>,
) -> Table {
    let mut table = gpu_types
        .iter()
        .fold(
            Table::new()
                .aligned_column("#", Align::Right)
                .column(label)
                .column("Total"),
            |table, gpu_type| table.column(gpu_type.as_str()),
        );
    for (idx, (name, usage)) in entries.enumerate() {
        if usage.total() == 0 {
            continue;
        }
        table.row(
            [rank_label(idx), name, with_qos(usage.total(), usage.qos_total())]
                .into_iter()
                .chain(
                    gpu_types
                        .iter()
                        .map(|gpu_type| with_qos(usage.gpus.count(gpu_type), usage.qos.count(gpu_type))),
                ),
        );
    }
    table
}

/// GPUs in use per user, shown as `user(account)`.
pub struct UserReport<'a>(pub &'a UsageSummary);

impl fmt::Display for UserReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        let entries = summary
            .users
            .iter()
            .map(|user| (format!("{}({})", user.user, user.account), &user.usage));
        writeln!(f, "User Gpu Summary:")?;
        write!(f, "{}", usage_table("User", &summary.gpu_types, entries))
    }
}

/// GPUs in use per account.
pub struct AccountReport<'a>(pub &'a UsageSummary);

impl fmt::Display for AccountReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        let entries = summary
            .accounts
            .iter()
            .map(|account| (account.account.to_string(), &account.usage));
        writeln!(f, "Account Gpu Summary:")?;
        write!(f, "{}", usage_table("Account", &summary.gpu_types, entries))
    }
}

/// Flagged jobs per user, each with only the limits it went over.
pub struct OverUsageReport<'a>(pub &'a [UserOverUsage<'a>]);

impl fmt::Display for OverUsageReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Over Usage:")?;
        for user in self.0 {
            writeln!(f, "User:{}", user.user)?;
            for flagged in &user.jobs {
                let job = flagged.job;
                write!(f, "    Job:{} Account:{} Qos:{}", job.id, job.account, job.qos)?;
                for exceeded in &flagged.exceeded {
                    write!(f, " {exceeded}")?;
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
