use std::collections::BTreeMap;
use std::fmt;

use derive_more::derive::{Deref, Display, From, Into};
use itertools::Itertools as _;

use crate::error::ParseError;

/// Key prefix of typed GPU tokens in TRES lists (`gres/gpu:a100=4`). The untyped `gres/gpu=4`
/// doesn't carry it and is ignored.
pub const GPU_MARKER: &str = "gres/gpu:";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Into, From, Display)]
pub struct SlurmUser(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Into, From, Display)]
pub struct SlurmAccount(pub String);

impl From<&str> for SlurmUser {
    fn from(value: &str) -> Self {
        SlurmUser(value.to_owned())
    }
}

impl From<&str> for SlurmAccount {
    fn from(value: &str) -> Self {
        SlurmAccount(value.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    Idle,
    Mixed,
    Allocated,
    Drain,
    Down,
    Other,
}

impl NodeState {
    /// Order of the node summary.
    pub const ALL: [NodeState; 6] = [
        NodeState::Idle,
        NodeState::Mixed,
        NodeState::Allocated,
        NodeState::Drain,
        NodeState::Down,
        NodeState::Other,
    ];

    /// Checked in this order, first hit wins: `IDLE+DRAIN` is a drained node.
    const PRECEDENCE: [NodeState; 5] = [
        NodeState::Drain,
        NodeState::Down,
        NodeState::Idle,
        NodeState::Mixed,
        NodeState::Allocated,
    ];

    /// Classifies the value of a `State=` field, e.g. `MIXED+DRAIN` or `DOWN*+NOT_RESPONDING`.
    pub fn classify(text: &str) -> Self {
        Self::PRECEDENCE
            .into_iter()
            .find(|state| text.contains(state.as_str()))
            .unwrap_or(NodeState::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Idle => "IDLE",
            NodeState::Mixed => "MIXED",
            NodeState::Allocated => "ALLOCATED",
            NodeState::Drain => "DRAIN",
            NodeState::Down => "DOWN",
            NodeState::Other => "OTHER",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GPU type -> count. Sorted by type, so columns built from it come out alphabetically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct GpuTable(BTreeMap<String, u64>);

impl GpuTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the count of `gpu_type`, a repeated type overwrites the earlier count.
    pub fn insert(&mut self, gpu_type: impl Into<String>, count: u64) {
        self.0.insert(gpu_type.into(), count);
    }

    /// Adds to the count of `gpu_type`, stopping at `u64::MAX`.
    pub fn add(&mut self, gpu_type: &str, count: u64) {
        match self.0.get_mut(gpu_type) {
            Some(current) => *current = current.saturating_add(count),
            None => {
                self.0.insert(gpu_type.to_owned(), count);
            }
        }
    }

    pub fn accumulate(&mut self, other: &GpuTable) {
        for (gpu_type, count) in other.iter() {
            self.add(gpu_type, *count);
        }
    }

    /// 0 for types we haven't seen.
    pub fn count(&self, gpu_type: &str) -> u64 {
        self.0.get(gpu_type).copied().unwrap_or(0)
    }

    /// Count as a signed number, for differences. Capped at `i64::MAX`.
    pub fn signed_count(&self, gpu_type: &str) -> i64 {
        i64::try_from(self.count(gpu_type)).unwrap_or(i64::MAX)
    }

    pub fn total(&self) -> u64 {
        self.0.values().fold(0, |total, &count| total.saturating_add(count))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for GpuTable {
    fn from_iter<T: IntoIterator<Item = (S, u64)>>(iter: T) -> Self {
        let mut table = GpuTable::new();
        for (gpu_type, count) in iter {
            table.insert(gpu_type, count);
        }
        table
    }
}

/// Memory as Slurm prints it (`515000M`, `64G`), kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, From, Display)]
pub struct MemQuantity(pub String);

impl From<&str> for MemQuantity {
    fn from(value: &str) -> Self {
        MemQuantity(value.to_owned())
    }
}

impl MemQuantity {
    /// The number in front of the unit suffix (`256G` -> `256`), unit ignored. `None` if empty.
    pub fn magnitude(&self) -> Result<Option<f64>, ParseError> {
        let input = self.0.trim();
        if input.is_empty() {
            return Ok(None);
        }
        let scalar: String = match input.chars().last() {
            Some(unit) if unit.is_ascii_alphabetic() => input.chars().dropping_back(1).collect(),
            _ => input.to_owned(),
        };
        scalar
            .parse::<f64>()
            .map(Some)
            .map_err(|e| ParseError::numeric("mem", input, e))
    }
}
