use color_eyre::{eyre::WrapErr as _, Result};
use derive_builder::Builder;
use itertools::Itertools as _;
use log::{debug, warn};

use crate::error::ParseError;
use crate::misc::parsing::{field_value, first_token};
use crate::resources::Resources;
use crate::slurm::NodeState;

const NODE_NAME: &str = "NodeName";
const CFG_TRES: &str = "CfgTRES";
const ALLOC_TRES: &str = "AllocTRES";
const STATE: &str = "State";
const REASON: &str = "Reason";

/// One node of `scontrol show nodes -d`.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into), build_fn(error = "ParseError"))]
pub struct Node {
    pub name: String,
    pub state: NodeState,
    pub configured: Resources,
    pub allocated: Resources,
    /// Only set on drained/down nodes, `""` otherwise.
    #[builder(default)]
    pub reason: String,
}

impl Node {
    /// Parses the lines of one node block:
    ///
    /// ```text
    /// NodeName=gpu01 Arch=x86_64 CoresPerSocket=16
    ///    ...
    ///    State=IDLE+DRAIN ThreadsPerCore=2 TmpDisk=0 Weight=1 Owner=N/A MCS_label=N/A
    ///    ...
    ///    CfgTRES=cpu=64,mem=515000M,billing=64,gres/gpu=4,gres/gpu:a100=4
    ///    AllocTRES=
    ///    ...
    ///    Reason=maintenance [root@2024-05-02T10:12:44]
    /// ```
    ///
    /// A block without name, `CfgTRES`, `AllocTRES` or `State` is a [`ParseError::MissingField`].
    pub fn parse(lines: &[&str]) -> Result<Self, ParseError> {
        let mut builder = NodeBuilder::default();

        let name = lines
            .first()
            .map(|&line| first_token(line))
            .and_then(|token| token.strip_prefix(&format!("{NODE_NAME}=")))
            .filter(|name| !name.is_empty())
            .ok_or(ParseError::MissingField { field: NODE_NAME })?;
        builder.name(name);

        // last line wins, earlier values are never parsed
        let (mut cfg_tres, mut alloc_tres, mut state, mut reason) = (None, None, None, None);
        for &line in lines {
            cfg_tres = field_value(line, CFG_TRES).or(cfg_tres);
            alloc_tres = field_value(line, ALLOC_TRES).or(alloc_tres);
            state = field_value(line, STATE).or(state);
            reason = field_value(line, REASON).or(reason);
        }

        if let Some(value) = cfg_tres {
            builder.configured(Resources::parse(first_token(value))?);
        }
        if let Some(value) = alloc_tres {
            builder.allocated(Resources::parse(first_token(value))?);
        }
        if let Some(value) = state {
            builder.state(NodeState::classify(first_token(value)));
        }
        if let Some(value) = reason {
            builder.reason(value.trim());
        }

        builder.build()
    }
}

/// Splits the whole `scontrol show nodes -d` output into node blocks, i.e. runs of non-blank
/// lines.
pub fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let chunks = text.lines().map(str::trim_end).chunk_by(|line| line.is_empty());
    let blocks = chunks
        .into_iter()
        .filter(|(blank, _)| !blank)
        .map(|(_, block)| block.collect_vec())
        .collect_vec();
    blocks
}

/// Parses all node blocks of `text`.
///
/// Blocks missing one of the required fields are skipped with a warning, unparsable numbers abort.
pub fn parse_nodes(text: &str) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    for (idx, block) in split_blocks(text).iter().enumerate() {
        match Node::parse(block) {
            Ok(node) => {
                debug!("node {} is {}", node.name, node.state);
                nodes.push(node);
            }
            Err(e) if !e.is_fatal() => {
                warn!("skipping node block {idx} ({head:?}): {e}", head = block_head(block));
            }
            Err(e) => {
                return Err(e).wrap_err_with(|| format!("parsing node block {idx} ({:?})", block_head(block)));
            }
        }
    }
    Ok(nodes)
}

fn block_head<'a>(block: &[&'a str]) -> &'a str {
    block.first().map(|&line| first_token(line)).unwrap_or_default()
}
