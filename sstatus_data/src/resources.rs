use itertools::Itertools as _;
use log::debug;

use crate::error::{NumberError, ParseError};
use crate::misc::parsing::{parse_count, parse_count_token, token_value};
use crate::slurm::{GpuTable, MemQuantity, GPU_MARKER};

/// One TRES descriptor, as found behind `CfgTRES=` / `AllocTRES=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources {
    pub cpus: u64,
    pub mem: MemQuantity,
    pub gpus: GpuTable,
}

impl Resources {
    /// Parses `cpu=64,mem=515000M,billing=64,gres/gpu=4,gres/gpu:a100=4`.
    ///
    /// The first token is the CPU count and the second the memory, whatever their keys. Of the
    /// remaining tokens only typed GPUs (`gres/gpu:<type>=<n>`) are kept.
    ///
    /// Descriptors with less than 3 tokens (e.g. the empty `AllocTRES=` of an idle node) are all
    /// zero. Counts that don't parse are an error.
    pub fn parse(descriptor: &str) -> Result<Self, ParseError> {
        let tokens = descriptor.trim().split(',').collect_vec();
        let (cpu, mem, rest) = match tokens.as_slice() {
            [cpu, mem, rest @ ..] if !rest.is_empty() => (*cpu, *mem, rest),
            _ => {
                debug!("TRES descriptor {descriptor:?} has less than 3 fields, counting it as empty");
                return Ok(Resources::default());
            }
        };

        let cpus = parse_count_token("cpu", cpu)?;
        let mem = MemQuantity::from(token_value(mem).unwrap_or_default());
        let gpus = rest
            .iter()
            .filter_map(|token| token.strip_prefix(GPU_MARKER))
            .map(|gpu| match gpu.split_once('=') {
                Some((gpu_type, count)) => Ok((gpu_type, parse_count("gres/gpu", count)?)),
                None => Err(ParseError::numeric("gres/gpu", gpu, NumberError::NoValue)),
            })
            .process_results(|iter| iter.collect::<GpuTable>())?;

        Ok(Resources { cpus, mem, gpus })
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod test {
    use color_eyre::Result;

    use super::*;

    #[test]
    fn Resources__parse__typed_gpus() -> Result<()> {
        let res = Resources::parse("cpu=16,mem=256G,gres/gpu:a100=4,gres/gpu:v100=2")?;
        assert_eq!(res.cpus, 16);
        assert_eq!(res.mem, MemQuantity::from("256G"));
        assert_eq!(res.gpus, [("a100", 4), ("v100", 2)].into_iter().collect());
        Ok(())
    }

    #[test]
    fn Resources__parse__ignores_other_tokens() -> Result<()> {
        let res = Resources::parse("cpu=64,mem=515000M,billing=64,gres/gpu=4,gres/gpu:a100=4")?;
        assert_eq!(res.cpus, 64);
        assert_eq!(*res.mem, "515000M");
        assert_eq!(res.gpus, [("a100", 4)].into_iter().collect());
        Ok(())
    }

    #[test]
    fn Resources__parse__no_gpus() -> Result<()> {
        let res = Resources::parse("cpu=8,mem=32G,billing=8")?;
        assert_eq!(res.cpus, 8);
        assert!(res.gpus.is_empty());
        Ok(())
    }

    #[test]
    fn Resources__parse__less_than_three_fields() -> Result<()> {
        assert_eq!(Resources::parse("cpu=16,mem=256G")?, Resources::default());
        assert_eq!(Resources::parse("")?, Resources::default());
        // not even looked at
        assert_eq!(Resources::parse("cpu=x")?, Resources::default());
        Ok(())
    }

    #[test]
    fn Resources__parse__bad_cpu_count() {
        let err = Resources::parse("cpu=many,mem=1G,billing=1").unwrap_err();
        assert!(matches!(err, ParseError::NumericParse { field: "cpu", .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn Resources__parse__bad_gpu_count() {
        let err = Resources::parse("cpu=1,mem=1G,gres/gpu:a100=4(S:0)").unwrap_err();
        assert!(matches!(err, ParseError::NumericParse { field: "gres/gpu", .. }));
        let err = Resources::parse("cpu=1,mem=1G,gres/gpu:a100").unwrap_err();
        assert!(matches!(
            err,
            ParseError::NumericParse {
                source: NumberError::NoValue,
                ..
            }
        ));
    }
}
