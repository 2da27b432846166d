use std::fs;
use std::path::PathBuf;
use std::process::Command;

use color_eyre::eyre::{eyre, WrapErr as _};
use color_eyre::{Result, Section as _, SectionExt as _};
use log::debug;

/// Header rows `squeue --Format` prints before the first job.
pub const SQUEUE_HEADER_LINES: usize = 1;

/// Where the raw scheduler output comes from.
pub trait TextSource {
    fn fetch(&self) -> Result<String>;
}

/// A Slurm command, run once; its stdout is the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlurmCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl SlurmCommand {
    pub fn scontrol_nodes(program: impl Into<PathBuf>) -> Self {
        SlurmCommand {
            program: program.into(),
            args: vec!["show".into(), "nodes".into(), "-d".into()],
        }
    }

    /// Running jobs, `|` separated, TRES list last, after [`SQUEUE_HEADER_LINES`] header rows.
    pub fn squeue_running(program: impl Into<PathBuf>) -> Self {
        SlurmCommand {
            program: program.into(),
            args: vec![
                "--state=R".into(),
                "--Format=JobId:|,UserName:|,Account:|,partition:|,QOS:|,tres-alloc:".into(),
            ],
        }
    }
}

impl TextSource for SlurmCommand {
    fn fetch(&self) -> Result<String> {
        debug!("running {} {}", self.program.display(), self.args.join(" "));
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .wrap_err_with(|| format!("executing {}", self.program.display()))?;

        if !output.status.success() {
            return Err(eyre!("{} failed with status {:?}", self.program.display(), output.status.code())
                .note(String::from_utf8_lossy(&output.stderr).trim().to_string().header("Stderr:")));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Saved output of an earlier run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile(pub PathBuf);

impl TextSource for SnapshotFile {
    fn fetch(&self) -> Result<String> {
        debug!("reading {}", self.0.display());
        fs::read_to_string(&self.0).wrap_err_with(|| format!("reading {}", self.0.display()))
    }
}

/// The snapshot if there is one, the command otherwise.
pub fn pick(snapshot: Option<PathBuf>, command: SlurmCommand) -> Box<dyn TextSource> {
    match snapshot {
        Some(path) => Box::new(SnapshotFile(path)),
        None => Box::new(command),
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod test {
    use std::io::Write as _;

    use color_eyre::Result;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn SnapshotFile__fetch() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "NodeName=gpu01\n   State=IDLE\n")?;
        assert_eq!(SnapshotFile(file.path().into()).fetch()?, "NodeName=gpu01\n   State=IDLE\n");
        Ok(())
    }

    #[test]
    fn SnapshotFile__fetch__missing() {
        let err = SnapshotFile("/nonexistent/nodes.txt".into()).fetch().unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/nodes.txt"));
    }

    #[test]
    fn SlurmCommand__fetch__not_installed() {
        let command = SlurmCommand::scontrol_nodes("/nonexistent/bin/scontrol");
        assert!(command.fetch().is_err());
    }

    #[test]
    fn SlurmCommand__squeue_running__args() {
        let command = SlurmCommand::squeue_running("squeue");
        assert_eq!(command.program, PathBuf::from("squeue"));
        assert_eq!(
            command.args,
            ["--state=R", "--Format=JobId:|,UserName:|,Account:|,partition:|,QOS:|,tres-alloc:"]
        );
    }

    #[test]
    fn pick__prefers_snapshot() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "snapshot")?;
        let source = pick(Some(file.path().into()), SlurmCommand::scontrol_nodes("/nonexistent/bin/scontrol"));
        assert_eq!(source.fetch()?, "snapshot");
        Ok(())
    }
}
