//! Multiple sequence alignment through an external command-line tool.
//!
//! Alignment itself is delegated: the unaligned FASTA is piped to the tool's
//! standard input and the aligned FASTA is taken from its standard output.
//! `kalign` is the default tool and works with no arguments in this mode:
//!
//! ```text
//! kalign < ATP5MC1.fasta > ATP5MC1_msa.fasta
//! ```
//!
//! The [`Aligner`] trait is the seam used by the selection pipeline, so tests
//! can substitute an in-process implementation.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Default alignment program
pub const DEFAULT_ALIGNER: &str = "kalign";

#[derive(Error, Debug)]
pub enum AlignError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to run aligner '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Aligner '{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Aligner '{program}' produced no output for {input}")]
    EmptyOutput { program: String, input: String },
}

/// Produces an aligned FASTA from an unaligned one
pub trait Aligner {
    /// Align the records in `unaligned`, writing the alignment to `aligned`
    ///
    /// # Errors
    ///
    /// Returns an `AlignError` if the alignment cannot be produced.
    fn align(&self, unaligned: &Path, aligned: &Path) -> Result<(), AlignError>;
}

/// Aligner backed by an external program using stdin/stdout redirection
#[derive(Debug, Clone)]
pub struct ExternalAligner {
    program: PathBuf,
    args: Vec<String>,
}

impl Default for ExternalAligner {
    fn default() -> Self {
        Self::new(DEFAULT_ALIGNER)
    }
}

impl ExternalAligner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Aligner for ExternalAligner {
    fn align(&self, unaligned: &Path, aligned: &Path) -> Result<(), AlignError> {
        let program = self.program.display().to_string();
        debug!(
            "Aligning {} -> {} with {program}",
            unaligned.display(),
            aligned.display()
        );

        let stdin = File::open(unaligned)?;
        let stdout = File::create(aligned)?;

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AlignError::Spawn {
                program: program.clone(),
                source,
            })?;
        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(AlignError::Failed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if std::fs::metadata(aligned)?.len() == 0 {
            return Err(AlignError::EmptyOutput {
                program,
                input: unaligned.display().to_string(),
            });
        }

        Ok(())
    }
}

/// Pads every sequence with gaps to the longest length
#[cfg(test)]
pub(crate) struct PadAligner;

#[cfg(test)]
impl Aligner for PadAligner {
    fn align(&self, unaligned: &Path, aligned: &Path) -> Result<(), AlignError> {
        use crate::parsing::fasta::{read_records, write_fasta};

        let mut entries = read_records(unaligned)
            .map_err(|e| AlignError::Io(std::io::Error::other(e.to_string())))?;
        let width = entries.iter().map(|e| e.seq.len()).max().unwrap_or(0);
        for entry in &mut entries {
            let pad = width - entry.seq.len();
            entry.seq.push_str(&"-".repeat(pad));
        }
        write_fasta(aligned, &entries)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_kalign() {
        assert_eq!(ExternalAligner::default().program(), Path::new("kalign"));
    }

    #[test]
    fn test_missing_program() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.fasta");
        std::fs::write(&input, ">a\nMK\n").unwrap();

        let aligner = ExternalAligner::new("definitely-not-an-aligner-binary");
        let err = aligner.align(&input, &dir.path().join("out.fasta")).unwrap_err();
        assert!(matches!(err, AlignError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_stdout_redirection() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.fasta");
        let output = dir.path().join("out.fasta");
        std::fs::write(&input, ">a\nMK\n>b\nMV\n").unwrap();

        ExternalAligner::new("cat").align(&input, &output).unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), ">a\nMK\n>b\nMV\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.fasta");
        std::fs::write(&input, ">a\nMK\n").unwrap();

        let err = ExternalAligner::new("false")
            .align(&input, &dir.path().join("out.fasta"))
            .unwrap_err();
        assert!(matches!(err, AlignError::Failed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.fasta");
        std::fs::write(&input, ">a\nMK\n").unwrap();

        let err = ExternalAligner::new("true")
            .align(&input, &dir.path().join("out.fasta"))
            .unwrap_err();
        assert!(matches!(err, AlignError::EmptyOutput { .. }));
    }

    #[test]
    fn test_pad_aligner() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.fasta");
        let output = dir.path().join("out.fasta");
        std::fs::write(&input, ">a\nMKVL\n>b\nMK\n").unwrap();

        PadAligner.align(&input, &output).unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), ">a\nMKVL\n>b\nMK--\n");
    }
}
