use cesu8conv::TranscodeError;
use thiserror::Error;

use std::io;

/// Fatal failures of the command line tool, each with its own exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("couldn't open {path}")]
    OpenInput {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("couldn't write {target} while processing {input}")]
    Write {
        target: String,
        input: String,
        #[source]
        source: TranscodeError,
    },

    #[error("couldn't read from {input}")]
    Read {
        input: String,
        #[source]
        source: TranscodeError,
    },

    #[error("couldn't open {path}")]
    OpenOutput {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("couldn't successfully close {path}")]
    CloseOutput {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::OpenInput { .. } => 1,
            CliError::Write { .. } => 2,
            CliError::Read { .. } => 3,
            CliError::OpenOutput { .. } => 4,
            CliError::CloseOutput { .. } => 5,
        }
    }

    /// Sorts a failed transcode call into a read or write failure.
    pub fn from_transcode(err: TranscodeError, input: &str, target: &str) -> Self {
        match err {
            TranscodeError::FailedToWrite { .. } => CliError::Write {
                target: target.to_owned(),
                input: input.to_owned(),
                source: err,
            },
            // Buffer sizes are range checked by clap, so only reads are left.
            _ => CliError::Read {
                input: input.to_owned(),
                source: err,
            },
        }
    }
}
