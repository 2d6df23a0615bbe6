use std::process::ExitCode;

use crate::nyt::FetchFailure;

/// Terminal failures that stop the process with a categorized exit code.
#[derive(Debug, thiserror::Error)]
pub enum Fatal {
    #[error("{0}")]
    Credential(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Response(String),
    #[error("{0}")]
    Empty(String),
}

impl Fatal {
    pub fn exit_code(&self) -> u8 {
        match self {
            Fatal::Credential(_) => 1,
            Fatal::Transport(_) | Fatal::Empty(_) => 2,
            Fatal::Response(_) => 3,
        }
    }
}

impl From<FetchFailure> for Fatal {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::Transport(_) => Fatal::Transport(failure.to_string()),
            FetchFailure::Status { .. } | FetchFailure::Malformed(_) | FetchFailure::NotOk(_) => {
                Fatal::Response(failure.to_string())
            }
        }
    }
}

/// Exit code for an error chain: the first [`Fatal`] decides, anything else is a plain failure.
pub fn exit_code(err: &anyhow::Error) -> ExitCode {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Fatal>())
        .map(|fatal| ExitCode::from(fatal.exit_code()))
        .unwrap_or(ExitCode::FAILURE)
}
