use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::hints::FailureHint;

/// Every way an invocation of the external tool can fail.
///
/// None of these are fatal to the application: callers surface
/// [`YtdlpError::user_message`] and keep running.
#[derive(Debug, Error)]
pub enum YtdlpError {
    /// The locator exhausted every candidate path.
    #[error("{tool} was not found. Please install {tool} or place it next to the application")]
    ExecutableNotFound { tool: String, searched: Vec<PathBuf> },

    /// The process could not be started at all.
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    /// The process ran and exited unsuccessfully.
    #[error("yt-dlp failed ({}): {stderr}", exit_label(.exit_code))]
    Process {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The metadata output could not be decoded.
    #[error("could not decode yt-dlp output: {0}")]
    Decode(String),

    /// Malformed user input, rejected before anything is spawned.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("yt-dlp did not answer within {}s", whole_secs(.0))]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,
}

pub type YtdlpResult<T> = Result<T, YtdlpError>;

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "terminated by signal".to_string(),
    }
}

fn whole_secs(d: &Duration) -> u64 {
    d.as_secs()
}

impl YtdlpError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Only an expired wait is worth retrying without user intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Short category name for the `kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExecutableNotFound { .. } => "executable_not_found",
            Self::Spawn { .. } => "spawn",
            Self::Process { .. } => "process",
            Self::Decode(_) => "decode",
            Self::Validation(_) => "validation",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable message with remediation steps when the captured
    /// stderr matches a known failure.
    pub fn user_message(&self) -> String {
        let base = self.to_string();
        let hint = match self {
            Self::Process { stderr, .. } => FailureHint::classify(stderr).remediation(),
            _ => None,
        };
        match hint {
            Some(steps) => format!("{}\n\n{}", base, steps),
            None => base,
        }
    }
}
