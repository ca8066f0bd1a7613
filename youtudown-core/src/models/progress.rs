use serde::Serialize;

/// One parsed yt-dlp progress line. Only the latest one matters to a consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// 0.0 ..= 100.0
    pub percent: f64,
    pub speed: Option<String>,
    pub eta: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

impl OutputLine {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stderr,
            text: text.into(),
        }
    }
}

/// Terminal result of one process invocation, delivered exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ExecutionOutcome {
    Succeeded,
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
    SpawnFailed {
        message: String,
    },
    Cancelled,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Map onto the error taxonomy. `program` names the executable for spawn failures.
    pub fn into_result(self, program: &str) -> crate::YtdlpResult<()> {
        use crate::YtdlpError;

        match self {
            Self::Succeeded => Ok(()),
            Self::Failed { exit_code, stderr } => Err(YtdlpError::Process { exit_code, stderr }),
            Self::SpawnFailed { message } => Err(YtdlpError::Spawn {
                program: program.to_string(),
                message,
            }),
            Self::Cancelled => Err(YtdlpError::Cancelled),
        }
    }
}
