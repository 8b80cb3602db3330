use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstimaError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("division by zero: number of trials must be at least 1")]
    DivisionByZero,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("renderer error: {0}")]
    Renderer(RendererFailure),

    #[error("text generation failed: {0}")]
    ExternalService(String),
}

impl EstimaError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The two ways a render can fail. They are reported differently: a failed
/// process carries its own diagnostics, a missing artifact does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererFailure {
    ProcessFailed { diagnostic: String },
    ArtifactMissing { path: PathBuf, output: String },
}

impl fmt::Display for RendererFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProcessFailed { diagnostic } => {
                write!(f, "the renderer failed to produce a video:\n{diagnostic}")
            }
            Self::ArtifactMissing { path, .. } => write!(
                f,
                "the video was not found at {}; make sure the renderer generated it correctly",
                path.display()
            ),
        }
    }
}

pub type EstimaResult<T> = Result<T, EstimaError>;
