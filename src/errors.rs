use std::fmt;

/// Errors raised by pipeline collaborators.
///
/// Quality failures are never errors; they travel as tick outcomes with a
/// guidance reason. Only contract violations from the models or the frame
/// source surface here, and none of them are fatal to the scan loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Detector output had an unsupported rank or shape.
    Shape { dims: Vec<usize> },
    /// Model invocation failed; retried with backoff.
    Inference(String),
    /// Frame source broke its contract (bad buffer size, zero dimensions).
    Frame(String),
    /// Captured crop could not be encoded.
    Encode(String),
    /// Configuration could not be loaded, parsed, or validated.
    Config(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::Shape { dims } => {
                write!(f, "Unexpected detector output shape: {:?}", dims)
            }
            PipelineError::Inference(msg) => write!(f, "Inference error: {}", msg),
            PipelineError::Frame(msg) => write!(f, "Frame source error: {}", msg),
            PipelineError::Encode(msg) => write!(f, "Encode error: {}", msg),
            PipelineError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}
