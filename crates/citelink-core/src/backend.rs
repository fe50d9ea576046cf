use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("model provider error: {0}")]
    Provider(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single prompt sent to a language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub prompt: String,
    /// Caller-supplied budget; implementors must give up after it elapses.
    pub timeout: Duration,
}

impl ModelRequest {
    pub fn new(prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            timeout,
        }
    }
}

/// The only part of a provider response the pipeline reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: String,
}

/// Trait for language-model backends.
///
/// Implementors own the provider, model name and transport. The extraction
/// pipeline only ever asks for plain text and treats any error as "no answer",
/// so a failing backend never stops a document from being processed.
pub trait ModelBackend: Send + Sync {
    fn call_model(&self, request: &ModelRequest) -> Result<ModelResponse, BackendError>;
}
