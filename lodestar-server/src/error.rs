use thiserror::Error;

/// Errors produced by the research pipeline.
///
/// Every variant ends the current research operation; the message is sent
/// to the client verbatim as a terminal `error` stream message.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("search request failed: {0}")]
    Search(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("no valid sources could be extracted, try a different query")]
    NoSources,
}
