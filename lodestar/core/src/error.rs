use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while opening a research stream or talking to the
/// request/response API.
///
/// Failures on an already-open stream are not represented here: the stream
/// task converts them into terminal [`lodestar_protocol::StreamMessage::Error`]
/// payloads so that the interpreter handles every failure through the same
/// path as a server-reported error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request to server failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server rejected the stream request (status code: {status})")]
    StreamRejected { status: u16 },
}
