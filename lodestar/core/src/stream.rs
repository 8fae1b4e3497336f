use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use lodestar_protocol::StreamMessage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Local terminal error injected when an inbound payload is not valid JSON
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse server response";

/// Local terminal error injected when the transport drops unexpectedly
pub const CONNECTION_LOST_MESSAGE: &str = "Connection to server lost";

/// Path of the server-push stream endpoint
const STREAM_PATH: &str = "/api/research/stream";

/// Handle to one live research stream.
///
/// Dropping the handle or calling [`StreamHandle::close`] cancels the
/// session; `close` is idempotent. Messages are delivered in transport
/// order and the channel ends after the first terminal message.
pub struct StreamHandle {
    epoch: u64,
    receiver: mpsc::Receiver<StreamMessage>,
    token: CancellationToken,
}

impl StreamHandle {
    /// Session epoch this handle belongs to
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Receive the next decoded message, or `None` once the session ended
    pub async fn recv(&mut self) -> Option<StreamMessage> {
        self.receiver.recv().await
    }

    /// Token cancelled when this session is superseded or closed; used to
    /// tie scheduled display tasks to the session lifetime.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel the session. Safe to call any number of times.
    pub fn close(&self) {
        self.token.cancel();
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Opens the server-push connection for one query and forwards decoded
/// messages to the caller.
///
/// At most one session is live per client: `start` cancels the previous
/// session before opening a new one, and every session carries an epoch so
/// that callbacks from a superseded session are dropped instead of mutating
/// the new session's state.
pub struct EventStreamClient {
    base_url: Url,
    client: reqwest::Client,
    epoch: Arc<AtomicU64>,
    current: Mutex<Option<CancellationToken>>,
}

impl EventStreamClient {
    pub fn try_new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            client: reqwest::Client::new(),
            epoch: Arc::new(AtomicU64::new(0)),
            current: Mutex::new(None),
        })
    }

    /// Open a new stream for `query`, superseding any live session.
    ///
    /// The returned handle yields decoded [`StreamMessage`]s. Payloads that
    /// fail to parse and transport failures both surface as terminal
    /// `Error` messages so the interpreter handles every failure through
    /// one path; the session ends after the first terminal message.
    pub async fn start(&self, query: &str) -> Result<StreamHandle> {
        let (epoch, token) = self.begin_session();
        let url = self.stream_url(query);
        debug!(%url, epoch, "opening research stream");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::StreamRejected {
                status: response.status().as_u16(),
            });
        }

        let (tx, rx) = mpsc::channel::<StreamMessage>(32);
        let shared_epoch = Arc::clone(&self.epoch);
        let task_token = token.clone();

        tokio::spawn(async move {
            let mut stream = Box::pin(response.bytes_stream().eventsource());

            loop {
                let event = tokio::select! {
                    _ = task_token.cancelled() => break,
                    event = stream.next() => event,
                };

                // The session may have been superseded while we were
                // suspended on the transport.
                if shared_epoch.load(Ordering::SeqCst) != epoch {
                    debug!(epoch, "dropping event from superseded session");
                    break;
                }

                let message = match event {
                    Some(Ok(event)) => {
                        if event.data.is_empty() {
                            continue;
                        }
                        match decode_payload(&event.data) {
                            Ok(message) => message,
                            Err(error) => {
                                warn!(%error, "failed to parse stream payload");
                                local_error(PARSE_FAILURE_MESSAGE)
                            }
                        }
                    }
                    Some(Err(error)) => {
                        warn!(%error, "stream transport failed");
                        local_error(CONNECTION_LOST_MESSAGE)
                    }
                    None => local_error(CONNECTION_LOST_MESSAGE),
                };

                let terminal = is_terminal(&message);
                if tx.send(message).await.is_err() {
                    break;
                }
                if terminal {
                    break;
                }
            }

            debug!(epoch, "stream session finished");
        });

        Ok(StreamHandle {
            epoch,
            receiver: rx,
            token,
        })
    }

    /// Close the current session, if any. Idempotent.
    pub fn close(&self) {
        let current = self.current.lock().expect("session lock poisoned");
        if let Some(token) = current.as_ref() {
            token.cancel();
        }
    }

    /// Advance the session epoch and cancel the superseded session.
    fn begin_session(&self) -> (u64, CancellationToken) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let mut current = self.current.lock().expect("session lock poisoned");
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }

        (epoch, token)
    }

    fn stream_url(&self, query: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(STREAM_PATH);
        url.query_pairs_mut().clear().append_pair("query", query);
        url
    }
}

fn decode_payload(data: &str) -> serde_json::Result<StreamMessage> {
    serde_json::from_str::<StreamMessage>(data)
}

fn local_error(message: &str) -> StreamMessage {
    StreamMessage::Error {
        message: message.to_string(),
    }
}

fn is_terminal(message: &StreamMessage) -> bool {
    matches!(
        message,
        StreamMessage::Report { .. } | StreamMessage::Error { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client() -> EventStreamClient {
        EventStreamClient::try_new("http://localhost:3031").unwrap()
    }

    /// One-shot HTTP server that answers any request with `body` as an
    /// event stream, advertising `advertised_length` bytes before closing.
    async fn serve_stream_response(body: &'static str, advertised_length: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;

            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {advertised_length}\r\nconnection: close\r\n\r\n{body}"
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{address}")
    }

    async fn serve_stream_body(body: &'static str) -> String {
        serve_stream_response(body, body.len()).await
    }

    #[test]
    fn test_stream_url_encodes_query() {
        let url = client().stream_url("rust async runtimes?");

        assert_eq!(url.path(), "/api/research/stream");
        assert_eq!(
            url.query().unwrap(),
            "query=rust+async+runtimes%3F"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(EventStreamClient::try_new("not a url").is_err());
    }

    #[test]
    fn test_begin_session_increments_epoch_and_cancels_previous() {
        let client = client();

        let (first_epoch, first_token) = client.begin_session();
        assert!(!first_token.is_cancelled());

        let (second_epoch, second_token) = client.begin_session();
        assert_eq!(second_epoch, first_epoch + 1);
        assert!(first_token.is_cancelled());
        assert!(!second_token.is_cancelled());
    }

    #[test]
    fn test_close_is_idempotent() {
        let client = client();

        // Closing with no session is a no-op.
        client.close();

        let (_, token) = client.begin_session();
        client.close();
        client.close();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_decode_payload_accepts_known_messages() {
        let message = decode_payload(r#"{"type":"progress","message":"Searching..."}"#).unwrap();
        assert_eq!(
            message,
            StreamMessage::Progress {
                message: "Searching...".to_string(),
                details: None,
            }
        );
    }

    #[test]
    fn test_decode_payload_rejects_invalid_json() {
        assert!(decode_payload("not json").is_err());
    }

    #[tokio::test]
    async fn test_malformed_payload_ends_session_with_parse_error() {
        let server = serve_stream_body("data: not json\n\n").await;
        let client = EventStreamClient::try_new(&server).unwrap();

        let mut handle = client.start("rust").await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(local_error(PARSE_FAILURE_MESSAGE))
        );
        assert_eq!(handle.recv().await, None);
    }

    #[tokio::test]
    async fn test_stream_end_without_terminal_reports_connection_lost() {
        let server = serve_stream_body(
            "data: {\"type\":\"progress\",\"message\":\"Searching the web...\"}\n\n",
        )
        .await;
        let client = EventStreamClient::try_new(&server).unwrap();

        let mut handle = client.start("rust").await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(StreamMessage::Progress {
                message: "Searching the web...".to_string(),
                details: None,
            })
        );
        assert_eq!(
            handle.recv().await,
            Some(local_error(CONNECTION_LOST_MESSAGE))
        );
        assert_eq!(handle.recv().await, None);
    }

    #[tokio::test]
    async fn test_truncated_transport_reports_connection_lost() {
        let body = "data: {\"type\":\"progress\",\"message\":\"Searching the web...\"}\n\n";
        // Advertise more body than is ever sent so the socket closes mid-read.
        let server = serve_stream_response(body, body.len() + 64).await;
        let client = EventStreamClient::try_new(&server).unwrap();

        let mut handle = client.start("rust").await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(StreamMessage::Progress {
                message: "Searching the web...".to_string(),
                details: None,
            })
        );
        assert_eq!(
            handle.recv().await,
            Some(local_error(CONNECTION_LOST_MESSAGE))
        );
        assert_eq!(handle.recv().await, None);
    }

    #[tokio::test]
    async fn test_session_ends_after_first_terminal_message() {
        let server = serve_stream_body(
            "data: {\"type\":\"report\",\"report\":\"# done\"}\n\n\
             data: {\"type\":\"progress\",\"message\":\"Searching again\"}\n\n",
        )
        .await;
        let client = EventStreamClient::try_new(&server).unwrap();

        let mut handle = client.start("rust").await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(StreamMessage::Report {
                report: "# done".to_string(),
            })
        );
        assert_eq!(handle.recv().await, None);
    }

    #[test]
    fn test_terminal_messages() {
        assert!(is_terminal(&StreamMessage::Report {
            report: "# done".to_string(),
        }));
        assert!(is_terminal(&local_error(CONNECTION_LOST_MESSAGE)));
        assert!(!is_terminal(&StreamMessage::Unknown));
    }
}
