use lodestar_protocol::{ProgressDetails, StreamMessage};
use tokio::sync::mpsc;
use tracing::debug;

/// Sends progress updates for one research operation down its event stream.
///
/// A closed channel (client went away) is not an error for the pipeline;
/// the send is simply dropped and the operation keeps running.
#[derive(Clone)]
pub struct ProgressSender {
    tx: mpsc::Sender<StreamMessage>,
}

impl ProgressSender {
    pub fn new(tx: mpsc::Sender<StreamMessage>) -> Self {
        Self { tx }
    }

    /// Emit a plain progress update
    pub async fn update(&self, message: impl Into<String>) {
        self.send(StreamMessage::Progress {
            message: message.into(),
            details: None,
        })
        .await;
    }

    /// Emit a progress update carrying the list of source URLs
    pub async fn update_with_urls(&self, message: impl Into<String>, urls: Vec<String>) {
        self.send(StreamMessage::Progress {
            message: message.into(),
            details: Some(ProgressDetails { urls }),
        })
        .await;
    }

    async fn send(&self, message: StreamMessage) {
        if self.tx.send(message).await.is_err() {
            debug!("progress receiver dropped, update discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_updates_are_forwarded_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let progress = ProgressSender::new(tx);

        progress.update("Searching for sources...").await;
        progress
            .update_with_urls("Extracting content from 1 sources", vec!["http://a".to_string()])
            .await;

        assert_eq!(
            rx.recv().await.unwrap(),
            StreamMessage::Progress {
                message: "Searching for sources...".to_string(),
                details: None,
            }
        );
        match rx.recv().await.unwrap() {
            StreamMessage::Progress { details, .. } => {
                assert_eq!(details.unwrap().urls, vec!["http://a"]);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let progress = ProgressSender::new(tx);
        progress.update("Searching for sources...").await;
    }
}
