//! Authority command links
//!
//! One command interface, two invokers: an in-process queue for the
//! participant that IS the authority, and an HTTP relay for everyone else.
//! The choice is made once per process role; gesture logic never knows which
//! one it holds.

use tokio::sync::mpsc;
use tracing::warn;

use crate::types::AuthorityCommand;

/// Fire-and-forget path to the authority. No return value, no error surface:
/// every command is a best-effort state update, consistent with an
/// unreliable channel.
pub trait AuthorityLink: Send + Sync {
    fn send(&self, cmd: AuthorityCommand);
}

/// Direct in-process invoker. Commands land in the authority runtime's queue
/// and are applied before its next evaluation tick, never mid-evaluation.
#[derive(Clone)]
pub struct QueueLink {
    tx: mpsc::UnboundedSender<AuthorityCommand>,
}

impl QueueLink {
    pub fn new(tx: mpsc::UnboundedSender<AuthorityCommand>) -> Self {
        Self { tx }
    }
}

impl AuthorityLink for QueueLink {
    fn send(&self, cmd: AuthorityCommand) {
        // A closed runtime means the session is gone; nothing to do
        if self.tx.send(cmd).is_err() {
            warn!("authority queue closed, dropping command");
        }
    }
}

/// Transport-backed invoker for non-authority participants. Posts each
/// command as JSON to the authority's command endpoint. Failures are logged
/// and dropped; the staleness window on the authority side is the safety net.
pub struct HttpRelayLink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRelayLink {
    /// `endpoint` is the full command URL, e.g.
    /// `http://authority:3000/session/<id>/command`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl AuthorityLink for HttpRelayLink {
    fn send(&self, cmd: AuthorityCommand) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            if let Err(e) = client.post(&endpoint).json(&cmd).send().await {
                warn!(error = %e, "relay send failed, dropping command");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    #[tokio::test]
    async fn test_queue_link_delivers_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let link = QueueLink::new(tx);
        link.send(AuthorityCommand::Engaged { side: Side::A });
        link.send(AuthorityCommand::Disengaged { side: Side::A });
        assert_eq!(
            rx.recv().await,
            Some(AuthorityCommand::Engaged { side: Side::A })
        );
        assert_eq!(
            rx.recv().await,
            Some(AuthorityCommand::Disengaged { side: Side::A })
        );
    }

    #[tokio::test]
    async fn test_queue_link_survives_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let link = QueueLink::new(tx);
        // Must not panic
        link.send(AuthorityCommand::Engaged { side: Side::B });
    }
}
