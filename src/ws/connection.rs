//! WebSocket transport for the connection hub.
//!
//! Each upgraded socket gets a [`WsConnection`], the handle the hub writes
//! to, and a [`run_connection`] task that owns the socket. The two are
//! joined by a bounded queue: hub writes never wait on the network, and a
//! peer that stops reading fills its own queue instead of stalling the hub.
//!
//! The task holds only the receiving end. Once the hub drops the handle
//! (displaced or failed write) the queue closes and the task ends.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::messages::Outbound;
use crate::domain::{ConnectionId, DonationNotice, RecipientId};
use crate::hub::{Connection, Hub, TransportError};

/// Default capacity of a connection's outbound queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 32;

/// Hub-facing handle for one WebSocket.
#[derive(Debug)]
pub struct WsConnection {
    id: ConnectionId,
    outbound: mpsc::Sender<Outbound>,
}

impl WsConnection {
    /// Creates a handle and the queue its socket task drains.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let conn = Self {
            id: ConnectionId::new(),
            outbound,
        };
        (conn, rx)
    }
}

impl Connection for WsConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, notice: &DonationNotice) -> Result<(), TransportError> {
        let json = serde_json::to_string(notice)?;
        self.outbound
            .try_send(Outbound::Notice(json))
            .map_err(|e| match e {
                TrySendError::Full(_) => TransportError::Backpressure,
                TrySendError::Closed(_) => TransportError::Closed,
            })
    }

    fn close(&self) {
        // a full queue still ends the socket once the hub drops this handle
        let _ = self.outbound.try_send(Outbound::replaced());
    }
}

/// Owns one upgraded socket for its whole life.
///
/// Registers the socket for `recipient_id`, forwards queued notices as text
/// frames, and deregisters when either side goes away.
pub async fn run_connection(socket: WebSocket, hub: Hub, recipient_id: RecipientId, capacity: usize) {
    let (conn, mut outbound_rx) = WsConnection::new(capacity);
    let connection_id = conn.id();
    let (mut ws_tx, mut ws_rx) = socket.split();

    if let Err(e) = hub
        .register_connection(Arc::new(conn) as Arc<dyn Connection>, recipient_id)
        .await
    {
        tracing::error!(recipient = %recipient_id, error = %e, "failed to register ws connection");
        // a registration applied after the timeout must not outlive this socket
        if let Err(e) = hub.deregister(connection_id).await {
            tracing::warn!(connection = %connection_id, error = %e, "failed to deregister ws connection");
        }
        let _ = ws_tx.send(Message::Close(None)).await;
        return;
    }
    tracing::info!(recipient = %recipient_id, connection = %connection_id, "ws connection opened");

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(Outbound::Notice(text)) => {
                        if ws_tx.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Close { code, reason }) => {
                        let frame = CloseFrame { code, reason: Utf8Bytes::from_static(reason) };
                        let _ = ws_tx.send(Message::Close(Some(frame))).await;
                        break;
                    }
                    None => break,
                }
            }
            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    // overlays only listen
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    if let Err(e) = hub.deregister(connection_id).await {
        tracing::warn!(connection = %connection_id, error = %e, "failed to deregister ws connection");
    }
    tracing::info!(recipient = %recipient_id, connection = %connection_id, "ws connection closed");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn notice() -> DonationNotice {
        DonationNotice {
            name: "Ada".to_string(),
            text: "hi".to_string(),
            amount: 5,
        }
    }

    #[test]
    fn send_queues_serialized_notice() {
        let (conn, mut rx) = WsConnection::new(4);
        assert!(conn.send(&notice()).is_ok());
        assert_eq!(
            rx.try_recv().ok(),
            Some(Outbound::Notice(r#"{"name":"Ada","text":"hi","amount":5}"#.to_string()))
        );
    }

    #[test]
    fn full_queue_is_backpressure() {
        let (conn, _rx) = WsConnection::new(1);
        assert!(conn.send(&notice()).is_ok());
        assert!(matches!(conn.send(&notice()), Err(TransportError::Backpressure)));
    }

    #[test]
    fn dropped_socket_task_is_closed() {
        let (conn, rx) = WsConnection::new(4);
        drop(rx);
        assert!(matches!(conn.send(&notice()), Err(TransportError::Closed)));
    }

    #[test]
    fn close_queues_replaced_frame() {
        let (conn, mut rx) = WsConnection::new(4);
        conn.close();
        assert_eq!(rx.try_recv().ok(), Some(Outbound::replaced()));
    }

    #[test]
    fn handles_have_distinct_ids() {
        let (a, _rx_a) = WsConnection::new(1);
        let (b, _rx_b) = WsConnection::new(1);
        assert_ne!(a.id(), b.id());
    }
}
