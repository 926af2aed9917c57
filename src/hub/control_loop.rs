//! The connection hub: a single control loop that owns the recipient →
//! connection map and is the only writer of outbound notices.
//!
//! Callers hold a cloneable [`Hub`] handle and talk to the loop purely by
//! message passing over bounded [`tokio::sync::mpsc`] queues. Every
//! operation on the handle is bounded by the configured send timeout, so a
//! loop that was never started surfaces as [`HubError::Timeout`] or
//! [`HubError::Stopped`] instead of a hung request.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::{Connection, ConnectionRegistry};
use crate::domain::{ConnectionId, DeliveryEvent, DonationNotice, RecipientId};

/// Default capacity of each inbound hub queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default upper bound on how long a caller waits for the loop.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Hub tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Capacity of each inbound queue (registrations, deregistrations,
    /// deliveries).
    pub queue_capacity: usize,
    /// How long a caller waits for the loop to accept a request.
    pub send_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

/// Failure to hand a request to the hub's control loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// The loop did not accept the request in time.
    #[error("hub did not accept the request within {0:?}")]
    Timeout(Duration),

    /// The loop has exited; no request will ever be accepted.
    #[error("hub control loop is not running")]
    Stopped,
}

/// A registration request, acknowledged once the loop has applied it.
#[derive(Debug)]
struct Registration {
    recipient_id: RecipientId,
    connection: Arc<dyn Connection>,
    applied: oneshot::Sender<()>,
}

/// Cloneable handle to the hub's control loop.
#[derive(Debug, Clone)]
pub struct Hub {
    registrations: mpsc::Sender<Registration>,
    deregistrations: mpsc::Sender<ConnectionId>,
    deliveries: mpsc::Sender<DeliveryEvent>,
    send_timeout: Duration,
    registered: Arc<AtomicUsize>,
}

impl Hub {
    /// Creates a hub handle and the control loop that serves it.
    ///
    /// The loop does nothing until [`HubLoop::run`] is polled; see
    /// [`Hub::spawn`] for the usual start-up path.
    #[must_use]
    pub fn new(config: HubConfig) -> (Self, HubLoop) {
        let capacity = config.queue_capacity.max(1);
        let (registrations_tx, registrations_rx) = mpsc::channel(capacity);
        let (deregistrations_tx, deregistrations_rx) = mpsc::channel(capacity);
        let (deliveries_tx, deliveries_rx) = mpsc::channel(capacity);
        let registered = Arc::new(AtomicUsize::new(0));

        let hub = Self {
            registrations: registrations_tx,
            deregistrations: deregistrations_tx,
            deliveries: deliveries_tx,
            send_timeout: config.send_timeout,
            registered: Arc::clone(&registered),
        };
        let control_loop = HubLoop {
            registrations: registrations_rx,
            deregistrations: deregistrations_rx,
            deliveries: deliveries_rx,
            registry: ConnectionRegistry::new(),
            registered,
        };
        (hub, control_loop)
    }

    /// Creates a hub and spawns its control loop on the current runtime.
    #[must_use]
    pub fn spawn(config: HubConfig) -> Self {
        let (hub, control_loop) = Self::new(config);
        tokio::spawn(control_loop.run());
        hub
    }

    /// Registers `connection` as the live connection for `recipient_id`.
    ///
    /// Returns once the loop has applied the registration, so any delivery
    /// submitted afterwards observes it. A connection previously registered
    /// for the same recipient is closed and forgotten.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Timeout`] if the loop did not apply the request
    /// within the send timeout, or [`HubError::Stopped`] if it has exited.
    /// A registration whose caller stopped waiting is discarded by the loop
    /// and never displaces the current connection.
    pub async fn register_connection(
        &self,
        connection: Arc<dyn Connection>,
        recipient_id: RecipientId,
    ) -> Result<(), HubError> {
        let (applied, applied_rx) = oneshot::channel();
        let request = Registration {
            recipient_id,
            connection,
            applied,
        };
        self.bounded(async {
            self.registrations
                .send(request)
                .await
                .map_err(|_| HubError::Stopped)?;
            applied_rx.await.map_err(|_| HubError::Stopped)
        })
        .await
    }

    /// Submits a delivery request.
    ///
    /// Delivery is best effort and at most once: a recipient without a
    /// registered connection is skipped silently.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Timeout`] if the delivery queue stayed full for
    /// the whole send timeout, or [`HubError::Stopped`] if the loop exited.
    pub async fn deliver(&self, event: DeliveryEvent) -> Result<(), HubError> {
        self.bounded(async {
            self.deliveries
                .send(event)
                .await
                .map_err(|_| HubError::Stopped)
        })
        .await
    }

    /// Removes the registration held by `connection_id`, if it is still the
    /// current one for its recipient.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Timeout`] or [`HubError::Stopped`] as for
    /// [`Hub::deliver`].
    pub async fn deregister(&self, connection_id: ConnectionId) -> Result<(), HubError> {
        self.bounded(async {
            self.deregistrations
                .send(connection_id)
                .await
                .map_err(|_| HubError::Stopped)
        })
        .await
    }

    /// Number of recipients registered as of the loop's last operation.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.registered.load(Ordering::Relaxed)
    }

    async fn bounded<F>(&self, request: F) -> Result<(), HubError>
    where
        F: Future<Output = Result<(), HubError>>,
    {
        tokio::time::timeout(self.send_timeout, request)
            .await
            .map_err(|_| HubError::Timeout(self.send_timeout))?
    }
}

/// The hub's control loop. Sole owner of the [`ConnectionRegistry`].
#[derive(Debug)]
pub struct HubLoop {
    registrations: mpsc::Receiver<Registration>,
    deregistrations: mpsc::Receiver<ConnectionId>,
    deliveries: mpsc::Receiver<DeliveryEvent>,
    registry: ConnectionRegistry,
    registered: Arc<AtomicUsize>,
}

impl HubLoop {
    /// Serves requests one at a time until every [`Hub`] handle is dropped.
    ///
    /// Queues are polled in a fixed order: registrations, then
    /// deregistrations, then deliveries. A reconnect therefore takes effect
    /// before notices queued ahead of it. Registrations arrive once per
    /// socket upgrade, so deliveries only wait while upgrades keep the
    /// registration queue non-empty.
    pub async fn run(mut self) {
        tracing::info!("hub control loop started");
        loop {
            tokio::select! {
                biased;
                Some(registration) = self.registrations.recv() => {
                    self.apply_registration(registration);
                }
                Some(connection_id) = self.deregistrations.recv() => {
                    self.apply_deregistration(connection_id);
                }
                Some(event) = self.deliveries.recv() => {
                    self.apply_delivery(event);
                }
                else => break,
            }
            self.registered.store(self.registry.len(), Ordering::Relaxed);
        }
        tracing::info!("hub control loop stopped");
    }

    fn apply_registration(&mut self, registration: Registration) {
        let Registration {
            recipient_id,
            connection,
            applied,
        } = registration;
        let connection_id = connection.id();

        if applied.is_closed() {
            tracing::warn!(
                %recipient_id,
                %connection_id,
                "registration abandoned by caller; discarded"
            );
            return;
        }

        if let Some(displaced) = self.registry.insert(recipient_id, connection) {
            tracing::info!(
                %recipient_id,
                %connection_id,
                displaced = %displaced.id(),
                "connection replaced; closing displaced connection"
            );
            displaced.close();
        } else {
            tracing::info!(%recipient_id, %connection_id, "connection registered");
        }

        // The caller's own error path deregisters if it gave up just now.
        let _ = applied.send(());
    }

    fn apply_deregistration(&mut self, connection_id: ConnectionId) {
        match self.registry.remove_connection(connection_id) {
            Some(recipient_id) => {
                tracing::info!(%recipient_id, %connection_id, "connection deregistered");
            }
            None => {
                tracing::debug!(%connection_id, "connection was no longer registered");
            }
        }
    }

    fn apply_delivery(&mut self, event: DeliveryEvent) {
        let recipient_id = event.recipient_id;
        let Some(connection) = self.registry.get(recipient_id) else {
            tracing::debug!(%recipient_id, "no connection registered for recipient; notice dropped");
            return;
        };
        let connection_id = connection.id();

        match connection.send(&DonationNotice::from(event)) {
            Ok(()) => {
                tracing::debug!(%recipient_id, %connection_id, "notice delivered");
            }
            Err(e) => {
                tracing::warn!(
                    %recipient_id,
                    %connection_id,
                    error = %e,
                    "failed to write notice; deregistering connection"
                );
                let _ = self.registry.remove_connection(connection_id);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::hub::testing::{RecordingConnection, SlowConnection, eventually};
    use tokio_test::{assert_err, assert_ok};

    fn delivery(recipient: i64, amount: i64) -> DeliveryEvent {
        DeliveryEvent {
            recipient_id: RecipientId::new(recipient),
            amount,
            display_name: "Ada".to_string(),
            message: "hi".to_string(),
        }
    }

    fn shared(conn: &Arc<RecordingConnection>) -> Arc<dyn Connection> {
        Arc::clone(conn) as Arc<dyn Connection>
    }

    fn short_timeout() -> HubConfig {
        HubConfig {
            queue_capacity: 1,
            send_timeout: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn delivery_reaches_registered_connection() {
        let hub = Hub::spawn(HubConfig::default());
        let conn = RecordingConnection::new();

        assert_ok!(hub.register_connection(shared(&conn), RecipientId::new(42)).await);
        assert_ok!(hub.deliver(delivery(42, 5)).await);

        assert!(eventually(|| conn.sent().len() == 1).await);
        let sent = conn.sent();
        let Some(notice) = sent.first() else {
            panic!("expected one notice");
        };
        assert_eq!(notice.name, "Ada");
        assert_eq!(notice.text, "hi");
        assert_eq!(notice.amount, 5);
    }

    #[tokio::test]
    async fn re_registration_routes_to_newest_connection_only() {
        let hub = Hub::spawn(HubConfig::default());
        let first = RecordingConnection::new();
        let second = RecordingConnection::new();

        assert_ok!(hub.register_connection(shared(&first), RecipientId::new(7)).await);
        assert_ok!(hub.register_connection(shared(&second), RecipientId::new(7)).await);
        assert!(first.is_closed());
        assert!(!second.is_closed());

        assert_ok!(hub.deliver(delivery(7, 1)).await);
        assert_ok!(hub.deliver(delivery(7, 2)).await);

        assert!(eventually(|| second.sent().len() == 2).await);
        assert!(first.sent().is_empty());
        assert_eq!(hub.registered_count(), 1);
    }

    #[tokio::test]
    async fn delivery_to_unregistered_recipient_is_silent() {
        let hub = Hub::spawn(HubConfig::default());
        let conn = RecordingConnection::new();
        assert_ok!(hub.register_connection(shared(&conn), RecipientId::new(1)).await);

        assert_ok!(hub.deliver(delivery(999, 5)).await);
        // Deliveries are FIFO; once this one lands the miss was processed.
        assert_ok!(hub.deliver(delivery(1, 6)).await);

        assert!(eventually(|| conn.sent().len() == 1).await);
        assert_eq!(conn.sent().first().map(|n| n.amount), Some(6));
    }

    #[tokio::test]
    async fn registration_observed_by_delivery_from_another_task() {
        let hub = Hub::spawn(HubConfig::default());
        for recipient in 0..20 {
            let conn = RecordingConnection::new();
            let registering = hub.clone();
            let as_dyn = shared(&conn);
            let registered = tokio::spawn(async move {
                registering
                    .register_connection(as_dyn, RecipientId::new(recipient))
                    .await
            });
            let Ok(result) = registered.await else {
                panic!("registration task failed");
            };
            assert_ok!(result);

            let delivering = hub.clone();
            let delivered =
                tokio::spawn(async move { delivering.deliver(delivery(recipient, 3)).await });
            let Ok(result) = delivered.await else {
                panic!("delivery task failed");
            };
            assert_ok!(result);

            assert!(eventually(|| conn.sent().len() == 1).await);
        }
    }

    #[tokio::test]
    async fn failed_write_deregisters_connection() {
        let hub = Hub::spawn(HubConfig::default());
        let conn = RecordingConnection::failing();
        assert_ok!(hub.register_connection(shared(&conn), RecipientId::new(3)).await);
        assert_eq!(hub.registered_count(), 1);

        assert_ok!(hub.deliver(delivery(3, 5)).await);
        assert!(eventually(|| hub.registered_count() == 0).await);
    }

    #[tokio::test]
    async fn stale_deregistration_keeps_newer_connection() {
        let hub = Hub::spawn(HubConfig::default());
        let old = RecordingConnection::new();
        let new = RecordingConnection::new();
        let old_id = old.id();

        assert_ok!(hub.register_connection(shared(&old), RecipientId::new(5)).await);
        assert_ok!(hub.register_connection(shared(&new), RecipientId::new(5)).await);
        assert_ok!(hub.deregister(old_id).await);
        assert_ok!(hub.deliver(delivery(5, 9)).await);

        assert!(eventually(|| new.sent().len() == 1).await);
        assert_eq!(hub.registered_count(), 1);
    }

    #[tokio::test]
    async fn deregistration_removes_current_connection() {
        let hub = Hub::spawn(HubConfig::default());
        let conn = RecordingConnection::new();
        let id = conn.id();

        assert_ok!(hub.register_connection(shared(&conn), RecipientId::new(8)).await);
        assert_ok!(hub.deregister(id).await);

        assert!(eventually(|| hub.registered_count() == 0).await);
        assert_ok!(hub.deliver(delivery(8, 1)).await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(conn.sent().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn abandoned_registration_does_not_displace_live_connection() {
        let hub = Hub::spawn(HubConfig {
            queue_capacity: 16,
            send_timeout: Duration::from_millis(100),
        });
        let live = RecordingConnection::new();
        let slow = SlowConnection::new(Duration::from_millis(400));
        let abandoned = RecordingConnection::new();

        assert_ok!(hub.register_connection(shared(&live), RecipientId::new(1)).await);
        assert_ok!(
            hub.register_connection(Arc::clone(&slow) as Arc<dyn Connection>, RecipientId::new(2))
                .await
        );

        // Keep the loop inside a slow write while the next caller gives up.
        assert_ok!(hub.deliver(delivery(2, 1)).await);
        assert!(eventually(|| slow.writes() == 1).await);
        let result = hub
            .register_connection(shared(&abandoned), RecipientId::new(1))
            .await;
        assert_eq!(result, Err(HubError::Timeout(Duration::from_millis(100))));

        assert_ok!(hub.deliver(delivery(1, 7)).await);
        assert!(eventually(|| live.sent().len() == 1).await);
        assert!(!live.is_closed());
        assert!(abandoned.sent().is_empty());
        assert_eq!(hub.registered_count(), 2);
    }

    #[tokio::test]
    async fn queued_registration_applies_before_queued_delivery() {
        let (hub, control_loop) = Hub::new(HubConfig::default());
        let conn = RecordingConnection::new();

        assert_ok!(hub.deliver(delivery(4, 3)).await);
        let registering = hub.clone();
        let as_dyn = shared(&conn);
        let registered = tokio::spawn(async move {
            registering
                .register_connection(as_dyn, RecipientId::new(4))
                .await
        });
        // Let the registration reach its queue before the loop starts.
        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio::spawn(control_loop.run());

        let Ok(result) = registered.await else {
            panic!("registration task failed");
        };
        assert_ok!(result);
        assert!(eventually(|| conn.sent().len() == 1).await);
    }

    #[tokio::test]
    async fn register_times_out_when_loop_is_not_running() {
        let (hub, _idle_loop) = Hub::new(short_timeout());
        let conn = RecordingConnection::new();
        let result = hub.register_connection(shared(&conn), RecipientId::new(1)).await;
        assert_eq!(result, Err(HubError::Timeout(Duration::from_millis(50))));
    }

    #[tokio::test]
    async fn deliver_times_out_on_full_queue() {
        let (hub, _idle_loop) = Hub::new(short_timeout());
        assert_ok!(hub.deliver(delivery(1, 1)).await);
        assert_err!(hub.deliver(delivery(1, 2)).await);
    }

    #[tokio::test]
    async fn requests_fail_once_loop_is_gone() {
        let (hub, control_loop) = Hub::new(short_timeout());
        drop(control_loop);

        assert_eq!(hub.deliver(delivery(1, 1)).await, Err(HubError::Stopped));
        assert_eq!(hub.deregister(ConnectionId::new()).await, Err(HubError::Stopped));
    }

    #[tokio::test]
    async fn loop_exits_when_handles_are_dropped() {
        let (hub, control_loop) = Hub::new(HubConfig::default());
        let task = tokio::spawn(control_loop.run());
        drop(hub);

        let finished = tokio::time::timeout(Duration::from_secs(1), task).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }
}
