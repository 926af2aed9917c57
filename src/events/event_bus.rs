//! Name-routed, in-process event bus.
//!
//! [`EventBus::new`] splits the bus into two halves:
//!
//! - [`EventBus`], the cloneable publishing side handed to producers such as
//!   the payment webhook. Publishing is a non-blocking enqueue on a bounded
//!   [`tokio::sync::mpsc`] queue and never fails the caller.
//! - [`EventDispatcher`], the single consumer that owns the handler table.
//!   Handlers are registered at start-up, before the dispatcher is moved
//!   into its task, so the table is never shared.
//!
//! When the queue is full the event being published is dropped (drop-newest),
//! counted, and logged.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::EventHandler;
use crate::domain::DomainEvent;

/// Default capacity of the event queue.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Errors returned synchronously by the event bus.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventBusError {
    /// A handler is already registered under this name.
    #[error("event handler already exists: {0}")]
    HandlerAlreadyExists(String),
}

/// A published event in flight between producer and dispatcher.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Routing key.
    pub name: String,
    /// Typed payload.
    pub payload: DomainEvent,
}

/// Publishing half of the bus.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: mpsc::Sender<Envelope>,
    dropped: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a bus with the given queue capacity and its dispatcher.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, EventDispatcher) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let bus = Self {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        let dispatcher = EventDispatcher {
            receiver,
            handlers: HashMap::new(),
        };
        (bus, dispatcher)
    }

    /// Enqueues `payload` under the routing key `name`.
    ///
    /// Never blocks. Returns `false` if the event was dropped because the
    /// queue is full or the dispatcher is gone.
    pub fn publish(&self, payload: DomainEvent, name: &str) -> bool {
        let envelope = Envelope {
            name: name.to_string(),
            payload,
        };
        match self.sender.try_send(envelope) {
            Ok(()) => true,
            Err(TrySendError::Full(envelope)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed).saturating_add(1);
                tracing::warn!(
                    event = %envelope.name,
                    dropped_total = dropped,
                    "event queue full; event dropped"
                );
                false
            }
            Err(TrySendError::Closed(envelope)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::error!(event = %envelope.name, "event dispatcher is not running; event dropped");
                false
            }
        }
    }

    /// Enqueues `payload` under its own routing name.
    pub fn emit(&self, payload: DomainEvent) -> bool {
        let name = payload.name();
        self.publish(payload, name)
    }

    /// Total number of events dropped at publish time.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consuming half of the bus: owns the handler table and the queue.
#[derive(Debug)]
pub struct EventDispatcher {
    receiver: mpsc::Receiver<Envelope>,
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Associates `name` with `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::HandlerAlreadyExists`] if `name` already has
    /// a handler; the existing handler stays in place.
    pub fn register_handler(
        &mut self,
        handler: Arc<dyn EventHandler>,
        name: &str,
    ) -> Result<(), EventBusError> {
        match self.handlers.entry(name.to_string()) {
            Entry::Occupied(_) => Err(EventBusError::HandlerAlreadyExists(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                tracing::debug!(event = name, "event handler registered");
                Ok(())
            }
        }
    }

    /// Waits for one event and dispatches it.
    ///
    /// Returns `false` once every [`EventBus`] handle has been dropped and
    /// the queue is drained.
    pub async fn run_once(&mut self) -> bool {
        let Some(envelope) = self.receiver.recv().await else {
            return false;
        };
        self.dispatch(envelope).await;
        true
    }

    /// Dispatches events until every [`EventBus`] handle has been dropped.
    pub async fn run(mut self) {
        tracing::info!(handlers = self.handlers.len(), "event dispatcher started");
        while self.run_once().await {}
        tracing::info!("event dispatcher stopped");
    }

    async fn dispatch(&self, envelope: Envelope) {
        let Envelope { name, payload } = envelope;

        let Some(handler) = self.handlers.get(&name) else {
            tracing::warn!(event = %name, "event handler not found; event dropped");
            return;
        };

        if payload.name() != name {
            tracing::warn!(
                event = %name,
                payload = payload.name(),
                "payload does not match event name; event dropped"
            );
            return;
        }

        if let Err(e) = handler.handle(payload).await {
            tracing::error!(event = %name, error = %e, "error while handling event");
        }
    }
}
