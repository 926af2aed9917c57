//! Test doubles shared by hub and handler tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Connection, TransportError};
use crate::domain::{ConnectionId, DonationNotice};

/// Connection that records every notice it is handed.
#[derive(Debug, Default)]
pub(crate) struct RecordingConnection {
    id: ConnectionId,
    sent: Mutex<Vec<DonationNotice>>,
    closed: AtomicBool,
    failing: AtomicBool,
}

impl RecordingConnection {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A connection whose peer is already gone.
    pub(crate) fn failing() -> Arc<Self> {
        let conn = Self::default();
        conn.failing.store(true, Ordering::SeqCst);
        Arc::new(conn)
    }

    pub(crate) fn sent(&self) -> Vec<DonationNotice> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Connection for RecordingConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, notice: &DonationNotice) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notice.clone());
        }
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Connection whose writes block the calling thread for a fixed time.
#[derive(Debug)]
pub(crate) struct SlowConnection {
    id: ConnectionId,
    delay: Duration,
    writes: AtomicUsize,
}

impl SlowConnection {
    pub(crate) fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::new(),
            delay,
            writes: AtomicUsize::new(0),
        })
    }

    /// Writes started so far.
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Connection for SlowConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, _notice: &DonationNotice) -> Result<(), TransportError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(())
    }

    fn close(&self) {}
}

/// Polls `condition` until it holds or roughly one second has passed.
pub(crate) async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
