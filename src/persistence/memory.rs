//! In-process implementation of the persistence layer.
//!
//! Used when `PERSISTENCE_ENABLED=false` and by the HTTP tests. Records
//! live for the lifetime of the process.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{DonationStore, StreamerStore};
use crate::domain::{
    Donation, DonationFilter, NewDonation, NewStreamer, RecipientId, Streamer, StreamerFilter,
};
use crate::error::AppError;

/// Store keeping donations and streamers in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    donations: RwLock<Vec<Donation>>,
    streamers: RwLock<Vec<Streamer>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Next row ID after the largest one in use, starting at 1.
fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0).saturating_add(1)
}

#[async_trait]
impl DonationStore for MemoryStore {
    async fn create_donation(&self, donation: NewDonation) -> Result<Donation, AppError> {
        let mut donations = self.donations.write().await;
        let stored = Donation {
            id: next_id(donations.iter().map(|d| d.id)),
            payment_id: donation.payment_id,
            streamer_id: donation.streamer_id,
            amount: donation.amount,
            message: donation.message,
            name: donation.name,
            status: donation.status,
            created_at: Utc::now(),
        };
        donations.push(stored.clone());
        Ok(stored)
    }

    async fn find_donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, AppError> {
        let donations = self.donations.read().await;
        Ok(donations
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    async fn get_donation(&self, id: i64) -> Result<Option<Donation>, AppError> {
        let donations = self.donations.read().await;
        Ok(donations.iter().find(|d| d.id == id).cloned())
    }

    async fn update_donation(&self, donation: &Donation) -> Result<(), AppError> {
        let mut donations = self.donations.write().await;
        let Some(slot) = donations.iter_mut().find(|d| d.id == donation.id) else {
            return Err(AppError::PersistenceError(format!(
                "donation {} not found",
                donation.id
            )));
        };
        *slot = donation.clone();
        Ok(())
    }
}

#[async_trait]
impl StreamerStore for MemoryStore {
    async fn create_streamer(&self, streamer: NewStreamer) -> Result<Streamer, AppError> {
        let mut streamers = self.streamers.write().await;
        let stored = Streamer {
            id: RecipientId::new(next_id(streamers.iter().map(|s| s.id.get()))),
            twitch_id: streamer.twitch_id,
            twitch_name: streamer.twitch_name,
            secret_code: streamer.secret_code,
        };
        streamers.push(stored.clone());
        Ok(stored)
    }

    async fn find_streamers(&self, filter: &StreamerFilter) -> Result<Vec<Streamer>, AppError> {
        let streamers = self.streamers.read().await;
        Ok(streamers
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn get_streamer(&self, id: RecipientId) -> Result<Option<Streamer>, AppError> {
        let streamers = self.streamers.read().await;
        Ok(streamers.iter().find(|s| s.id == id).cloned())
    }
}
