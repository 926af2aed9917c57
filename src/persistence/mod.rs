//! Persistence layer: donation and streamer records.
//!
//! Provides the [`DonationStore`] and [`StreamerStore`] traits consumed by
//! the HTTP handlers. [`PostgresStore`] backs them with `sqlx::PgPool`;
//! [`MemoryStore`] keeps everything in process for tests and for running
//! with persistence disabled.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    Donation, DonationFilter, NewDonation, NewStreamer, RecipientId, Streamer, StreamerFilter,
};
use crate::error::AppError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Storage for donation records.
#[async_trait]
pub trait DonationStore: Send + Sync + fmt::Debug {
    /// Inserts a donation and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn create_donation(&self, donation: NewDonation) -> Result<Donation, AppError>;

    /// Returns every donation matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn find_donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, AppError>;

    /// Returns the donation with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn get_donation(&self, id: i64) -> Result<Option<Donation>, AppError>;

    /// Overwrites the stored donation with the same ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure or if no
    /// donation has that ID.
    async fn update_donation(&self, donation: &Donation) -> Result<(), AppError>;
}

/// Storage for streamer records.
#[async_trait]
pub trait StreamerStore: Send + Sync + fmt::Debug {
    /// Inserts a streamer and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn create_streamer(&self, streamer: NewStreamer) -> Result<Streamer, AppError>;

    /// Returns every streamer matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn find_streamers(&self, filter: &StreamerFilter) -> Result<Vec<Streamer>, AppError>;

    /// Returns the streamer with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn get_streamer(&self, id: RecipientId) -> Result<Option<Streamer>, AppError>;
}
