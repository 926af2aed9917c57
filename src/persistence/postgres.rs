//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{DonationStore, StreamerStore};
use crate::config::DatabaseConfig;
use crate::domain::{
    Donation, DonationFilter, DonationStatus, NewDonation, NewStreamer, RecipientId, Streamer,
    StreamerFilter,
};
use crate::error::AppError;

const DONATION_COLUMNS: &str =
    "SELECT id, payment_id, streamer_id, amount, message, name, status, created_at FROM donations";

const STREAMER_COLUMNS: &str = "SELECT id, twitch_id, twitch_name, secret_code FROM streamers";

type DonationRow = (i64, String, i64, i64, String, String, String, DateTime<Utc>);

type StreamerRow = (i64, String, String, String);

fn donation_from_row(row: DonationRow) -> Result<Donation, AppError> {
    let (id, payment_id, streamer_id, amount, message, name, status, created_at) = row;
    let status = status
        .parse::<DonationStatus>()
        .map_err(|e| AppError::PersistenceError(e.to_string()))?;
    Ok(Donation {
        id,
        payment_id,
        streamer_id: RecipientId::new(streamer_id),
        amount,
        message,
        name,
        status,
        created_at,
    })
}

fn streamer_from_row((id, twitch_id, twitch_name, secret_code): StreamerRow) -> Streamer {
    Streamer {
        id: RecipientId::new(id),
        twitch_id,
        twitch_name,
        secret_code,
    }
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool using the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] if the database is unreachable.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::PersistenceError(e.to_string()))
    }
}

#[async_trait]
impl DonationStore for PostgresStore {
    async fn create_donation(&self, donation: NewDonation) -> Result<Donation, AppError> {
        let row = sqlx::query_as::<_, DonationRow>(
            "INSERT INTO donations (payment_id, streamer_id, amount, message, name, status) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, payment_id, streamer_id, amount, message, name, status, created_at",
        )
        .bind(&donation.payment_id)
        .bind(donation.streamer_id.get())
        .bind(donation.amount)
        .bind(&donation.message)
        .bind(&donation.name)
        .bind(donation.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        donation_from_row(row)
    }

    async fn find_donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(DONATION_COLUMNS);
        let mut separator = " WHERE ";
        if let Some(payment_id) = filter.payment_id.as_deref() {
            query.push(separator).push("payment_id = ").push_bind(payment_id);
            separator = " AND ";
        }
        if let Some(streamer_id) = filter.streamer_id {
            query.push(separator).push("streamer_id = ").push_bind(streamer_id.get());
            separator = " AND ";
        }
        if let Some(status) = filter.status {
            query.push(separator).push("status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY id ASC");

        let rows = query
            .build_query_as::<DonationRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(donation_from_row).collect()
    }

    async fn get_donation(&self, id: i64) -> Result<Option<Donation>, AppError> {
        let row = sqlx::query_as::<_, DonationRow>(&format!("{DONATION_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(donation_from_row).transpose()
    }

    async fn update_donation(&self, donation: &Donation) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE donations \
             SET payment_id = $1, streamer_id = $2, amount = $3, message = $4, name = $5, status = $6 \
             WHERE id = $7",
        )
        .bind(&donation.payment_id)
        .bind(donation.streamer_id.get())
        .bind(donation.amount)
        .bind(&donation.message)
        .bind(&donation.name)
        .bind(donation.status.as_str())
        .bind(donation.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PersistenceError(format!(
                "donation {} not found",
                donation.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StreamerStore for PostgresStore {
    async fn create_streamer(&self, streamer: NewStreamer) -> Result<Streamer, AppError> {
        let row = sqlx::query_as::<_, StreamerRow>(
            "INSERT INTO streamers (twitch_id, twitch_name, secret_code) VALUES ($1, $2, $3) \
             RETURNING id, twitch_id, twitch_name, secret_code",
        )
        .bind(&streamer.twitch_id)
        .bind(&streamer.twitch_name)
        .bind(&streamer.secret_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(streamer_from_row(row))
    }

    async fn find_streamers(&self, filter: &StreamerFilter) -> Result<Vec<Streamer>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(STREAMER_COLUMNS);
        let mut separator = " WHERE ";
        for (column, value) in [
            ("twitch_id", filter.twitch_id.as_deref()),
            ("twitch_name", filter.twitch_name.as_deref()),
            ("secret_code", filter.secret_code.as_deref()),
        ] {
            if let Some(value) = value {
                query.push(separator).push(column).push(" = ").push_bind(value);
                separator = " AND ";
            }
        }
        query.push(" ORDER BY id ASC");

        let rows = query
            .build_query_as::<StreamerRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(streamer_from_row).collect())
    }

    async fn get_streamer(&self, id: RecipientId) -> Result<Option<Streamer>, AppError> {
        let row = sqlx::query_as::<_, StreamerRow>(&format!("{STREAMER_COLUMNS} WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(streamer_from_row))
    }
}
