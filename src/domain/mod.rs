//! Domain layer: identities, stored records and events.
//!
//! This module contains the server-side domain model: recipient and
//! connection identity, donation and streamer records, the closed set of
//! domain events published on the event bus, and the delivery request the
//! connection hub turns into an outbound notice.

pub mod delivery;
pub mod domain_event;
pub mod donation;
pub mod ids;
pub mod streamer;

pub use delivery::{DeliveryEvent, DonationNotice};
pub use domain_event::{DONATION_PAYED, DomainEvent, DonationPayed};
pub use donation::{Donation, DonationFilter, DonationStatus, NewDonation};
pub use ids::{ConnectionId, RecipientId};
pub use streamer::{NewStreamer, Streamer, StreamerFilter, generate_secret_code};
