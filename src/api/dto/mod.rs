//! Data Transfer Objects for REST request/response serialization.

pub mod auth_dto;
pub mod donation_dto;
pub mod system_dto;

pub use auth_dto::*;
pub use donation_dto::*;
pub use system_dto::*;
