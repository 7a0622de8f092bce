//! Service layer
//!
//! Contains business logic separated from HTTP handlers.

mod availability;

pub use availability::{
    AvailabilityReport, AvailabilityService, CheckKind, PublicProfile, classify_status,
    is_valid_username,
};
