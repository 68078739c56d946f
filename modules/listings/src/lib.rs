//! Listings marketplace module: users and credentials, listings, reviews and
//! wishlists, with the REST surface the web client talks to.

// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::{ListingsApi, ListingsError};

pub mod config;
pub mod module;

pub use config::ListingsConfig;
pub use module::Listings;

// === INTERNAL MODULES ===
// Public so integration tests can wire the service with test doubles.
pub mod api;
pub mod domain;
pub mod gateways;
pub mod infra;
