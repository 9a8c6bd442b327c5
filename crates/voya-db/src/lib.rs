//! PostgreSQL persistence for the voya itinerary service.
//!
//! Connection pool with embedded migrations ([`pool`]), connection
//! settings ([`config`]), row models plus the order-list types
//! ([`models`]), and per-table query functions ([`queries`]). Rejected
//! statements surface as [`error::StoreError`] carrying the backend's
//! diagnostic triplet; operational plumbing (pool setup, migrations) uses
//! `anyhow` instead.

pub mod config;
pub mod error;
pub mod models;
pub mod pool;
pub mod queries;
