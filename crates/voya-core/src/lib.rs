//! Core services for the voya itinerary backend.
//!
//! The [`schedule`] module owns the request-path logic: creating itinerary
//! entries, appending order-list references, and resolving one day of a
//! plan into hydrated, ordered entries.

pub mod schedule;
