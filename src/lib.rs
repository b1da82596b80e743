//! Promo definitions and member enrollment
//!
//! The crate is laid out as ports and adapters:
//!
//! * [`domain`] holds the pure promo validation and enrollment eligibility rules.
//! * [`ports`] declares the stores the use cases depend on.
//! * [`commands`] implements each use case as a [`tower::Service`].
//! * [`adapters`] contains concrete stores and the JSON-lines front end.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
