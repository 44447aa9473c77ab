//! AdvisorDesk Core - Domain entities, services, and traits.
//!
//! This crate contains the client and CAS ingestion logic for AdvisorDesk.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod cas;
pub mod clients;
pub mod constants;
pub mod errors;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
