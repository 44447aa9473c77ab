//! Clients module - the aggregate that owns each CAS record.

mod clients_model;
mod clients_service;
mod clients_traits;

#[cfg(test)]
pub(crate) mod clients_test_support;

pub use clients_model::{Client, ClientSummary, NewClient};
pub use clients_service::ClientService;
pub use clients_traits::{ClientRepositoryTrait, ClientServiceTrait};
