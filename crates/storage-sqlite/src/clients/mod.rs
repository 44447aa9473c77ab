//! SQLite storage implementation for clients.

mod model;
mod repository;

pub use model::ClientDB;
pub use repository::ClientRepository;
