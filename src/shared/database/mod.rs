// Database module
pub mod connection;
pub mod memory;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::*;
pub use memory::{MemoryState, MemoryStore, MemoryUnitOfWork};
pub use postgres::{PgStore, PgUnitOfWork};
pub use store::*;
