// Shared errors
pub mod exchange_error;

pub use exchange_error::*;
