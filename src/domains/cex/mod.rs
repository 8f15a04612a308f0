// CEX domain module
pub mod engine;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use models::*;
