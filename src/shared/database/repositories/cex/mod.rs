// CEX repositories
pub mod order_repository;
pub mod match_repository;
pub mod user_repository;
pub mod reservation_repository;

pub use order_repository::*;
pub use match_repository::*;
pub use user_repository::*;
pub use reservation_repository::*;
