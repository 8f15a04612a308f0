// CEX domain models
pub mod asset;
pub mod order;
pub mod order_match;
pub mod reservation;
pub mod user;

pub use asset::*;
pub use order::*;
pub use order_match::*;
pub use reservation::*;
pub use user::*;
