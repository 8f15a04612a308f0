// CEX services module
// CEX 서비스 모듈

pub mod balance_service;
pub mod order_service;
pub mod state;

pub use balance_service::*;
pub use order_service::*;
pub use state::*;
