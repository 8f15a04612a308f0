// CEX handlers module
pub mod balance_handler;
pub mod order_handler;
pub mod settlement_handler;

pub use balance_handler::*;
pub use order_handler::*;
pub use settlement_handler::*;

/// 핸들러 공통 에러 응답 (ExchangeError에서 변환)
pub type ApiError = (axum::http::StatusCode, axum::Json<serde_json::Value>);
