//! 현물 거래소 백엔드: 주문 매칭 + 잔고 잠금 + 주기적 정산
//! Spot exchange backend with periodic batch settlement.

pub mod domains;
pub mod routes;
pub mod shared;
