use thiserror::Error;
use axum::{http::StatusCode, Json};
use rust_decimal::Decimal;
use serde_json::json;

use crate::domains::cex::models::Asset;

/// 거래소 관련 에러
/// Exchange errors (order creation, settlement, persistence)
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// 사용 가능 잔고 부족 (주문 생성 / 출금 시)
    /// Not enough available balance
    #[error("Insufficient balance: user={user_id}, asset={asset}, required={required}, available={available}")]
    InsufficientBalance {
        user_id: u64,
        asset: Asset,
        required: Decimal,
        available: Decimal,
    },

    /// 잠긴 금액 부족 (정산 시)
    /// Reserved amount is smaller than the amount being settled
    #[error("Insufficient reservation: user={user_id}, asset={asset}, required={required}, reserved={reserved}")]
    InsufficientReservation {
        user_id: u64,
        asset: Asset,
        required: Decimal,
        reserved: Decimal,
    },

    /// 잘못된 주문 요청 (방향, 자산, 가격/수량)
    /// Malformed order request
    #[error("Malformed order: {0}")]
    MalformedOrder(String),

    /// 잘못된 금액 (0 이하 등)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// 사용자를 찾을 수 없음
    /// User not found
    #[error("User not found: id={id}")]
    UserNotFound { id: u64 },

    /// 주문을 찾을 수 없음
    /// Order not found
    #[error("Order not found: id={id}")]
    OrderNotFound { id: u64 },

    /// 정산 사이클 중 패닉 발생 (트랜잭션은 롤백됨)
    /// A settlement cycle panicked and was rolled back
    #[error("Settlement panicked: {0}")]
    SettlementPanicked(String),

    /// 저장소 에러
    /// Persistence error
    #[error("Persistence error: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ExchangeError {
    fn from(err: sqlx::Error) -> Self {
        ExchangeError::Persistence(anyhow::Error::new(err))
    }
}

impl ExchangeError {
    /// 응답 본문에 넣는 짧은 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            ExchangeError::InsufficientBalance { .. } => "insufficient_balance",
            ExchangeError::InsufficientReservation { .. } => "insufficient_reservation",
            ExchangeError::MalformedOrder(_) => "malformed_order",
            ExchangeError::InvalidAmount(_) => "invalid_amount",
            ExchangeError::UserNotFound { .. } => "user_not_found",
            ExchangeError::OrderNotFound { .. } => "order_not_found",
            ExchangeError::SettlementPanicked(_) => "settlement_panicked",
            ExchangeError::Persistence(_) => "persistence_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ExchangeError::MalformedOrder(_) | ExchangeError::InvalidAmount(_) => {
                StatusCode::BAD_REQUEST
            }
            ExchangeError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ExchangeError::UserNotFound { .. } | ExchangeError::OrderNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            ExchangeError::InsufficientReservation { .. }
            | ExchangeError::SettlementPanicked(_)
            | ExchangeError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// ExchangeError를 HTTP 응답으로 변환
impl From<ExchangeError> for (StatusCode, Json<serde_json::Value>) {
    fn from(err: ExchangeError) -> Self {
        let status = err.status_code();
        (
            status,
            Json(json!({
                "error": err.code(),
                "message": err.to_string(),
            })),
        )
    }
}
