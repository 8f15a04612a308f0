use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::shared::errors::ExchangeError;

// =====================================================
// OrderMatch 모델
// =====================================================
// 역할: 매수/매도 주문이 한 번 교차(crossing)한 기록
//
// 체결 과정:
// 1. 매칭 엔진이 MatchCreate 생성 (메모리)
// 2. 정산 트랜잭션에서 order_matches에 pending으로 저장
// 3. 잔고/잠금 반영 후 settled로 전환 (retire)
//
// settled 상태의 매칭은 다시 정산되지 않습니다 (멱등성 경계).
// =====================================================

/// 매칭 상태
/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// 저장됨, 잔고 반영 전
    Pending,
    /// 잔고/잠금 반영 완료
    Settled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Settled => "settled",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "settled" => Ok(MatchStatus::Settled),
            other => Err(ExchangeError::Persistence(anyhow::anyhow!(
                "unknown match status: {}",
                other
            ))),
        }
    }
}

/// 매칭 기록 (데이터베이스에서 조회한 매칭)
/// Match record
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[schema(as = OrderMatch)]
pub struct OrderMatch {
    pub id: u64,

    /// 매수 주문 ID
    pub buy_order_id: u64,

    /// 매도 주문 ID
    pub sell_order_id: u64,

    /// 체결 가격 (매수 주문의 지정가)
    /// Execution price (the buy order's limit price)
    #[schema(value_type = String, example = "10.0")]
    pub price: Decimal,

    /// 체결 수량 (기준 자산)
    #[schema(value_type = String, example = "5.0")]
    pub quantity: Decimal,

    #[schema(example = "settled")]
    pub status: MatchStatus,

    pub matched_at: DateTime<Utc>,

    pub settled_at: Option<DateTime<Utc>>,
}

impl OrderMatch {
    /// 체결 총액 (price * quantity, 호가 자산 기준)
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }

    pub fn is_pending(&self) -> bool {
        self.status == MatchStatus::Pending
    }
}

/// 매칭 생성용 내부 모델 (매칭 엔진 출력, DB 저장 전)
/// Internal model produced by the matcher
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCreate {
    pub buy_order_id: u64,
    pub sell_order_id: u64,
    pub price: Decimal,
    pub quantity: Decimal,
    pub matched_at: DateTime<Utc>,
}

impl MatchCreate {
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// 매칭 목록 응답
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = MatchesResponse)]
pub struct MatchesResponse {
    pub matches: Vec<OrderMatch>,
}
