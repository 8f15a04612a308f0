use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Deserializer, Serializer};
use utoipa::ToSchema;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::asset::Asset;
use crate::shared::errors::{ExchangeError, ExchangeResult};

// =====================================================
// ID 직렬화 헬퍼 함수 (JavaScript 정밀도 손실 방지)
// =====================================================
/// u64를 문자열로 직렬화 (JavaScript 정밀도 손실 방지)
/// Serialize u64 as string to avoid precision loss in JavaScript
pub(crate) fn serialize_u64_as_string<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

/// 문자열을 u64로 역직렬화
/// Deserialize string to u64
pub(crate) fn deserialize_string_to_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<u64>().map_err(serde::de::Error::custom)
}

// =====================================================
// Order 모델
// =====================================================
// 역할: 오더북에 올라간 지정가 주문
//
// 주문 방향:
// - buy: 호가 자산(USDT)으로 기준 자산(BTC)을 삼
// - sell: 기준 자산(BTC)을 팔고 호가 자산(USDT)을 받음
//
// 주문 상태:
// - open: 미체결 수량이 남아 있음 (매칭 대상)
// - filled: 전량 체결 (quantity == 0, completed_at 설정)
//
// quantity는 "남은" 수량입니다. 체결될 때마다 줄어들며 늘어나지 않습니다.
// (같은 가격의 주문 병합은 주문 생성 경로에서만 발생)
// =====================================================

/// 주문 방향
/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }

    /// 주문 생성 시 잠가야 하는 자산과 금액
    /// Asset and amount to reserve for a new order
    ///
    /// - buy: price * quantity (호가 자산)
    /// - sell: quantity (기준 자산)
    ///
    /// # Errors
    /// - `MalformedOrder`: 총액이 상한을 넘거나 곱셈이 오버플로
    pub fn reservation(&self, price: Decimal, quantity: Decimal) -> ExchangeResult<(Asset, Decimal)> {
        match self {
            OrderSide::Buy => Ok((Asset::Quote, order_notional(price, quantity)?)),
            OrderSide::Sell => Ok((Asset::Base, quantity)),
        }
    }
}

// =====================================================
// 가격 / 수량 정밀도
// =====================================================
// 가격과 수량의 소수 자릿수는 각각 8자리 이하,
// 주문 총액은 MAX_ORDER_NOTIONAL 이하로 제한합니다.
//
// 이 범위 안에서는 체결 총액 (price * 체결 수량)의 가수가 96비트에
// 들어가므로 Decimal 곱셈이 반올림되지 않습니다.
// → 체결별 총액의 합 == 주문 생성 시 잠근 금액
// =====================================================

/// 가격 소수 자릿수 상한
pub const MAX_PRICE_SCALE: u32 = 8;

/// 수량 소수 자릿수 상한
pub const MAX_QUANTITY_SCALE: u32 = 8;

/// 주문 총액 상한 (호가 자산 기준, 10^12)
pub fn max_order_notional() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

/// 주문 총액 (price * quantity)
/// Order notional, rejected when it overflows or exceeds the cap
pub fn order_notional(price: Decimal, quantity: Decimal) -> ExchangeResult<Decimal> {
    price
        .checked_mul(quantity)
        .filter(|notional| *notional <= max_order_notional())
        .ok_or_else(|| {
            ExchangeError::MalformedOrder(format!(
                "order notional too large: {} x {} (max {})",
                price,
                quantity,
                max_order_notional()
            ))
        })
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            _ => Err(ExchangeError::MalformedOrder(format!("invalid order type: {}", s))),
        }
    }
}

/// 주문 상태
/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Filled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Filled => "filled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(OrderStatus::Open),
            "filled" => Ok(OrderStatus::Filled),
            other => Err(ExchangeError::Persistence(anyhow::anyhow!(
                "unknown order status: {}",
                other
            ))),
        }
    }
}

/// 주문 정보 (데이터베이스에서 조회한 주문)
/// Order information (order retrieved from database)
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[schema(as = Order)]
pub struct Order {
    /// Order ID (BIGSERIAL, auto-generated)
    /// 주문 ID (DB에서 자동 생성, 같은 가격/시간일 때 우선순위 기준)
    #[serde(serialize_with = "serialize_u64_as_string", deserialize_with = "deserialize_string_to_u64")]
    #[schema(value_type = String, example = "42")]
    pub id: u64,

    /// 주문한 사용자 ID
    pub user_id: u64,

    #[schema(example = "buy")]
    pub side: OrderSide,

    /// 거래 자산 심볼 (기준 자산, 예: "BTC")
    #[schema(example = "BTC")]
    pub asset: String,

    /// 지정가 (호가 자산 기준, > 0)
    /// Limit price in quote asset per unit of base asset
    #[schema(value_type = String, example = "10.0")]
    pub price: Decimal,

    /// 남은 미체결 수량 (기준 자산 기준)
    /// Remaining unfilled quantity
    #[schema(value_type = String, example = "5.0")]
    pub quantity: Decimal,

    #[schema(example = "open")]
    pub status: OrderStatus,

    /// 주문 생성 시간 (Time Priority에 사용)
    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// 전량 체결 시각 (filled일 때만 Some)
    pub completed_at: Option<DateTime<Utc>>,

    /// 소프트 삭제 표시 (취소된 주문은 매칭 대상에서 제외)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    /// 매칭 대상 여부 (open + 삭제되지 않음 + 남은 수량 > 0)
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open && self.deleted_at.is_none() && self.quantity > Decimal::ZERO
    }

    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }
}

// =====================================================
// 주문 생성 요청 (Create Order Request)
// =====================================================
/// 주문 생성 요청 모델
/// Request model for creating a new order
///
/// `side`는 문자열로 받아서 서비스에서 검증합니다.
/// (잘못된 값은 MalformedOrder로 거절)
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(as = CreateOrderRequest)]
pub struct CreateOrderRequest {
    pub user_id: u64,

    /// Order type: 'buy' or 'sell'
    #[schema(example = "buy")]
    pub side: String,

    /// 거래 자산 심볼 (설정된 기준 자산과 같아야 함)
    #[schema(example = "BTC")]
    pub asset: String,

    #[schema(value_type = String, example = "10.0")]
    pub price: Decimal,

    #[schema(value_type = String, example = "5.0")]
    pub quantity: Decimal,
}

/// 주문 응답 모델
/// Response model for order operations
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = OrderResponse)]
pub struct OrderResponse {
    pub order: Order,

    #[schema(example = "Order created successfully")]
    pub message: String,
}

/// 주문 목록 응답 모델
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = OrdersResponse)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

// =====================================================
// Order 생성용 (Repository에서 사용)
// =====================================================
/// 주문 생성 시 사용하는 내부 모델 (DB 저장용)
/// Internal model for creating orders (for database storage)
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub user_id: u64,
    pub side: OrderSide,
    pub asset: String,
    pub price: Decimal,
    pub quantity: Decimal,
}
