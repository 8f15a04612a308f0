use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::asset::Asset;

/// 잔고 잠금 (Reservation)
/// Funds removed from `available` and held against an open order
///
/// 같은 (user, asset)에 여러 개가 동시에 존재할 수 있습니다 (주문 하나당 하나).
/// 불변식: sum(reservations) + available == 총 보유량
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reservation {
    pub id: u64,
    pub user_id: u64,
    pub asset: Asset,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
