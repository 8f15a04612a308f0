use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::asset::Asset;

// =====================================================
// User 모델
// =====================================================
// 역할: 사용자와 두 자산의 "사용 가능" 잔고
//
// 잔고 구분:
// - available: 지금 바로 쓸 수 있는 잔고 (users 테이블)
// - reserved: 주문에 묶인 금액 (reservations 테이블, Lock Manager 담당)
//
// 예시:
// - USDT 100 보유, 10 USDT x 5 매수 주문
//   → quote available: 50, reserved: 50
// - 주문이 체결되면
//   → quote available: 50, reserved: 0, base available: +5
//
// 불변식: available >= 0 (DB CHECK 제약으로도 보장)
// =====================================================

/// 사용자 정보 (잔고 포함)
/// User with available balances
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[schema(as = User)]
pub struct User {
    /// User ID (BIGSERIAL)
    pub id: u64,

    #[schema(example = "trader@example.com")]
    pub email: String,

    /// 사용 가능한 기준 자산 잔고
    /// Available base asset balance
    #[schema(value_type = String, example = "5.0")]
    pub base_available: Decimal,

    /// 사용 가능한 호가 자산 잔고
    /// Available quote asset balance
    #[schema(value_type = String, example = "100.0")]
    pub quote_available: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 자산별 사용 가능 잔고
    pub fn available(&self, asset: Asset) -> Decimal {
        match asset {
            Asset::Base => self.base_available,
            Asset::Quote => self.quote_available,
        }
    }

    pub(crate) fn available_mut(&mut self, asset: Asset) -> &mut Decimal {
        match asset {
            Asset::Base => &mut self.base_available,
            Asset::Quote => &mut self.quote_available,
        }
    }
}

/// 사용자 생성용 내부 모델 (Repository에서 사용)
/// Internal model for creating users
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub email: String,
    pub base_available: Decimal,
    pub quote_available: Decimal,
}

// =====================================================
// 요청/응답 모델
// =====================================================

/// 사용자 생성 요청
/// Request model for creating a user
#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = CreateUserRequest)]
pub struct CreateUserRequest {
    #[schema(example = "trader@example.com")]
    pub email: String,

    /// 초기 기준 자산 잔고 (기본값 0)
    #[schema(value_type = Option<String>, example = "5.0")]
    pub base_balance: Option<Decimal>,

    /// 초기 호가 자산 잔고 (기본값 0)
    #[schema(value_type = Option<String>, example = "100.0")]
    pub quote_balance: Option<Decimal>,
}

/// 입금 요청 (잔고 충전)
/// Deposit request
#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = DepositRequest)]
pub struct DepositRequest {
    /// 자산 심볼 (예: "BTC", "USDT")
    #[schema(example = "USDT")]
    pub asset: String,

    #[schema(value_type = String, example = "1000.0")]
    pub amount: Decimal,
}

/// 자산 하나의 잔고 상세 (available / reserved / total)
/// Balance breakdown for one asset
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
#[schema(as = AssetBalance)]
pub struct AssetBalance {
    pub asset: Asset,

    #[schema(example = "USDT")]
    pub symbol: String,

    #[schema(value_type = String, example = "50.0")]
    pub available: Decimal,

    /// 주문에 묶인 금액
    #[schema(value_type = String, example = "50.0")]
    pub reserved: Decimal,

    /// available + reserved
    #[schema(value_type = String, example = "100.0")]
    pub total: Decimal,
}

/// 사용자 잔고 응답
/// User balance response
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = UserBalanceResponse)]
pub struct UserBalanceResponse {
    pub user_id: u64,
    pub email: String,
    pub balances: Vec<AssetBalance>,
}

impl UserBalanceResponse {
    pub fn balance(&self, asset: Asset) -> Option<&AssetBalance> {
        self.balances.iter().find(|b| b.asset == asset)
    }
}

/// 사용자 목록 응답
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = UsersResponse)]
pub struct UsersResponse {
    pub users: Vec<User>,
}
