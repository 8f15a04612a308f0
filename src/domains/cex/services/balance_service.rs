use rust_decimal::Decimal;
use tracing::info;

use crate::domains::cex::engine::LockManager;
use crate::domains::cex::models::{
    Asset, AssetBalance, AssetSymbols, CreateUserRequest, DepositRequest, User, UserBalanceResponse,
    UserCreate,
};
use crate::shared::database::{BalanceLedger, Store, UnitOfWork};
use crate::shared::errors::{ExchangeError, ExchangeResult};

/// 잔고 서비스
/// Balance Service
///
/// 역할:
/// - 사용자 생성 (초기 잔고 포함)
/// - 입금 (available 증가)
/// - 잔고 조회 (available / reserved / total)
#[derive(Clone)]
pub struct BalanceService<S: Store> {
    store: S,
    symbols: AssetSymbols,
    locks: LockManager,
}

impl<S: Store> BalanceService<S> {
    pub fn new(store: S, symbols: AssetSymbols) -> Self {
        Self {
            store,
            symbols,
            locks: LockManager::new(),
        }
    }

    pub fn symbols(&self) -> &AssetSymbols {
        &self.symbols
    }

    /// 사용자 생성
    /// Create a user with optional starting balances
    pub async fn create_user(&self, request: CreateUserRequest) -> ExchangeResult<User> {
        let email = request.email.trim().to_string();
        if email.is_empty() {
            return Err(ExchangeError::InvalidAmount("email must not be empty".to_string()));
        }

        let base = request.base_balance.unwrap_or(Decimal::ZERO);
        let quote = request.quote_balance.unwrap_or(Decimal::ZERO);
        if base < Decimal::ZERO || quote < Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(
                "initial balances must not be negative".to_string(),
            ));
        }

        let mut uow = self.store.begin().await?;
        let user = uow
            .create_user(UserCreate {
                email,
                base_available: base,
                quote_available: quote,
            })
            .await?;
        uow.commit().await?;

        info!(user_id = user.id, "user created");
        Ok(user)
    }

    /// 입금
    /// Credit `amount` of the given asset symbol to the user's available balance
    pub async fn deposit(&self, user_id: u64, request: DepositRequest) -> ExchangeResult<UserBalanceResponse> {
        let asset = self.symbols.resolve(&request.asset).ok_or_else(|| {
            ExchangeError::InvalidAmount(format!("unknown asset: {}", request.asset))
        })?;
        if request.amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(format!(
                "deposit amount must be positive: {}",
                request.amount
            )));
        }

        let mut uow = self.store.begin().await?;
        uow.lock_user(user_id).await?;
        uow.credit(user_id, asset, request.amount).await?;
        let balance = self.balance_view(&mut uow, user_id).await?;
        uow.commit().await?;

        info!(user_id, %asset, amount = %request.amount, "deposit applied");
        Ok(balance)
    }

    /// 잔고 조회
    /// Get available / reserved / total per asset
    pub async fn get_balance(&self, user_id: u64) -> ExchangeResult<UserBalanceResponse> {
        let mut uow = self.store.begin().await?;
        let balance = self.balance_view(&mut uow, user_id).await?;
        uow.rollback().await?;
        Ok(balance)
    }

    pub async fn list_users(&self) -> ExchangeResult<Vec<User>> {
        let mut uow = self.store.begin().await?;
        let users = uow.list_users().await?;
        uow.rollback().await?;
        Ok(users)
    }

    async fn balance_view(&self, uow: &mut S::Uow, user_id: u64) -> ExchangeResult<UserBalanceResponse> {
        let user = uow
            .find_user(user_id)
            .await?
            .ok_or(ExchangeError::UserNotFound { id: user_id })?;

        let mut balances = Vec::with_capacity(Asset::ALL.len());
        for asset in Asset::ALL {
            let available = user.available(asset);
            let reserved = self.locks.reserved_total(uow, user_id, asset).await?;
            balances.push(AssetBalance {
                asset,
                symbol: self.symbols.symbol(asset).to_string(),
                available,
                reserved,
                total: available.saturating_add(reserved),
            });
        }

        Ok(UserBalanceResponse {
            user_id: user.id,
            email: user.email,
            balances,
        })
    }
}
