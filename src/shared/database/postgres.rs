use anyhow::{anyhow, Context};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

use super::connection::Database;
use super::repositories::cex::{
    MatchRepository, OrderRepository, ReservationRepository, UserRepository,
};
use super::store::{BalanceLedger, OrderStore, ReservationStore, Store, UnitOfWork};
use crate::domains::cex::models::{
    Asset, MatchCreate, Order, OrderCreate, OrderMatch, OrderSide, Reservation, User, UserCreate,
};
use crate::shared::errors::{ExchangeError, ExchangeResult};

// =====================================================
// PostgreSQL 저장소 (PgStore)
// =====================================================
// 역할: UnitOfWork 하나 = sqlx 트랜잭션 하나
//
// 동시성:
// - 미체결 주문 스캔 / 사용자 조회 / 잠금 조회는 FOR UPDATE 행 잠금
// - 주문 생성과 정산이 같은 사용자 행을 잠그므로 서로 직렬화됨
// - 잠금 순서는 항상 주문 행 → 사용자 행 → 잠금(reservation) 행
//   (정산: 미체결 주문 스캔 후 사용자, 주문 생성: 병합 대상 주문 후 사용자)
//
// commit() 없이 drop되면 sqlx가 트랜잭션을 롤백합니다.
// =====================================================

/// PostgreSQL Store
#[derive(Clone)]
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    type Uow = PgUnitOfWork;

    async fn begin(&self) -> ExchangeResult<PgUnitOfWork> {
        let tx = self
            .db
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Ok(PgUnitOfWork { tx })
    }
}

/// PostgreSQL 트랜잭션
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> ExchangeResult<()> {
        self.tx.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }

    async fn rollback(self) -> ExchangeResult<()> {
        self.tx.rollback().await.context("Failed to rollback transaction")?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgUnitOfWork {
    async fn load_open_buy_orders(&mut self) -> ExchangeResult<Vec<Order>> {
        Ok(OrderRepository::get_open_for_update(&mut self.tx, OrderSide::Buy).await?)
    }

    async fn load_open_sell_orders(&mut self) -> ExchangeResult<Vec<Order>> {
        Ok(OrderRepository::get_open_for_update(&mut self.tx, OrderSide::Sell).await?)
    }

    async fn insert_order(&mut self, order: OrderCreate) -> ExchangeResult<Order> {
        Ok(OrderRepository::create(&mut self.tx, &order).await?)
    }

    async fn find_order(&mut self, id: u64) -> ExchangeResult<Option<Order>> {
        Ok(OrderRepository::get_by_id(&mut self.tx, id).await?)
    }

    async fn find_open_order(
        &mut self,
        user_id: u64,
        side: OrderSide,
        price: Decimal,
    ) -> ExchangeResult<Option<Order>> {
        Ok(OrderRepository::get_open_by_price(&mut self.tx, user_id, side, price).await?)
    }

    async fn update_order_quantity(&mut self, id: u64, quantity: Decimal) -> ExchangeResult<Order> {
        OrderRepository::update_quantity(&mut self.tx, id, quantity)
            .await?
            .ok_or(ExchangeError::OrderNotFound { id })
    }

    async fn bulk_update_orders(&mut self, orders: &[Order]) -> ExchangeResult<()> {
        for order in orders {
            if !OrderRepository::update_fill(&mut self.tx, order).await? {
                return Err(ExchangeError::OrderNotFound { id: order.id });
            }
        }
        Ok(())
    }

    async fn list_orders(&mut self) -> ExchangeResult<Vec<Order>> {
        Ok(OrderRepository::get_all(&mut self.tx).await?)
    }

    async fn insert_matches(&mut self, matches: &[MatchCreate]) -> ExchangeResult<Vec<OrderMatch>> {
        let mut saved = Vec::with_capacity(matches.len());
        for m in matches {
            saved.push(MatchRepository::create(&mut self.tx, m).await?);
        }
        Ok(saved)
    }

    async fn find_match(
        &mut self,
        buy_order_id: u64,
        sell_order_id: u64,
    ) -> ExchangeResult<Option<OrderMatch>> {
        Ok(MatchRepository::get_pending(&mut self.tx, buy_order_id, sell_order_id).await?)
    }

    async fn retire_match(&mut self, id: u64) -> ExchangeResult<()> {
        if !MatchRepository::mark_settled(&mut self.tx, id).await? {
            return Err(ExchangeError::Persistence(anyhow!("pending match not found: id={}", id)));
        }
        Ok(())
    }

    async fn list_matches(&mut self) -> ExchangeResult<Vec<OrderMatch>> {
        Ok(MatchRepository::get_all(&mut self.tx).await?)
    }
}

#[async_trait]
impl BalanceLedger for PgUnitOfWork {
    async fn create_user(&mut self, user: UserCreate) -> ExchangeResult<User> {
        Ok(UserRepository::create(&mut self.tx, &user).await?)
    }

    async fn find_user(&mut self, id: u64) -> ExchangeResult<Option<User>> {
        Ok(UserRepository::get_by_id(&mut self.tx, id).await?)
    }

    async fn lock_user(&mut self, id: u64) -> ExchangeResult<User> {
        UserRepository::get_for_update(&mut self.tx, id)
            .await?
            .ok_or(ExchangeError::UserNotFound { id })
    }

    async fn list_users(&mut self) -> ExchangeResult<Vec<User>> {
        Ok(UserRepository::get_all(&mut self.tx).await?)
    }

    async fn credit(&mut self, user_id: u64, asset: Asset, amount: Decimal) -> ExchangeResult<User> {
        if amount < Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(format!("negative credit: {}", amount)));
        }
        UserRepository::increase(&mut self.tx, user_id, asset, amount)
            .await?
            .ok_or(ExchangeError::UserNotFound { id: user_id })
    }

    async fn debit(&mut self, user_id: u64, asset: Asset, amount: Decimal) -> ExchangeResult<User> {
        if amount < Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(format!("negative debit: {}", amount)));
        }
        if let Some(user) = UserRepository::decrease(&mut self.tx, user_id, asset, amount).await? {
            return Ok(user);
        }

        // 행이 없거나 잔고 부족
        let user = UserRepository::get_by_id(&mut self.tx, user_id)
            .await?
            .ok_or(ExchangeError::UserNotFound { id: user_id })?;
        Err(ExchangeError::InsufficientBalance {
            user_id,
            asset,
            required: amount,
            available: user.available(asset),
        })
    }
}

#[async_trait]
impl ReservationStore for PgUnitOfWork {
    async fn insert_reservation(
        &mut self,
        user_id: u64,
        asset: Asset,
        amount: Decimal,
    ) -> ExchangeResult<Reservation> {
        Ok(ReservationRepository::create(&mut self.tx, user_id, asset, amount).await?)
    }

    async fn list_reservations(&mut self, user_id: u64, asset: Asset) -> ExchangeResult<Vec<Reservation>> {
        Ok(ReservationRepository::get_for_update(&mut self.tx, user_id, asset).await?)
    }

    async fn update_reservation_amount(&mut self, id: u64, amount: Decimal) -> ExchangeResult<()> {
        if !ReservationRepository::update_amount(&mut self.tx, id, amount).await? {
            return Err(ExchangeError::Persistence(anyhow!("reservation not found: id={}", id)));
        }
        Ok(())
    }

    async fn delete_reservation(&mut self, id: u64) -> ExchangeResult<()> {
        Ok(ReservationRepository::delete(&mut self.tx, id).await?)
    }

    async fn reserved_total(&mut self, user_id: u64, asset: Asset) -> ExchangeResult<Decimal> {
        Ok(ReservationRepository::sum(&mut self.tx, user_id, asset).await?)
    }
}
