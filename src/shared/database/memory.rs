use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::store::{BalanceLedger, OrderStore, ReservationStore, Store, UnitOfWork};
use crate::domains::cex::engine::matcher::{buy_priority, sell_priority};
use crate::domains::cex::models::{
    Asset, MatchCreate, MatchStatus, Order, OrderCreate, OrderMatch, OrderSide, OrderStatus,
    Reservation, User, UserCreate,
};
use crate::shared::errors::{ExchangeError, ExchangeResult};

// =====================================================
// 메모리 저장소 (MemoryStore)
// =====================================================
// 역할: 테스트/벤치마크용 Store 구현
//
// 트랜잭션 모델:
// 1. begin(): 뮤텍스를 잡고 전체 상태를 복사 (작업 사본)
// 2. 작업 사본에만 변경 적용
// 3. commit(): 작업 사본을 원본에 덮어씀
// 4. drop / rollback(): 작업 사본을 버림
//
// 뮤텍스는 UnitOfWork 수명 동안 유지되므로 트랜잭션은 직렬화됩니다.
// =====================================================

/// 메모리 저장소의 전체 상태
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: BTreeMap<u64, User>,
    pub orders: BTreeMap<u64, Order>,
    pub matches: BTreeMap<u64, OrderMatch>,
    pub reservations: BTreeMap<u64, Reservation>,
    next_user_id: u64,
    next_order_id: u64,
    next_match_id: u64,
    next_reservation_id: u64,
}

impl MemoryState {
    /// 사용자의 자산별 잠금 합계
    pub fn reserved(&self, user_id: u64, asset: Asset) -> Decimal {
        self.reservations
            .values()
            .filter(|r| r.user_id == user_id && r.asset == asset)
            .map(|r| r.amount)
            .sum()
    }

    /// available + reserved
    pub fn total(&self, user_id: u64, asset: Asset) -> Decimal {
        let available = self
            .users
            .get(&user_id)
            .map(|u| u.available(asset))
            .unwrap_or(Decimal::ZERO);
        available + self.reserved(user_id, asset)
    }

    fn next_id(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }

    fn user_mut(&mut self, id: u64) -> ExchangeResult<&mut User> {
        self.users
            .get_mut(&id)
            .ok_or(ExchangeError::UserNotFound { id })
    }

    fn open_orders(&self, side: OrderSide) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| o.side == side && o.is_open())
            .cloned()
            .collect()
    }
}

/// 메모리 Store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 커밋된 상태 복사본 (테스트 검증용)
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Uow = MemoryUnitOfWork;

    async fn begin(&self) -> ExchangeResult<MemoryUnitOfWork> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnitOfWork { guard, working })
    }
}

/// 메모리 트랜잭션
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self) -> ExchangeResult<()> {
        let MemoryUnitOfWork { mut guard, working } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> ExchangeResult<()> {
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryUnitOfWork {
    async fn load_open_buy_orders(&mut self) -> ExchangeResult<Vec<Order>> {
        let mut orders = self.working.open_orders(OrderSide::Buy);
        orders.sort_by(buy_priority);
        Ok(orders)
    }

    async fn load_open_sell_orders(&mut self) -> ExchangeResult<Vec<Order>> {
        let mut orders = self.working.open_orders(OrderSide::Sell);
        orders.sort_by(sell_priority);
        Ok(orders)
    }

    async fn insert_order(&mut self, order: OrderCreate) -> ExchangeResult<Order> {
        let id = MemoryState::next_id(&mut self.working.next_order_id);
        let now = Utc::now();
        let order = Order {
            id,
            user_id: order.user_id,
            side: order.side,
            asset: order.asset,
            price: order.price,
            quantity: order.quantity,
            status: OrderStatus::Open,
            created_at: now,
            updated_at: now,
            completed_at: None,
            deleted_at: None,
        };
        self.working.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn find_order(&mut self, id: u64) -> ExchangeResult<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn find_open_order(
        &mut self,
        user_id: u64,
        side: OrderSide,
        price: Decimal,
    ) -> ExchangeResult<Option<Order>> {
        Ok(self
            .working
            .orders
            .values()
            .find(|o| o.user_id == user_id && o.side == side && o.price == price && o.is_open())
            .cloned())
    }

    async fn update_order_quantity(&mut self, id: u64, quantity: Decimal) -> ExchangeResult<Order> {
        let order = self
            .working
            .orders
            .get_mut(&id)
            .ok_or(ExchangeError::OrderNotFound { id })?;
        order.quantity = quantity;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn bulk_update_orders(&mut self, orders: &[Order]) -> ExchangeResult<()> {
        let now = Utc::now();
        for updated in orders {
            let order = self
                .working
                .orders
                .get_mut(&updated.id)
                .ok_or(ExchangeError::OrderNotFound { id: updated.id })?;
            order.quantity = updated.quantity;
            order.status = updated.status;
            order.completed_at = updated.completed_at;
            order.updated_at = now;
        }
        Ok(())
    }

    async fn list_orders(&mut self) -> ExchangeResult<Vec<Order>> {
        Ok(self.working.orders.values().cloned().collect())
    }

    async fn insert_matches(&mut self, matches: &[MatchCreate]) -> ExchangeResult<Vec<OrderMatch>> {
        let mut saved = Vec::with_capacity(matches.len());
        for m in matches {
            let id = MemoryState::next_id(&mut self.working.next_match_id);
            let record = OrderMatch {
                id,
                buy_order_id: m.buy_order_id,
                sell_order_id: m.sell_order_id,
                price: m.price,
                quantity: m.quantity,
                status: MatchStatus::Pending,
                matched_at: m.matched_at,
                settled_at: None,
            };
            self.working.matches.insert(id, record.clone());
            saved.push(record);
        }
        Ok(saved)
    }

    async fn find_match(
        &mut self,
        buy_order_id: u64,
        sell_order_id: u64,
    ) -> ExchangeResult<Option<OrderMatch>> {
        Ok(self
            .working
            .matches
            .values()
            .find(|m| {
                m.buy_order_id == buy_order_id && m.sell_order_id == sell_order_id && m.is_pending()
            })
            .cloned())
    }

    async fn retire_match(&mut self, id: u64) -> ExchangeResult<()> {
        let record = self
            .working
            .matches
            .get_mut(&id)
            .ok_or_else(|| ExchangeError::Persistence(anyhow!("match not found: id={}", id)))?;
        record.status = MatchStatus::Settled;
        record.settled_at = Some(Utc::now());
        Ok(())
    }

    async fn list_matches(&mut self) -> ExchangeResult<Vec<OrderMatch>> {
        Ok(self.working.matches.values().cloned().collect())
    }
}

#[async_trait]
impl BalanceLedger for MemoryUnitOfWork {
    async fn create_user(&mut self, user: UserCreate) -> ExchangeResult<User> {
        let id = MemoryState::next_id(&mut self.working.next_user_id);
        let now = Utc::now();
        let user = User {
            id,
            email: user.email,
            base_available: user.base_available,
            quote_available: user.quote_available,
            created_at: now,
            updated_at: now,
        };
        self.working.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&mut self, id: u64) -> ExchangeResult<Option<User>> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn lock_user(&mut self, id: u64) -> ExchangeResult<User> {
        // 뮤텍스가 이미 전체 상태를 잡고 있으므로 존재 확인만
        self.working
            .users
            .get(&id)
            .cloned()
            .ok_or(ExchangeError::UserNotFound { id })
    }

    async fn list_users(&mut self) -> ExchangeResult<Vec<User>> {
        Ok(self.working.users.values().cloned().collect())
    }

    async fn credit(&mut self, user_id: u64, asset: Asset, amount: Decimal) -> ExchangeResult<User> {
        if amount < Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(format!("negative credit: {}", amount)));
        }
        let user = self.working.user_mut(user_id)?;
        let current = user.available(asset);
        *user.available_mut(asset) = current.checked_add(amount).ok_or_else(|| {
            ExchangeError::InvalidAmount(format!("balance overflow: {} + {}", current, amount))
        })?;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn debit(&mut self, user_id: u64, asset: Asset, amount: Decimal) -> ExchangeResult<User> {
        if amount < Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(format!("negative debit: {}", amount)));
        }
        let user = self.working.user_mut(user_id)?;
        let available = user.available(asset);
        if available < amount {
            return Err(ExchangeError::InsufficientBalance {
                user_id,
                asset,
                required: amount,
                available,
            });
        }
        *user.available_mut(asset) -= amount;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl ReservationStore for MemoryUnitOfWork {
    async fn insert_reservation(
        &mut self,
        user_id: u64,
        asset: Asset,
        amount: Decimal,
    ) -> ExchangeResult<Reservation> {
        let id = MemoryState::next_id(&mut self.working.next_reservation_id);
        let now = Utc::now();
        let reservation = Reservation {
            id,
            user_id,
            asset,
            amount,
            created_at: now,
            updated_at: now,
        };
        self.working.reservations.insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn list_reservations(&mut self, user_id: u64, asset: Asset) -> ExchangeResult<Vec<Reservation>> {
        let mut rows: Vec<Reservation> = self
            .working
            .reservations
            .values()
            .filter(|r| r.user_id == user_id && r.asset == asset)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn update_reservation_amount(&mut self, id: u64, amount: Decimal) -> ExchangeResult<()> {
        let reservation = self
            .working
            .reservations
            .get_mut(&id)
            .ok_or_else(|| ExchangeError::Persistence(anyhow!("reservation not found: id={}", id)))?;
        reservation.amount = amount;
        reservation.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_reservation(&mut self, id: u64) -> ExchangeResult<()> {
        self.working.reservations.remove(&id);
        Ok(())
    }

    async fn reserved_total(&mut self, user_id: u64, asset: Asset) -> ExchangeResult<Decimal> {
        Ok(self.working.reserved(user_id, asset))
    }
}
