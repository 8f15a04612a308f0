// =====================================================
// 정산 롤백 통합 테스트
// =====================================================
// 정산 사이클 중 에러/패닉이 나면 아무 변경도 남지 않아야 함

mod common;
use common::*;

use async_trait::async_trait;
use rust_decimal::Decimal;
use exchange_server::domains::cex::engine::SettlementCoordinator;
use exchange_server::domains::cex::models::{
    Asset, MatchCreate, Order, OrderCreate, OrderMatch, OrderSide, OrderStatus, Reservation, User,
    UserCreate,
};
use exchange_server::shared::database::{
    BalanceLedger, MemoryStore, MemoryUnitOfWork, OrderStore, ReservationStore, Store, UnitOfWork,
};
use exchange_server::shared::errors::{ExchangeError, ExchangeResult};

/// 테스트: 잠금 금액이 모자라면 사이클 전체 롤백
#[tokio::test]
async fn test_reservation_mismatch_rolls_back_cycle() {
    let (store, state) = setup_test();
    let buyer = create_user(&state, 0, 100).await;
    let seller = create_user(&state, 5, 0).await;
    place(&state, buyer, "buy", 10, 5).await;
    place(&state, seller, "sell", 10, 5).await;

    // 매수자의 잠금을 50 → 10으로 손상시킴
    let mut uow = store.begin().await.unwrap();
    let rows = uow.list_reservations(buyer, Asset::Quote).await.unwrap();
    uow.update_reservation_amount(rows[0].id, dec(10)).await.unwrap();
    uow.commit().await.unwrap();

    let before = store.snapshot().await;
    let err = state.coordinator.process_transactions().await.unwrap_err();
    let after = store.snapshot().await;

    assert!(matches!(err, ExchangeError::InsufficientReservation { user_id, .. } if user_id == buyer));
    assert_eq!(before.users, after.users);
    assert_eq!(before.orders, after.orders);
    assert_eq!(before.reservations, after.reservations);
    assert!(after.matches.is_empty());
    assert!(after.orders.values().all(|o| o.status == OrderStatus::Open));
}

/// 테스트: 잠금을 복구하면 다음 사이클에서 정상 체결 (자가 복구)
#[tokio::test]
async fn test_next_cycle_settles_after_repair() {
    let (store, state) = setup_test();
    let buyer = create_user(&state, 0, 100).await;
    let seller = create_user(&state, 5, 0).await;
    place(&state, buyer, "buy", 10, 5).await;
    place(&state, seller, "sell", 10, 5).await;

    let mut uow = store.begin().await.unwrap();
    let rows = uow.list_reservations(buyer, Asset::Quote).await.unwrap();
    uow.update_reservation_amount(rows[0].id, dec(10)).await.unwrap();
    uow.commit().await.unwrap();
    assert!(state.coordinator.process_transactions().await.is_err());

    let mut uow = store.begin().await.unwrap();
    uow.update_reservation_amount(rows[0].id, dec(50)).await.unwrap();
    uow.commit().await.unwrap();

    let report = state.coordinator.process_transactions().await.unwrap();
    assert_eq!(report.matches.len(), 1);
    assert_eq!(balance(&state, buyer, Asset::Base).await.available, dec(5));
}

// =====================================================
// 패닉 주입용 Store
// =====================================================
// MemoryStore에 위임하되 retire_match에서 패닉

#[derive(Clone)]
struct PanickingStore {
    inner: MemoryStore,
}

struct PanickingUow {
    inner: MemoryUnitOfWork,
}

#[async_trait]
impl Store for PanickingStore {
    type Uow = PanickingUow;

    async fn begin(&self) -> ExchangeResult<PanickingUow> {
        Ok(PanickingUow {
            inner: self.inner.begin().await?,
        })
    }
}

#[async_trait]
impl UnitOfWork for PanickingUow {
    async fn commit(self) -> ExchangeResult<()> {
        self.inner.commit().await
    }

    async fn rollback(self) -> ExchangeResult<()> {
        self.inner.rollback().await
    }
}

#[async_trait]
impl OrderStore for PanickingUow {
    async fn load_open_buy_orders(&mut self) -> ExchangeResult<Vec<Order>> {
        self.inner.load_open_buy_orders().await
    }

    async fn load_open_sell_orders(&mut self) -> ExchangeResult<Vec<Order>> {
        self.inner.load_open_sell_orders().await
    }

    async fn insert_order(&mut self, order: OrderCreate) -> ExchangeResult<Order> {
        self.inner.insert_order(order).await
    }

    async fn find_order(&mut self, id: u64) -> ExchangeResult<Option<Order>> {
        self.inner.find_order(id).await
    }

    async fn find_open_order(
        &mut self,
        user_id: u64,
        side: OrderSide,
        price: Decimal,
    ) -> ExchangeResult<Option<Order>> {
        self.inner.find_open_order(user_id, side, price).await
    }

    async fn update_order_quantity(&mut self, id: u64, quantity: Decimal) -> ExchangeResult<Order> {
        self.inner.update_order_quantity(id, quantity).await
    }

    async fn bulk_update_orders(&mut self, orders: &[Order]) -> ExchangeResult<()> {
        self.inner.bulk_update_orders(orders).await
    }

    async fn list_orders(&mut self) -> ExchangeResult<Vec<Order>> {
        self.inner.list_orders().await
    }

    async fn insert_matches(&mut self, matches: &[MatchCreate]) -> ExchangeResult<Vec<OrderMatch>> {
        self.inner.insert_matches(matches).await
    }

    async fn find_match(&mut self, buy_order_id: u64, sell_order_id: u64) -> ExchangeResult<Option<OrderMatch>> {
        self.inner.find_match(buy_order_id, sell_order_id).await
    }

    async fn retire_match(&mut self, _id: u64) -> ExchangeResult<()> {
        panic!("storage exploded while retiring match");
    }

    async fn list_matches(&mut self) -> ExchangeResult<Vec<OrderMatch>> {
        self.inner.list_matches().await
    }
}

#[async_trait]
impl BalanceLedger for PanickingUow {
    async fn create_user(&mut self, user: UserCreate) -> ExchangeResult<User> {
        self.inner.create_user(user).await
    }

    async fn find_user(&mut self, id: u64) -> ExchangeResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn lock_user(&mut self, id: u64) -> ExchangeResult<User> {
        self.inner.lock_user(id).await
    }

    async fn list_users(&mut self) -> ExchangeResult<Vec<User>> {
        self.inner.list_users().await
    }

    async fn credit(&mut self, user_id: u64, asset: Asset, amount: Decimal) -> ExchangeResult<User> {
        self.inner.credit(user_id, asset, amount).await
    }

    async fn debit(&mut self, user_id: u64, asset: Asset, amount: Decimal) -> ExchangeResult<User> {
        self.inner.debit(user_id, asset, amount).await
    }
}

#[async_trait]
impl ReservationStore for PanickingUow {
    async fn insert_reservation(&mut self, user_id: u64, asset: Asset, amount: Decimal) -> ExchangeResult<Reservation> {
        self.inner.insert_reservation(user_id, asset, amount).await
    }

    async fn list_reservations(&mut self, user_id: u64, asset: Asset) -> ExchangeResult<Vec<Reservation>> {
        self.inner.list_reservations(user_id, asset).await
    }

    async fn update_reservation_amount(&mut self, id: u64, amount: Decimal) -> ExchangeResult<()> {
        self.inner.update_reservation_amount(id, amount).await
    }

    async fn delete_reservation(&mut self, id: u64) -> ExchangeResult<()> {
        self.inner.delete_reservation(id).await
    }

    async fn reserved_total(&mut self, user_id: u64, asset: Asset) -> ExchangeResult<Decimal> {
        self.inner.reserved_total(user_id, asset).await
    }
}

/// 테스트: 정산 중 패닉 → SettlementPanicked + 전체 롤백
#[tokio::test]
async fn test_panic_mid_cycle_rolls_back() {
    let (store, state) = setup_test();
    let buyer = create_user(&state, 0, 100).await;
    let seller = create_user(&state, 5, 0).await;
    place(&state, buyer, "buy", 10, 5).await;
    place(&state, seller, "sell", 10, 5).await;

    let panicking = SettlementCoordinator::new(PanickingStore { inner: store.clone() });

    let before = store.snapshot().await;
    let err = panicking.process_transactions().await.unwrap_err();
    let after = store.snapshot().await;

    match err {
        ExchangeError::SettlementPanicked(message) => {
            assert!(message.contains("storage exploded"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(before.users, after.users);
    assert_eq!(before.orders, after.orders);
    assert_eq!(before.reservations, after.reservations);
    assert!(after.matches.is_empty());

    // 같은 저장소로 정상 사이클을 돌리면 체결됨 (뮤텍스도 풀려 있어야 함)
    let report = state.coordinator.process_transactions().await.unwrap();
    assert_eq!(report.matches.len(), 1);
}
