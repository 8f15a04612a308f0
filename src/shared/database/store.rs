use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domains::cex::models::{
    Asset, MatchCreate, Order, OrderCreate, OrderMatch, OrderSide, Reservation, User, UserCreate,
};
use crate::shared::errors::ExchangeResult;

// =====================================================
// 저장소 계약 (Store / UnitOfWork)
// =====================================================
// 역할: 엔진이 의존하는 영속성 인터페이스
//
// 하나의 UnitOfWork = 하나의 트랜잭션 범위
// - PostgreSQL: sqlx::Transaction 하나
// - 메모리: 전체 상태 스냅샷 + 뮤텍스
//
// commit()하지 않고 drop하면 롤백됩니다.
// (에러 전파 / 패닉 모두 같은 경로)
// =====================================================

/// 주문 / 매칭 저장소
/// Order and match persistence
#[async_trait]
pub trait OrderStore: Send {
    /// 미체결 매수 주문 (가격 내림차순 → 생성시간 → ID, 행 잠금)
    /// Open buy orders, best (highest) price first
    async fn load_open_buy_orders(&mut self) -> ExchangeResult<Vec<Order>>;

    /// 미체결 매도 주문 (가격 오름차순 → 생성시간 → ID, 행 잠금)
    /// Open sell orders, best (lowest) price first
    async fn load_open_sell_orders(&mut self) -> ExchangeResult<Vec<Order>>;

    async fn insert_order(&mut self, order: OrderCreate) -> ExchangeResult<Order>;

    async fn find_order(&mut self, id: u64) -> ExchangeResult<Option<Order>>;

    /// 같은 (user, side, price)의 미체결 주문 (병합 대상)
    async fn find_open_order(
        &mut self,
        user_id: u64,
        side: OrderSide,
        price: Decimal,
    ) -> ExchangeResult<Option<Order>>;

    /// 주문 수량 변경 (병합 시 증가)
    async fn update_order_quantity(&mut self, id: u64, quantity: Decimal) -> ExchangeResult<Order>;

    /// 매칭 결과로 바뀐 주문들 저장 (quantity / status / completed_at)
    async fn bulk_update_orders(&mut self, orders: &[Order]) -> ExchangeResult<()>;

    async fn list_orders(&mut self) -> ExchangeResult<Vec<Order>>;

    /// 매칭 저장 (pending 상태, 입력 순서 유지)
    async fn insert_matches(&mut self, matches: &[MatchCreate]) -> ExchangeResult<Vec<OrderMatch>>;

    /// pending 매칭 조회 (settled는 반환하지 않음)
    async fn find_match(
        &mut self,
        buy_order_id: u64,
        sell_order_id: u64,
    ) -> ExchangeResult<Option<OrderMatch>>;

    /// 매칭을 settled로 전환
    async fn retire_match(&mut self, id: u64) -> ExchangeResult<()>;

    async fn list_matches(&mut self) -> ExchangeResult<Vec<OrderMatch>>;
}

/// 사용자 잔고 원장
/// Balance ledger (available balances)
#[async_trait]
pub trait BalanceLedger: Send {
    async fn create_user(&mut self, user: UserCreate) -> ExchangeResult<User>;

    async fn find_user(&mut self, id: u64) -> ExchangeResult<Option<User>>;

    /// 사용자 행 잠금 (없으면 UserNotFound)
    async fn lock_user(&mut self, id: u64) -> ExchangeResult<User>;

    async fn list_users(&mut self) -> ExchangeResult<Vec<User>>;

    async fn credit(&mut self, user_id: u64, asset: Asset, amount: Decimal) -> ExchangeResult<User>;

    /// 잔고 차감 (음수가 되면 InsufficientBalance)
    async fn debit(&mut self, user_id: u64, asset: Asset, amount: Decimal) -> ExchangeResult<User>;
}

/// 잠금(reservation) 저장소
#[async_trait]
pub trait ReservationStore: Send {
    async fn insert_reservation(
        &mut self,
        user_id: u64,
        asset: Asset,
        amount: Decimal,
    ) -> ExchangeResult<Reservation>;

    /// 오래된 순서로 (행 잠금)
    async fn list_reservations(&mut self, user_id: u64, asset: Asset) -> ExchangeResult<Vec<Reservation>>;

    async fn update_reservation_amount(&mut self, id: u64, amount: Decimal) -> ExchangeResult<()>;

    async fn delete_reservation(&mut self, id: u64) -> ExchangeResult<()>;

    /// 잠긴 금액 합계 (없으면 0)
    async fn reserved_total(&mut self, user_id: u64, asset: Asset) -> ExchangeResult<Decimal>;
}

/// 하나의 트랜잭션 범위
/// One transactional scope over all three stores
#[async_trait]
pub trait UnitOfWork: OrderStore + BalanceLedger + ReservationStore + Send {
    async fn commit(self) -> ExchangeResult<()>;

    async fn rollback(self) -> ExchangeResult<()>;
}

/// UnitOfWork 생성기
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Uow: UnitOfWork;

    async fn begin(&self) -> ExchangeResult<Self::Uow>;
}
