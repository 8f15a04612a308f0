use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domains::cex::engine::LockManager;
use crate::domains::cex::models::{
    order_notional, Asset, AssetSymbols, CreateOrderRequest, Order, OrderCreate, OrderMatch,
    OrderSide, MAX_PRICE_SCALE, MAX_QUANTITY_SCALE,
};
use crate::shared::database::{BalanceLedger, OrderStore, Store, UnitOfWork};
use crate::shared::errors::{ExchangeError, ExchangeResult};

/// 주문 서비스
/// Order Service
///
/// 역할:
/// - 주문 생성 (검증 → 잔고 잠금 → 저장)
/// - 주문 / 매칭 조회
///
/// 처리 흐름:
/// 1. API Handler → OrderService
/// 2. OrderService → 검증 (방향, 자산, 가격/수량, 정밀도)
/// 3. OrderService → LockManager (잔고 잠금)
/// 4. OrderService → Store (주문 저장 또는 병합)
///
/// 매칭은 여기서 하지 않습니다. 정산 스케줄러가 다음 주기에 처리합니다.
///
/// # Examples
/// ```ignore
/// let service = OrderService::new(store, AssetSymbols::default());
/// let order = service.create_order(request).await?;
/// ```
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
    symbols: AssetSymbols,
    locks: LockManager,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S, symbols: AssetSymbols) -> Self {
        Self {
            store,
            symbols,
            locks: LockManager::new(),
        }
    }

    /// 주문 생성
    /// Create order
    ///
    /// # 처리 과정
    /// 1. 요청 검증 (MalformedOrder)
    /// 2. 같은 가격/방향의 미체결 주문 조회 (주문 행 잠금)
    /// 3. 사용자 행 잠금 + 잔고 잠금 (buy: price * quantity 호가 자산, sell: quantity 기준 자산)
    /// 4. 기존 주문이 있으면 수량 병합, 없으면 새 주문
    /// 5. 커밋
    ///
    /// 행 잠금 순서는 정산과 같습니다: 주문 행 → 사용자 행.
    ///
    /// # Errors
    /// - `MalformedOrder`: 잘못된 방향/자산/가격/수량, 정밀도 또는 총액 상한 초과
    /// - `UserNotFound`
    /// - `InsufficientBalance`: 잠글 잔고 부족 (주문 생성 안 됨)
    pub async fn create_order(&self, request: CreateOrderRequest) -> ExchangeResult<Order> {
        let user_id = request.user_id;
        let result = self.create_order_inner(request).await;

        match &result {
            Ok(order) => info!(
                order_id = order.id,
                user_id,
                side = %order.side,
                price = %order.price,
                quantity = %order.quantity,
                "order accepted"
            ),
            Err(e) => warn!(user_id, error = %e, "order creation rolled back"),
        }

        result
    }

    async fn create_order_inner(&self, request: CreateOrderRequest) -> ExchangeResult<Order> {
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 1. 요청 검증
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        let order = self.validate(request)?;
        let (asset, amount) = order.side.reservation(order.price, order.quantity)?;

        let mut uow = self.store.begin().await?;

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 2. 병합 대상 조회 (주문 행 먼저 잠금)
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        let existing = uow
            .find_open_order(order.user_id, order.side, order.price)
            .await?;

        let merged_quantity = match &existing {
            Some(existing) => {
                let merged = existing.quantity.checked_add(order.quantity).ok_or_else(|| {
                    ExchangeError::MalformedOrder(format!(
                        "merged quantity overflows: {} + {}",
                        existing.quantity, order.quantity
                    ))
                })?;
                order_notional(order.price, merged)?;
                Some(merged)
            }
            None => None,
        };

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 3. 사용자 잠금 + 잔고 잠금
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        uow.lock_user(order.user_id).await?;
        self.locks.reserve(&mut uow, order.user_id, asset, amount).await?;

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 4. 병합 또는 새 주문
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        let saved = match (existing, merged_quantity) {
            (Some(existing), Some(quantity)) => {
                uow.update_order_quantity(existing.id, quantity).await?
            }
            _ => uow.insert_order(order).await?,
        };

        uow.commit().await?;
        Ok(saved)
    }

    fn validate(&self, request: CreateOrderRequest) -> ExchangeResult<OrderCreate> {
        let side: OrderSide = request.side.parse()?;

        match self.symbols.resolve(&request.asset) {
            Some(Asset::Base) => {}
            _ => {
                return Err(ExchangeError::MalformedOrder(format!(
                    "unsupported asset: {} (expected {})",
                    request.asset,
                    self.symbols.base
                )));
            }
        }

        // 뒤쪽 0은 자릿수로 세지 않음 ("10.50" == "10.5")
        let price = request.price.normalize();
        let quantity = request.quantity.normalize();

        if price <= Decimal::ZERO {
            return Err(ExchangeError::MalformedOrder(format!(
                "price must be positive: {}",
                request.price
            )));
        }
        if quantity <= Decimal::ZERO {
            return Err(ExchangeError::MalformedOrder(format!(
                "quantity must be positive: {}",
                request.quantity
            )));
        }
        if price.scale() > MAX_PRICE_SCALE {
            return Err(ExchangeError::MalformedOrder(format!(
                "price has more than {} decimal places: {}",
                MAX_PRICE_SCALE, price
            )));
        }
        if quantity.scale() > MAX_QUANTITY_SCALE {
            return Err(ExchangeError::MalformedOrder(format!(
                "quantity has more than {} decimal places: {}",
                MAX_QUANTITY_SCALE, quantity
            )));
        }
        order_notional(price, quantity)?;

        Ok(OrderCreate {
            user_id: request.user_id,
            side,
            asset: self.symbols.base.clone(),
            price,
            quantity,
        })
    }

    /// 전체 주문 조회
    pub async fn list_orders(&self) -> ExchangeResult<Vec<Order>> {
        let mut uow = self.store.begin().await?;
        let orders = uow.list_orders().await?;
        uow.rollback().await?;
        Ok(orders)
    }

    /// 전체 매칭 조회
    pub async fn list_matches(&self) -> ExchangeResult<Vec<OrderMatch>> {
        let mut uow = self.store.begin().await?;
        let matches = uow.list_matches().await?;
        uow.rollback().await?;
        Ok(matches)
    }
}
