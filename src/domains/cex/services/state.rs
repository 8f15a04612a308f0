// CEX domain state
// CEX 도메인 상태
use std::sync::Arc;
use std::time::Duration;

use crate::domains::cex::engine::{SettlementCoordinator, SettlementScheduler};
use crate::domains::cex::models::AssetSymbols;
use crate::domains::cex::services::{BalanceService, OrderService};
use crate::shared::database::{PgStore, Store};

/// CEX domain state
/// CEX 도메인에서 필요한 서비스들을 포함하는 상태
///
/// 코디네이터는 하나만 존재하고 스케줄러와 수동 실행 API가 공유합니다.
pub struct CexState<S: Store = PgStore> {
    pub order_service: OrderService<S>,
    pub balance_service: BalanceService<S>,
    pub coordinator: Arc<SettlementCoordinator<S>>,
    pub scheduler: Arc<SettlementScheduler<S>>,
}

impl<S: Store + Clone> Clone for CexState<S> {
    fn clone(&self) -> Self {
        Self {
            order_service: self.order_service.clone(),
            balance_service: self.balance_service.clone(),
            coordinator: self.coordinator.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<S: Store + Clone> CexState<S> {
    /// Create CexState with a store
    /// CexState 생성 (스케줄러는 아직 시작하지 않음)
    pub fn new(store: S, symbols: AssetSymbols, settlement_interval: Duration) -> Self {
        let coordinator = Arc::new(SettlementCoordinator::new(store.clone()));
        let scheduler = Arc::new(SettlementScheduler::new(
            coordinator.clone(),
            settlement_interval,
        ));

        Self {
            order_service: OrderService::new(store.clone(), symbols.clone()),
            balance_service: BalanceService::new(store, symbols),
            coordinator,
            scheduler,
        }
    }
}
