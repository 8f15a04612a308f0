// =====================================================
// SettlementCoordinator - 정산 코디네이터
// =====================================================
// 역할: 매칭 + 잔고 이동 + 주문/매칭 저장을 하나의 트랜잭션으로 실행
//
// 처리 흐름 (process_transactions):
// 1. 미체결 매수/매도 주문 조회 (행 잠금)
// 2. Matcher 실행 (순수 함수)
// 3. 바뀐 주문 일괄 저장
// 4. 매칭 저장 (pending)
// 5. 매칭마다: 잔고 credit + 잠금 settle + retire
// 6. 커밋
//
// 실패 처리:
// - 어느 단계든 에러/패닉이면 UnitOfWork가 drop되어 전체 롤백
// - 재시도 없음. 다음 주기에 저장된 상태에서 다시 계산
//
// 동시 실행 방지:
// - running 뮤텍스로 스케줄러 틱과 수동 실행이 겹치지 않음
// =====================================================

use std::panic::AssertUnwindSafe;

use chrono::Utc;
use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use utoipa::ToSchema;

use super::lock_manager::LockManager;
use super::matcher::Matcher;
use crate::domains::cex::models::{Asset, MatchStatus, OrderMatch};
use crate::shared::database::{BalanceLedger, OrderStore, Store, UnitOfWork};
use crate::shared::errors::{ExchangeError, ExchangeResult};

/// 정산 사이클 결과
/// Result of one settlement cycle
#[derive(Debug, Clone, Default, Serialize, ToSchema, PartialEq)]
pub struct SettlementReport {
    /// 이번 사이클에서 정산된 매칭
    pub matches: Vec<OrderMatch>,
    /// 수량/상태가 바뀐 주문 수
    pub updated_orders: usize,
}

/// 정산 코디네이터
/// Settlement coordinator
pub struct SettlementCoordinator<S: Store> {
    store: S,
    matcher: Matcher,
    locks: LockManager,
    /// 비재진입 가드
    running: Mutex<()>,
}

impl<S: Store> SettlementCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            matcher: Matcher::new(),
            locks: LockManager::new(),
            running: Mutex::new(()),
        }
    }

    /// 정산 한 사이클 실행
    /// Run one settlement cycle
    ///
    /// 동시에 호출되면 앞선 사이클이 끝날 때까지 대기합니다.
    pub async fn process_transactions(&self) -> ExchangeResult<SettlementReport> {
        let _running = self.running.lock().await;

        let result = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(ExchangeError::SettlementPanicked(panic_message(panic.as_ref()))),
        };

        match &result {
            Ok(report) if !report.matches.is_empty() => {
                info!(
                    matches = report.matches.len(),
                    updated_orders = report.updated_orders,
                    "settlement cycle committed"
                );
            }
            Ok(_) => debug!("settlement cycle found nothing to cross"),
            Err(e @ ExchangeError::InsufficientReservation { .. }) => {
                error!(error = %e, "reservation accounting mismatch, settlement cycle rolled back");
            }
            Err(e) => error!(error = %e, "settlement cycle rolled back"),
        }

        result
    }

    async fn run_cycle(&self) -> ExchangeResult<SettlementReport> {
        let mut uow = self.store.begin().await?;

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 1. 미체결 주문 조회
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        let buy_orders = uow.load_open_buy_orders().await?;
        let sell_orders = uow.load_open_sell_orders().await?;

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 2. 매칭
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        let outcome = self.matcher.match_orders(buy_orders, sell_orders, Utc::now());
        if outcome.is_empty() {
            uow.rollback().await?;
            return Ok(SettlementReport::default());
        }

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 3. 주문 / 매칭 저장
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        uow.bulk_update_orders(&outcome.updated_orders).await?;
        let saved = uow.insert_matches(&outcome.matches).await?;

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 4. 매칭별 잔고 / 잠금 반영
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        let mut settled = Vec::with_capacity(saved.len());
        for m in saved {
            if let Some(m) = self.settle_match(&mut uow, m).await? {
                settled.push(m);
            }
        }

        uow.commit().await?;

        Ok(SettlementReport {
            matches: settled,
            updated_orders: outcome.updated_orders.len(),
        })
    }

    /// 매칭 하나 정산
    ///
    /// pending 매칭이 없으면 (이미 정산됨) None
    async fn settle_match(
        &self,
        uow: &mut S::Uow,
        m: OrderMatch,
    ) -> ExchangeResult<Option<OrderMatch>> {
        // 이미 settled면 건너뜀
        let Some(pending) = uow.find_match(m.buy_order_id, m.sell_order_id).await? else {
            debug!(match_id = m.id, "match already settled, skipping");
            return Ok(None);
        };

        let buy = uow
            .find_order(pending.buy_order_id)
            .await?
            .ok_or(ExchangeError::OrderNotFound { id: pending.buy_order_id })?;
        let sell = uow
            .find_order(pending.sell_order_id)
            .await?
            .ok_or(ExchangeError::OrderNotFound { id: pending.sell_order_id })?;

        let buyer = uow.lock_user(buy.user_id).await?;
        let seller = uow.lock_user(sell.user_id).await?;

        let quantity = pending.quantity;
        let notional = pending.notional();

        // 매수자: 기준 자산 받음, 호가 자산 잠금 소비
        uow.credit(buyer.id, Asset::Base, quantity).await?;
        self.locks.settle(uow, buyer.id, Asset::Quote, notional).await?;

        // 매도자: 호가 자산 받음, 기준 자산 잠금 소비
        uow.credit(seller.id, Asset::Quote, notional).await?;
        self.locks.settle(uow, seller.id, Asset::Base, quantity).await?;

        uow.retire_match(pending.id).await?;

        debug!(
            match_id = pending.id,
            buyer = buyer.id,
            seller = seller.id,
            %quantity,
            price = %pending.price,
            "match settled"
        );

        Ok(Some(OrderMatch {
            status: MatchStatus::Settled,
            settled_at: Some(Utc::now()),
            ..pending
        }))
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
