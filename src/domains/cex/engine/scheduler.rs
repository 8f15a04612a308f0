use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::settlement::SettlementCoordinator;
use crate::shared::database::Store;

/// 정산 스케줄러
/// Settlement Scheduler
///
/// 역할:
/// - 고정 주기마다 정산 사이클 실행
/// - API로 활성화/비활성화 제어 가능
///
/// 처리 흐름:
/// 1. start() 시 백그라운드 태스크 실행
/// 2. 틱마다 활성화 상태 확인 후 process_transactions() 호출
/// 3. 사이클이 주기보다 길어지면 밀린 틱은 건너뜀 (Skip)
/// 4. shutdown() 시 루프 종료
pub struct SettlementScheduler<S: Store> {
    coordinator: Arc<SettlementCoordinator<S>>,

    /// 정산 주기
    period: Duration,

    /// 스케줄러 활성화 상태
    enabled: Arc<AtomicBool>,

    /// 종료 신호
    shutdown: CancellationToken,

    /// 실행 중인 태스크 (중복 start 방지)
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<S: Store> SettlementScheduler<S> {
    /// 새 스케줄러 생성
    /// Create new scheduler
    pub fn new(coordinator: Arc<SettlementCoordinator<S>>, period: Duration) -> Self {
        Self {
            coordinator,
            period,
            enabled: Arc::new(AtomicBool::new(true)), // 기본값: 활성화
            shutdown: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// 스케줄러 시작
    /// Start scheduler
    ///
    /// 이미 실행 중이면 아무것도 하지 않습니다.
    pub fn start(&self) {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return;
        }

        let coordinator = self.coordinator.clone();
        let enabled = self.enabled.clone();
        let shutdown = self.shutdown.clone();
        let period = self.period;

        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(period_ms = period.as_millis() as u64, "settlement scheduler started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                // 활성화 상태 확인
                if !enabled.load(Ordering::Relaxed) {
                    continue;
                }

                // 에러는 코디네이터에서 로깅됨. 다음 틱에 다시 시도
                let _ = coordinator.process_transactions().await;
            }

            info!("settlement scheduler stopped");
        }));
    }

    /// 스케줄러 종료 (진행 중인 사이클은 끝까지 실행)
    /// Stop the loop and wait for it to exit
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "settlement scheduler task ended abnormally");
            }
        }
    }

    /// 스케줄러 활성화
    /// Enable scheduler
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// 스케줄러 비활성화
    /// Disable scheduler
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// 스케줄러 상태 조회
    /// Get scheduler status
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }
}
