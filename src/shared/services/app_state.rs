use anyhow::Result;

use crate::domains::cex::services::state::CexState;
use crate::shared::config::Settings;
use crate::shared::database::{Database, PgStore};

/// Application state (combines all domain states)
/// 애플리케이션 상태 (모든 도메인 상태를 조합)
#[derive(Clone)]
pub struct AppState {
    /// 데이터베이스 연결 (공유)
    /// Database connection (shared)
    pub db: Database,
    pub cex_state: CexState<PgStore>,
}

impl AppState {
    /// Create AppState with database
    /// 도메인 State를 초기화하고 조합
    pub fn new(db: Database, settings: &Settings) -> Result<Self> {
        let store = PgStore::new(db.clone());
        let cex_state = CexState::new(
            store,
            settings.asset_symbols(),
            settings.settlement_interval(),
        );

        Ok(Self { db, cex_state })
    }

    /// 정산 스케줄러 시작
    /// Start the settlement scheduler
    pub fn start_settlement(&self) {
        self.cex_state.scheduler.start();
    }

    /// 정산 스케줄러 종료 (graceful shutdown)
    pub async fn shutdown(&self) {
        self.cex_state.scheduler.shutdown().await;
    }
}
