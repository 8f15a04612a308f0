// CEX Settlement Handler
// 정산 수동 실행 핸들러

use axum::{extract::State, Json};

use crate::domains::cex::engine::SettlementReport;
use crate::shared::services::AppState;

use super::ApiError;

/// 정산 사이클 수동 실행
/// Run one settlement cycle now
///
/// 경로: POST /api/cex/settlement/run
///
/// 스케줄러와 같은 코디네이터를 사용하므로 진행 중인 사이클이 있으면
/// 끝날 때까지 기다린 뒤 실행합니다.
#[utoipa::path(
    post,
    path = "/api/cex/settlement/run",
    responses(
        (status = 200, description = "Settlement cycle committed", body = SettlementReport),
        (status = 500, description = "Settlement cycle rolled back")
    ),
    tag = "CEX Settlement"
)]
pub async fn run_settlement(
    State(app_state): State<AppState>,
) -> Result<Json<SettlementReport>, ApiError> {
    let report = app_state
        .cex_state
        .coordinator
        .process_transactions()
        .await?;

    Ok(Json(report))
}
