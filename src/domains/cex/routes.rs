use axum::{
    routing::{get, post},
    Router,
};
use crate::shared::services::AppState;

use super::handlers;

/// CEX 라우터 생성
/// Create CEX router
///
/// # Routes
///
/// ## Orders (주문)
/// - `POST   /api/cex/orders` - 주문 생성
/// - `GET    /api/cex/orders` - 주문 목록
/// - `GET    /api/cex/matches` - 매칭 목록
///
/// ## Users (사용자 / 잔고)
/// - `POST   /api/cex/users` - 사용자 생성
/// - `GET    /api/cex/users` - 사용자 목록
/// - `GET    /api/cex/users/:user_id/balance` - 잔고 조회
/// - `POST   /api/cex/users/:user_id/deposits` - 입금
///
/// ## Settlement (정산)
/// - `POST   /api/cex/settlement/run` - 정산 사이클 수동 실행
pub fn create_cex_router() -> Router<AppState> {
    Router::new()
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // Orders (주문)
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        .route("/orders", post(handlers::create_order).get(handlers::list_orders))
        .route("/matches", get(handlers::list_matches))

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // Users (사용자 / 잔고)
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        .route("/users", post(handlers::create_user).get(handlers::list_users))
        .route("/users/:user_id/balance", get(handlers::get_balance))
        .route("/users/:user_id/deposits", post(handlers::deposit))

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // Settlement (정산)
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        .route("/settlement/run", post(handlers::run_settlement))
}
