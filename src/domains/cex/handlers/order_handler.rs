// CEX Order Handler
// 거래소 주문 핸들러
// 역할: 주문 생성/조회 API 엔드포인트 처리

use axum::{extract::State, http::StatusCode, Json};

use crate::domains::cex::models::{
    CreateOrderRequest, MatchesResponse, OrderResponse, OrdersResponse,
};
use crate::shared::services::AppState;

use super::ApiError;

/// 주문 생성 핸들러
/// Create order
///
/// 경로: POST /api/cex/orders
///
/// 잔고를 잠그고 주문을 오더북에 올립니다.
/// 같은 가격/방향의 미체결 주문이 있으면 수량이 합쳐집니다.
///
/// # Returns
/// * `201 Created` - 오더북에 올라간 주문
/// * `400 Bad Request` - 잘못된 방향/자산/가격/수량
/// * `404 Not Found` - 사용자 없음
/// * `422 Unprocessable Entity` - 잔고 부족
#[utoipa::path(
    post,
    path = "/api/cex/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order accepted", body = OrderResponse),
        (status = 400, description = "Malformed order"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Insufficient balance"),
        (status = 500, description = "Internal server error")
    ),
    tag = "CEX Orders"
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = app_state
        .cex_state
        .order_service
        .create_order(request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            order,
            message: "Order created successfully".to_string(),
        }),
    ))
}

/// 전체 주문 조회
/// List orders
#[utoipa::path(
    get,
    path = "/api/cex/orders",
    responses(
        (status = 200, description = "Orders retrieved successfully", body = OrdersResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "CEX Orders"
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
) -> Result<Json<OrdersResponse>, ApiError> {
    let orders = app_state.cex_state.order_service.list_orders().await?;
    Ok(Json(OrdersResponse { orders }))
}

/// 전체 매칭 조회
/// List matches
#[utoipa::path(
    get,
    path = "/api/cex/matches",
    responses(
        (status = 200, description = "Matches retrieved successfully", body = MatchesResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "CEX Orders"
)]
pub async fn list_matches(
    State(app_state): State<AppState>,
) -> Result<Json<MatchesResponse>, ApiError> {
    let matches = app_state.cex_state.order_service.list_matches().await?;
    Ok(Json(MatchesResponse { matches }))
}
