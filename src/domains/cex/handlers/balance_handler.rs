// CEX Balance Handler
// 거래소 사용자/잔고 핸들러
// 역할: 사용자 생성, 입금, 잔고 조회 API 엔드포인트 처리

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::domains::cex::models::{
    CreateUserRequest, DepositRequest, User, UserBalanceResponse, UsersResponse,
};
use crate::shared::services::AppState;

use super::ApiError;

/// 사용자 생성 핸들러
/// Create user
///
/// 경로: POST /api/cex/users
#[utoipa::path(
    post,
    path = "/api/cex/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid email or balance"),
        (status = 500, description = "Internal server error")
    ),
    tag = "CEX Users"
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = app_state
        .cex_state
        .balance_service
        .create_user(request)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// 전체 사용자 조회
#[utoipa::path(
    get,
    path = "/api/cex/users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = UsersResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "CEX Users"
)]
pub async fn list_users(
    State(app_state): State<AppState>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = app_state.cex_state.balance_service.list_users().await?;
    Ok(Json(UsersResponse { users }))
}

/// 사용자 잔고 조회 핸들러
/// Get balance for one user
///
/// 경로: GET /api/cex/users/{user_id}/balance
///
/// # Returns
/// * `200 OK` - 자산별 available / reserved / total
/// * `404 Not Found` - 사용자 없음
#[utoipa::path(
    get,
    path = "/api/cex/users/{user_id}/balance",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Balance retrieved successfully", body = UserBalanceResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "CEX Users"
)]
pub async fn get_balance(
    State(app_state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserBalanceResponse>, ApiError> {
    let balance = app_state
        .cex_state
        .balance_service
        .get_balance(user_id)
        .await?;

    Ok(Json(balance))
}

/// 입금 핸들러
/// Deposit into available balance
///
/// 경로: POST /api/cex/users/{user_id}/deposits
#[utoipa::path(
    post,
    path = "/api/cex/users/{user_id}/deposits",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Deposit applied", body = UserBalanceResponse),
        (status = 400, description = "Invalid asset or amount"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "CEX Users"
)]
pub async fn deposit(
    State(app_state): State<AppState>,
    Path(user_id): Path<u64>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<UserBalanceResponse>, ApiError> {
    let balance = app_state
        .cex_state
        .balance_service
        .deposit(user_id, request)
        .await?;

    Ok(Json(balance))
}
