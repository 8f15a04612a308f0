use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use exchange_server::domains::cex::engine::SettlementReport;
use exchange_server::domains::cex::models::*;
use exchange_server::routes::create_router;
use exchange_server::shared::config::Settings;
use exchange_server::shared::database::Database;
use exchange_server::shared::services::AppState;

// OpenAPI 스키마 정의: Swagger 문서 자동 생성
#[derive(OpenApi)]
#[openapi(
    paths(
        exchange_server::domains::cex::handlers::order_handler::create_order,
        exchange_server::domains::cex::handlers::order_handler::list_orders,
        exchange_server::domains::cex::handlers::order_handler::list_matches,
        exchange_server::domains::cex::handlers::balance_handler::create_user,
        exchange_server::domains::cex::handlers::balance_handler::list_users,
        exchange_server::domains::cex::handlers::balance_handler::get_balance,
        exchange_server::domains::cex::handlers::balance_handler::deposit,
        exchange_server::domains::cex::handlers::settlement_handler::run_settlement
    ),
    components(schemas(
        Asset,
        OrderSide,
        OrderStatus,
        Order,
        CreateOrderRequest,
        OrderResponse,
        OrdersResponse,
        MatchStatus,
        OrderMatch,
        MatchesResponse,
        User,
        CreateUserRequest,
        DepositRequest,
        AssetBalance,
        UserBalanceResponse,
        UsersResponse,
        SettlementReport
    )),
    tags(
        (name = "CEX Orders", description = "Order placement and match history"),
        (name = "CEX Users", description = "Users, deposits and balances"),
        (name = "CEX Settlement", description = "Batch settlement trigger")
    ),
    info(
        title = "Exchange API Server",
        description = "Spot exchange with price-time priority matching and periodic settlement",
        version = "1.0.0"
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    // 로깅 (RUST_LOG, 기본값 info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load().context("Failed to load settings")?;

    // DB 연결
    let db = Database::new(&settings.database_url).await?;
    if settings.run_migrations {
        db.initialize().await?;
    }

    // AppState 생성 (모든 Service 초기화)
    let app_state = AppState::new(db, &settings)?;
    app_state.start_settlement();

    // CORS 설정
    let cors = CorsLayer::new()
        .allow_origin(
            settings
                .cors_origin
                .parse::<HeaderValue>()
                .context("Invalid cors_origin")?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    // Router 생성
    let app = Router::new()
        .merge(create_router())
        .merge(SwaggerUi::new("/api").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(app_state.clone());

    let listener = TcpListener::bind(&settings.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.listen_addr))?;

    info!(addr = %settings.listen_addr, "server running");
    info!("Swagger UI available at /api");

    // 서버 실행 (Ctrl+C로 종료)
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;

    app_state.shutdown().await;
    info!("server stopped");
    Ok(())
}
