use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;

use crate::domains::cex::models::order::{Order, OrderCreate, OrderSide, OrderStatus};

const ORDER_COLUMNS: &str = "id, user_id, side, asset, price, quantity, status, \
                             created_at, updated_at, completed_at, deleted_at";

/// 주문 저장소 (트랜잭션 연결을 인자로 받음)
/// Order repository; every call runs on the caller's transaction
pub struct OrderRepository;

impl OrderRepository {
    /// 주문 생성
    /// Create order
    pub async fn create(conn: &mut PgConnection, order_create: &OrderCreate) -> Result<Order> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (user_id, side, asset, price, quantity, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'open', $6, $6)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_create.user_id as i64)
        .bind(order_create.side.as_str())
        .bind(&order_create.asset)
        .bind(order_create.price)
        .bind(order_create.quantity)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to create order")?;

        Self::row_to_order(&row)
    }

    /// 주문 ID로 조회
    /// Get order by ID
    pub async fn get_by_id(conn: &mut PgConnection, order_id: u64) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(order_id as i64)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to fetch order by id")?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    /// 미체결 주문 조회 (행 잠금)
    /// Load open orders of one side in priority order, locking the rows
    ///
    /// - buy: 가격 높은 순
    /// - sell: 가격 낮은 순
    /// - 같은 가격: created_at → id 오름차순
    pub async fn get_open_for_update(conn: &mut PgConnection, side: OrderSide) -> Result<Vec<Order>> {
        let price_order = match side {
            OrderSide::Buy => "DESC",
            OrderSide::Sell => "ASC",
        };

        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE side = $1
              AND status = 'open'
              AND deleted_at IS NULL
              AND quantity > 0
            ORDER BY price {price_order}, created_at ASC, id ASC
            FOR UPDATE
            "#
        ))
        .bind(side.as_str())
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load open orders")?;

        rows.iter().map(Self::row_to_order).collect()
    }

    /// 같은 사용자/방향/가격의 미체결 주문 (병합 대상)
    pub async fn get_open_by_price(
        conn: &mut PgConnection,
        user_id: u64,
        side: OrderSide,
        price: Decimal,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE user_id = $1 AND side = $2 AND price = $3
              AND status = 'open' AND deleted_at IS NULL
            ORDER BY id ASC
            LIMIT 1
            FOR UPDATE
            "#
        ))
        .bind(user_id as i64)
        .bind(side.as_str())
        .bind(price)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch open order by price")?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    /// 주문 수량 변경
    pub async fn update_quantity(
        conn: &mut PgConnection,
        order_id: u64,
        quantity: Decimal,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET quantity = $2, updated_at = $3
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id as i64)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to update order quantity")?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    /// 체결 결과 반영 (quantity / status / completed_at)
    /// Returns false when the order row does not exist
    pub async fn update_fill(conn: &mut PgConnection, order: &Order) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET quantity = $2, status = $3, completed_at = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id as i64)
        .bind(order.quantity)
        .bind(order.status.as_str())
        .bind(order.completed_at)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .context("Failed to update order fill")?;

        Ok(result.rows_affected() == 1)
    }

    /// 전체 주문 조회
    pub async fn get_all(conn: &mut PgConnection) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id ASC"))
            .fetch_all(&mut *conn)
            .await
            .context("Failed to fetch orders")?;

        rows.iter().map(Self::row_to_order).collect()
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let side: String = row.get("side");
        let status: String = row.get("status");

        Ok(Order {
            id: row.get::<i64, _>("id") as u64,
            user_id: row.get::<i64, _>("user_id") as u64,
            side: side.parse::<OrderSide>()?,
            asset: row.get("asset"),
            price: row.get("price"),
            quantity: row.get("quantity"),
            status: status.parse::<OrderStatus>()?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            completed_at: row.get("completed_at"),
            deleted_at: row.get("deleted_at"),
        })
    }
}
