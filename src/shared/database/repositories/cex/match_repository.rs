use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use anyhow::{Context, Result};
use chrono::Utc;

use crate::domains::cex::models::order_match::{MatchCreate, MatchStatus, OrderMatch};

/// 매칭 기록 저장소
/// Order match repository
pub struct MatchRepository;

impl MatchRepository {
    /// 매칭 저장 (pending)
    /// Insert a match in pending state
    pub async fn create(conn: &mut PgConnection, m: &MatchCreate) -> Result<OrderMatch> {
        let row = sqlx::query(
            r#"
            INSERT INTO order_matches (buy_order_id, sell_order_id, price, quantity, status, matched_at)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING id, buy_order_id, sell_order_id, price, quantity, status, matched_at, settled_at
            "#,
        )
        .bind(m.buy_order_id as i64)
        .bind(m.sell_order_id as i64)
        .bind(m.price)
        .bind(m.quantity)
        .bind(m.matched_at)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert order match")?;

        Self::row_to_match(&row)
    }

    /// 주문 쌍으로 pending 매칭 조회
    /// Find the pending match for a buy/sell order pair
    pub async fn get_pending(
        conn: &mut PgConnection,
        buy_order_id: u64,
        sell_order_id: u64,
    ) -> Result<Option<OrderMatch>> {
        let row = sqlx::query(
            r#"
            SELECT id, buy_order_id, sell_order_id, price, quantity, status, matched_at, settled_at
            FROM order_matches
            WHERE buy_order_id = $1 AND sell_order_id = $2 AND status = 'pending'
            ORDER BY id ASC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(buy_order_id as i64)
        .bind(sell_order_id as i64)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch pending match")?;

        row.as_ref().map(Self::row_to_match).transpose()
    }

    /// settled로 전환
    /// Returns false when no pending match with that id exists
    pub async fn mark_settled(conn: &mut PgConnection, match_id: u64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE order_matches
            SET status = 'settled', settled_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(match_id as i64)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .context("Failed to retire order match")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn get_all(conn: &mut PgConnection) -> Result<Vec<OrderMatch>> {
        let rows = sqlx::query(
            r#"
            SELECT id, buy_order_id, sell_order_id, price, quantity, status, matched_at, settled_at
            FROM order_matches
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .context("Failed to fetch order matches")?;

        rows.iter().map(Self::row_to_match).collect()
    }

    fn row_to_match(row: &PgRow) -> Result<OrderMatch> {
        let status: String = row.get("status");

        Ok(OrderMatch {
            id: row.get::<i64, _>("id") as u64,
            buy_order_id: row.get::<i64, _>("buy_order_id") as u64,
            sell_order_id: row.get::<i64, _>("sell_order_id") as u64,
            price: row.get("price"),
            quantity: row.get("quantity"),
            status: status.parse::<MatchStatus>()?,
            matched_at: row.get("matched_at"),
            settled_at: row.get("settled_at"),
        })
    }
}
