use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;

use crate::domains::cex::models::{Asset, Reservation};

/// 잔고 잠금 저장소
/// Reservation (lock) repository
pub struct ReservationRepository;

impl ReservationRepository {
    pub async fn create(
        conn: &mut PgConnection,
        user_id: u64,
        asset: Asset,
        amount: Decimal,
    ) -> Result<Reservation> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO reservations (user_id, asset, amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, user_id, asset, amount, created_at, updated_at
            "#,
        )
        .bind(user_id as i64)
        .bind(asset.as_str())
        .bind(amount)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to create reservation")?;

        Self::row_to_reservation(&row)
    }

    /// 오래된 순서로 조회 (행 잠금)
    pub async fn get_for_update(
        conn: &mut PgConnection,
        user_id: u64,
        asset: Asset,
    ) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, asset, amount, created_at, updated_at
            FROM reservations
            WHERE user_id = $1 AND asset = $2
            ORDER BY created_at ASC, id ASC
            FOR UPDATE
            "#,
        )
        .bind(user_id as i64)
        .bind(asset.as_str())
        .fetch_all(&mut *conn)
        .await
        .context("Failed to fetch reservations")?;

        rows.iter().map(Self::row_to_reservation).collect()
    }

    pub async fn update_amount(conn: &mut PgConnection, id: u64, amount: Decimal) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET amount = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id as i64)
        .bind(amount)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .context("Failed to update reservation amount")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(conn: &mut PgConnection, id: u64) -> Result<()> {
        sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id as i64)
            .execute(&mut *conn)
            .await
            .context("Failed to delete reservation")?;

        Ok(())
    }

    /// 잠긴 금액 합계 (없으면 0)
    pub async fn sum(conn: &mut PgConnection, user_id: u64, asset: Asset) -> Result<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM reservations
            WHERE user_id = $1 AND asset = $2
            "#,
        )
        .bind(user_id as i64)
        .bind(asset.as_str())
        .fetch_one(&mut *conn)
        .await
        .context("Failed to sum reservations")?;

        Ok(total)
    }

    fn row_to_reservation(row: &PgRow) -> Result<Reservation> {
        let asset: String = row.get("asset");

        Ok(Reservation {
            id: row.get::<i64, _>("id") as u64,
            user_id: row.get::<i64, _>("user_id") as u64,
            asset: asset.parse::<Asset>()?,
            amount: row.get("amount"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
