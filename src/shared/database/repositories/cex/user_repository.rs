use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;

use crate::domains::cex::models::{Asset, User, UserCreate};

/// 사용자 / 잔고 저장소
/// User and available-balance repository
pub struct UserRepository;

impl UserRepository {
    pub async fn create(conn: &mut PgConnection, user: &UserCreate) -> Result<User> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, base_available, quote_available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, email, base_available, quote_available, created_at, updated_at
            "#,
        )
        .bind(&user.email)
        .bind(user.base_available)
        .bind(user.quote_available)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to create user")?;

        Ok(Self::row_to_user(&row))
    }

    pub async fn get_by_id(conn: &mut PgConnection, user_id: u64) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, base_available, quote_available, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id as i64)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch user by id")?;

        Ok(row.as_ref().map(Self::row_to_user))
    }

    /// 사용자 행 잠금 (트랜잭션 종료까지 유지)
    /// Lock the user row until the transaction ends
    pub async fn get_for_update(conn: &mut PgConnection, user_id: u64) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, base_available, quote_available, created_at, updated_at
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id as i64)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to lock user row")?;

        Ok(row.as_ref().map(Self::row_to_user))
    }

    pub async fn get_all(conn: &mut PgConnection) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, base_available, quote_available, created_at, updated_at
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .context("Failed to fetch users")?;

        Ok(rows.iter().map(Self::row_to_user).collect())
    }

    /// 잔고 증가
    /// Increase available balance
    pub async fn increase(
        conn: &mut PgConnection,
        user_id: u64,
        asset: Asset,
        amount: Decimal,
    ) -> Result<Option<User>> {
        let column = asset.balance_column();
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET {column} = {column} + $2, updated_at = $3
            WHERE id = $1
            RETURNING id, email, base_available, quote_available, created_at, updated_at
            "#
        ))
        .bind(user_id as i64)
        .bind(amount)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to increase user balance")?;

        Ok(row.as_ref().map(Self::row_to_user))
    }

    /// 잔고 감소 (잔고가 충분할 때만)
    /// Decrease available balance; None when the row is missing or short
    pub async fn decrease(
        conn: &mut PgConnection,
        user_id: u64,
        asset: Asset,
        amount: Decimal,
    ) -> Result<Option<User>> {
        let column = asset.balance_column();
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET {column} = {column} - $2, updated_at = $3
            WHERE id = $1 AND {column} >= $2
            RETURNING id, email, base_available, quote_available, created_at, updated_at
            "#
        ))
        .bind(user_id as i64)
        .bind(amount)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to decrease user balance")?;

        Ok(row.as_ref().map(Self::row_to_user))
    }

    fn row_to_user(row: &PgRow) -> User {
        User {
            id: row.get::<i64, _>("id") as u64,
            email: row.get("email"),
            base_available: row.get("base_available"),
            quote_available: row.get("quote_available"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}
