// src/db/activity_repo.rs

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::activity::ActivityLog};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        target_type: &str,
        target_id: Option<&str>,
        details: Option<Value>,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (user_id, action, target_type, target_id, details, ip, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
            .bind(user_id)
            .bind(action)
            .bind(target_type)
            .bind(target_id)
            .bind(details)
            .bind(ip)
            .bind(user_agent)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ActivityLog>, AppError> {
        let logs = sqlx::query_as::<_, ActivityLog>(
            "SELECT * FROM activity_logs ORDER BY id DESC LIMIT $1",
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(logs)
    }
}
