// src/db/business_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::business::Business};

#[derive(Clone)]
pub struct BusinessRepository {
    pool: PgPool,
}

impl BusinessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        pix_key: Option<&str>,
        address: Option<&str>,
    ) -> Result<Business, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let business = sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses (name, email, phone, pix_key, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(name)
            .bind(email)
            .bind(phone)
            .bind(pix_key)
            .bind(address)
            .fetch_one(executor)
            .await?;

        Ok(business)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Business>, AppError> {
        let maybe = sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    pub async fn list_all(&self) -> Result<Vec<Business>, AppError> {
        let all = sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses ORDER BY created_at DESC",
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(all)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        pix_key: Option<&str>,
        address: Option<&str>,
    ) -> Result<Option<Business>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Atualização parcial: campo ausente mantém o valor atual
        let updated = sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses SET
                name     = COALESCE($2, name),
                email    = COALESCE($3, email),
                phone    = COALESCE($4, phone),
                pix_key  = COALESCE($5, pix_key),
                address  = COALESCE($6, address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(name)
            .bind(email)
            .bind(phone)
            .bind(pix_key)
            .bind(address)
            .fetch_optional(executor)
            .await?;

        Ok(updated)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM businesses WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
