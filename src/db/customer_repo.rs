// src/db/customer_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::customers::Customer};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        full_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        mobile: Option<&str>,
        address: Option<&Value>,
        notes: Option<&str>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (business_id, full_name, email, phone, mobile, address, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
            .bind(business_id)
            .bind(full_name)
            .bind(email)
            .bind(phone)
            .bind(mobile)
            .bind(address)
            .bind(notes)
            .fetch_one(executor)
            .await?;

        Ok(customer)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let maybe = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    // Listagem sempre recortada pela empresa; admin passa None e vê tudo.
    pub async fn list(&self, business_id: Option<Uuid>) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE ($1::uuid IS NULL OR business_id = $1)
            ORDER BY full_name ASC
            "#,
        )
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        mobile: Option<&str>,
        address: Option<&Value>,
        notes: Option<&str>,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                full_name = COALESCE($2, full_name),
                email     = COALESCE($3, email),
                phone     = COALESCE($4, phone),
                mobile    = COALESCE($5, mobile),
                address   = COALESCE($6, address),
                notes     = COALESCE($7, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(full_name)
            .bind(email)
            .bind(phone)
            .bind(mobile)
            .bind(address)
            .bind(notes)
            .fetch_optional(executor)
            .await?;

        Ok(updated)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
