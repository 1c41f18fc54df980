// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// --- Enums ---

// Papel do usuário: decide o escopo de visão sobre os jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Business,
    Employee,
}

// --- Structs ---

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "maria@persianas.com.br")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(example = "Maria Souza")]
    pub name: String,
    pub role: UserRole,
    // ADMIN não pertence a empresa nenhuma
    pub business_id: Option<Uuid>,
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Escopo de listagem derivado do papel do usuário:
// admin vê tudo; business vê a própria empresa; employee vê a empresa
// a que pertence (ou jobs atribuídos a ele).
#[derive(Debug, Clone, Copy)]
pub enum JobScope {
    Admin,
    Business(Uuid),
    Employee { business_id: Uuid, employee_id: Uuid },
}

impl JobScope {
    pub fn for_user(user: &User) -> Result<Self, AppError> {
        match user.role {
            UserRole::Admin => Ok(JobScope::Admin),
            UserRole::Business => {
                let business_id = user.business_id.ok_or(AppError::Forbidden)?;
                Ok(JobScope::Business(business_id))
            }
            UserRole::Employee => {
                let business_id = user.business_id.ok_or(AppError::Forbidden)?;
                Ok(JobScope::Employee { business_id, employee_id: user.id })
            }
        }
    }

    // Checa se o escopo alcança uma empresa específica (para CRUD pontual).
    pub fn can_access_business(&self, business_id: Uuid) -> bool {
        match self {
            JobScope::Admin => true,
            JobScope::Business(own) => *own == business_id,
            JobScope::Employee { business_id: own, .. } => *own == business_id,
        }
    }
}

// Dados para registro de um novo usuário (apenas admin cria contas)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub role: UserRole,
    pub business_id: Option<Uuid>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
