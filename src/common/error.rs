use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::workflow::WorkflowError;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Regras de negócio do workflow (gates de etapa, depósito, agendamento).
    // Viram 422 com um `code` estável para o frontend tratar.
    #[error("Regra de workflow violada: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário desativado")]
    UserInactive,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Job já possui responsável")]
    JobAlreadyAssigned,

    #[error("Arquivo recusado: {0}")]
    UploadRejected(String),

    // Variante para erros de banco de dados (exemplo com sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            // Gates do workflow: 422 + código estável
            AppError::Workflow(rule) => {
                let body = Json(json!({
                    "error": rule.to_string(),
                    "code": rule.code(),
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está em uso."),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos."),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente."),
            AppError::UserInactive => (StatusCode::UNAUTHORIZED, "Usuário desativado."),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "Usuário não encontrado."),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Você não tem permissão para acessar este recurso."),
            AppError::JobAlreadyAssigned => (StatusCode::CONFLICT, "Este job já possui um responsável."),
            AppError::ResourceNotFound(ref what) => {
                let body = Json(json!({ "error": format!("{} não encontrado.", what) }));
                return (StatusCode::NOT_FOUND, body).into_response();
            }
            AppError::UploadRejected(ref reason) => {
                let body = Json(json!({ "error": reason }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // A mensagem detalhada fica só no log; o cliente recebe texto genérico.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
