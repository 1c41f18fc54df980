// src/middleware/meta.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

// Extrator dos metadados da requisição gravados no activity_log.
// Nunca falha: cabeçalho ausente vira None.
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        // Atrás de proxy o IP real vem no X-Forwarded-For (primeiro da lista)
        let ip = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|list| list.split(',').next())
            .map(|ip| ip.trim().to_string());

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(|ua| ua.to_string());

        Ok(RequestMeta { ip, user_agent })
    }
}
