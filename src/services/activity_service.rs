// src/services/activity_service.rs

use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError, db::ActivityRepository, middleware::meta::RequestMeta,
    models::activity::ActivityLog,
};

// Log de atividade em fire-and-forget: a gravação roda numa task
// separada e falha de banco NUNCA derruba a requisição que a originou.
#[derive(Clone)]
pub struct ActivityService {
    repo: ActivityRepository,
}

impl ActivityService {
    pub fn new(repo: ActivityRepository) -> Self {
        Self { repo }
    }

    pub fn log(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        target_type: &str,
        target_id: Option<String>,
        details: Option<Value>,
        meta: &RequestMeta,
    ) {
        let repo = self.repo.clone();
        let action = action.to_string();
        let target_type = target_type.to_string();
        let ip = meta.ip.clone();
        let user_agent = meta.user_agent.clone();

        tokio::spawn(async move {
            if let Err(e) = repo
                .insert(
                    user_id,
                    &action,
                    &target_type,
                    target_id.as_deref(),
                    details,
                    ip.as_deref(),
                    user_agent.as_deref(),
                )
                .await
            {
                // Engolida de propósito: auditoria não pode travar a operação
                tracing::warn!("Falha ao gravar activity_log ({}): {}", action, e);
            }
        });
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ActivityLog>, AppError> {
        self.repo.list_recent(limit).await
    }
}
