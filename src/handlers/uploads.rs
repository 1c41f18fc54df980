// src/handlers/uploads.rs

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, meta::RequestMeta},
};

// Allow-list de extensões e mimetypes aceitos nos uploads
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "pdf"];
const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[schema(example = "/uploads/550e8400-e29b-41d4-a716-446655440000.jpg")]
    pub url: String,
    #[schema(example = "janela-sala.jpg")]
    pub original_name: String,
    pub size: usize,
}

// Valida um campo multipart e grava no diretório de uploads com nome
// novo (uuid), preservando só a extensão.
async fn save_field(
    field: axum::extract::multipart::Field<'_>,
    max_file_size: usize,
    upload_dir: &str,
) -> Result<UploadedFile, AppError> {
    let original_name = field
        .file_name()
        .map(|n| n.to_string())
        .ok_or_else(|| AppError::UploadRejected("Campo sem nome de arquivo.".to_string()))?;

    let extension = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            AppError::UploadRejected(format!(
                "Extensão não permitida (aceitas: {}).",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

    if let Some(content_type) = field.content_type() {
        if !ALLOWED_MIME_TYPES.contains(&content_type) {
            return Err(AppError::UploadRejected(format!(
                "Tipo de conteúdo não permitido: {}.",
                content_type
            )));
        }
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::UploadRejected(format!("Falha ao ler o arquivo: {}", e)))?;

    if data.len() > max_file_size {
        return Err(AppError::UploadRejected(format!(
            "Arquivo acima do limite de {} bytes.",
            max_file_size
        )));
    }

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao criar diretório de uploads: {}", e))?;
    tokio::fs::write(format!("{}/{}", upload_dir, file_name), &data)
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao gravar upload: {}", e))?;

    Ok(UploadedFile {
        url: format!("/uploads/{}", file_name),
        original_name,
        size: data.len(),
    })
}

// POST /api/uploads/single
#[utoipa::path(
    post,
    path = "/api/uploads/single",
    tag = "Uploads",
    responses(
        (status = 201, description = "Arquivo gravado", body = UploadedFile),
        (status = 400, description = "Extensão, tipo ou tamanho recusado")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_single(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::UploadRejected(format!("Multipart inválido: {}", e)))?
    {
        if field.file_name().is_none() {
            continue;
        }

        let saved = save_field(field, app_state.max_file_size, &app_state.upload_dir).await?;

        app_state.activity_service.log(
            Some(user.0.id),
            "upload.single",
            "file",
            Some(saved.url.clone()),
            None,
            &meta,
        );

        return Ok((StatusCode::CREATED, Json(saved)));
    }

    Err(AppError::UploadRejected("Nenhum arquivo enviado.".to_string()))
}

// POST /api/uploads/multiple
#[utoipa::path(
    post,
    path = "/api/uploads/multiple",
    tag = "Uploads",
    responses(
        (status = 201, description = "Arquivos gravados", body = [UploadedFile]),
        (status = 400, description = "Algum arquivo recusado (nenhum é gravado parcialmente na resposta de erro)")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_multiple(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut saved_files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::UploadRejected(format!("Multipart inválido: {}", e)))?
    {
        if field.file_name().is_none() {
            continue;
        }
        saved_files.push(save_field(field, app_state.max_file_size, &app_state.upload_dir).await?);
    }

    if saved_files.is_empty() {
        return Err(AppError::UploadRejected("Nenhum arquivo enviado.".to_string()));
    }

    app_state.activity_service.log(
        Some(user.0.id),
        "upload.multiple",
        "file",
        None,
        Some(serde_json::json!({ "count": saved_files.len() })),
        &meta,
    );

    Ok((StatusCode::CREATED, Json(saved_files)))
}
