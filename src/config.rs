// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{ActivityRepository, BusinessRepository, CustomerRepository, JobRepository, UserRepository},
    services::{ActivityService, AuthService, JobService, WorkflowService},
};

const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10 MB

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub max_file_size: usize,
    pub upload_dir: String,

    // O gráfico de serviços montado uma vez na subida
    pub auth_service: AuthService,
    pub job_service: JobService,
    pub workflow_service: WorkflowService,
    pub activity_service: ActivityService,

    // Repositórios usados direto pelos handlers de CRUD simples
    pub user_repo: UserRepository,
    pub business_repo: BusinessRepository,
    pub customer_repo: CustomerRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        let max_file_size = env::var("MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let business_repo = BusinessRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let job_repo = JobRepository::new(db_pool.clone());
        let activity_repo = ActivityRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret.clone(), db_pool.clone());
        let job_service = JobService::new(db_pool.clone(), job_repo.clone());
        let workflow_service = WorkflowService::new(db_pool.clone(), job_repo);
        let activity_service = ActivityService::new(activity_repo);

        Ok(Self {
            db_pool,
            jwt_secret,
            max_file_size,
            upload_dir,
            auth_service,
            job_service,
            workflow_service,
            activity_service,
            user_repo,
            business_repo,
            customer_repo,
        })
    }
}
