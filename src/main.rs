//src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rota pública de autenticação
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login));

    // Rotas de autenticação protegidas (registro é só para admin)
    let auth_protected_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let business_routes = Router::new()
        .route("/"
               ,post(handlers::businesses::create_business)
               .get(handlers::businesses::list_businesses)
        )
        .route("/{id}"
               ,get(handlers::businesses::get_business)
               .put(handlers::businesses::update_business)
               .delete(handlers::businesses::delete_business)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let customer_routes = Router::new()
        .route("/"
               ,post(handlers::customers::create_customer)
               .get(handlers::customers::list_customers)
        )
        .route("/{id}"
               ,get(handlers::customers::get_customer)
               .put(handlers::customers::update_customer)
               .delete(handlers::customers::delete_customer)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let job_routes = Router::new()
        // CRUD
        .route("/"
               ,post(handlers::jobs::create_job)
               .get(handlers::jobs::list_jobs)
        )
        // As rotas estáticas vêm antes das dinâmicas
        .route("/unassigned", get(handlers::jobs::list_unassigned))
        .route("/pending-scheduling", get(handlers::workflow::list_pending_scheduling))
        .route("/{id}"
               ,get(handlers::jobs::get_job)
               .put(handlers::jobs::update_job)
               .delete(handlers::jobs::delete_job)
        )
        .route("/{id}/history", get(handlers::jobs::job_history))
        .route("/{id}/assign", post(handlers::jobs::assign_job))
        // Decisão de depósito no fim da medição
        .route("/{id}/deposit"
               ,get(handlers::workflow::deposit_summary)
               .post(handlers::workflow::record_deposit)
        )
        .route("/{id}/deposit/skip", post(handlers::workflow::skip_deposit))
        // Agendamento da instalação
        .route("/{id}/schedule-installation", post(handlers::workflow::schedule_installation))
        // Workflow de instalação (etapas em ordem estrita)
        .route("/{id}/workflow/summary", get(handlers::workflow::workflow_summary))
        .route("/{id}/workflow/step", post(handlers::workflow::workflow_step))
        .route("/{id}/workflow/finish", post(handlers::workflow::workflow_finish))
        .route("/{id}/invoice.pdf", get(handlers::workflow::invoice_pdf))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let upload_routes = Router::new()
        .route("/single", post(handlers::uploads::upload_single))
        .route("/multiple", post(handlers::uploads::upload_multiple))
        // Margem sobre o limite do arquivo para os headers do multipart
        .layer(DefaultBodyLimit::max(app_state.max_file_size + 64 * 1024))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let activity_routes = Router::new()
        .route("/", get(handlers::activity::list_activity))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/auth", auth_protected_routes)
        .nest("/api/businesses", business_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/jobs", job_routes)
        .nest("/api/uploads", upload_routes)
        .nest("/api/activity", activity_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
