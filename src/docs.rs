// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::register,
        handlers::auth::logout,
        handlers::auth::get_me,

        // --- Businesses ---
        handlers::businesses::create_business,
        handlers::businesses::list_businesses,
        handlers::businesses::get_business,
        handlers::businesses::update_business,
        handlers::businesses::delete_business,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,

        // --- Jobs ---
        handlers::jobs::create_job,
        handlers::jobs::list_jobs,
        handlers::jobs::get_job,
        handlers::jobs::update_job,
        handlers::jobs::delete_job,
        handlers::jobs::job_history,
        handlers::jobs::list_unassigned,
        handlers::jobs::assign_job,

        // --- Workflow ---
        handlers::workflow::deposit_summary,
        handlers::workflow::record_deposit,
        handlers::workflow::skip_deposit,
        handlers::workflow::list_pending_scheduling,
        handlers::workflow::schedule_installation,
        handlers::workflow::workflow_summary,
        handlers::workflow::workflow_step,
        handlers::workflow::workflow_finish,
        handlers::workflow::invoice_pdf,

        // --- Uploads ---
        handlers::uploads::upload_single,
        handlers::uploads::upload_multiple,

        // --- Activity ---
        handlers::activity::list_activity,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Businesses ---
            models::business::Business,
            handlers::businesses::CreateBusinessPayload,
            handlers::businesses::UpdateBusinessPayload,

            // --- Customers ---
            models::customers::Customer,
            handlers::customers::CreateCustomerPayload,
            handlers::customers::UpdateCustomerPayload,

            // --- Jobs ---
            models::jobs::JobType,
            models::jobs::JobStatus,
            models::jobs::DepositMethod,
            models::jobs::ControlType,
            models::jobs::BracketType,
            models::jobs::JobMeasurement,
            models::jobs::SelectedProduct,
            models::jobs::ChecklistItem,
            models::jobs::Job,
            models::jobs::JobHistoryEntry,
            handlers::jobs::CreateJobPayload,
            handlers::jobs::UpdateJobPayload,
            handlers::jobs::AssignJobPayload,

            // --- Workflow ---
            models::workflow::InstallationStep,
            models::workflow::BalancePaymentMethod,
            models::workflow::SignatureData,
            models::workflow::PaymentData,
            models::workflow::InvoiceData,
            models::workflow::InstallationState,
            models::workflow::StepSubmission,
            handlers::workflow::RecordDepositPayload,
            handlers::workflow::SkipDepositPayload,
            handlers::workflow::ScheduleInstallationPayload,

            // --- Finance ---
            models::finance::InvoiceLine,
            models::finance::JobFinancials,
            models::finance::DepositSummary,

            // --- Uploads ---
            handlers::uploads::UploadedFile,

            // --- Activity ---
            models::activity::ActivityLog,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Businesses", description = "Gestão de Empresas (tenants)"),
        (name = "Customers", description = "Gestão de Clientes"),
        (name = "Jobs", description = "CRUD e Atribuição de Jobs"),
        (name = "Workflow", description = "Depósito, Agendamento e Workflow de Instalação"),
        (name = "Uploads", description = "Upload de Fotos e Documentos"),
        (name = "Activity", description = "Log de Atividade da API")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
