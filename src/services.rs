pub mod activity_service;
pub use activity_service::ActivityService;
pub mod auth;
pub use auth::AuthService;
pub mod document_service;
pub use document_service::DocumentService;
pub mod finance_service;
pub use finance_service::FinanceService;
pub mod job_service;
pub use job_service::JobService;
pub mod workflow_service;
pub use workflow_service::WorkflowService;
