pub mod user_repo;
pub use user_repo::UserRepository;
pub mod business_repo;
pub use business_repo::BusinessRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod job_repo;
pub use job_repo::JobRepository;
pub mod activity_repo;
pub use activity_repo::ActivityRepository;
