// Booking services: training lifecycle, subscriptions and student queries

pub mod availability;
pub mod error;
pub mod student_service;
pub mod subscription_service;
pub mod training_service;
pub mod user_service;

pub use availability::{compute_targets, Candidate, SyncOutcome};
pub use error::{ServiceError, ServiceResult};
pub use student_service::StudentService;
pub use subscription_service::SubscriptionService;
pub use training_service::TrainingService;
pub use user_service::UserService;
