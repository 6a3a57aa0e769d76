// Data models for users, trainings and booking edges

pub mod user;
pub mod training;
pub mod subscription;
pub mod validation;

pub use user::*;
pub use training::*;
pub use subscription::*;
pub use validation::*;
