// Authentication: credentials, tokens and role checks

pub mod errors;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;

pub use errors::AuthError;
pub use jwt::{extract_bearer_token, JwtService};
pub use middleware::{jwt_auth_middleware, require_role, ACCESS_TOKEN_COOKIE};
pub use models::*;
pub use service::AuthService;
