// HTTP routers and handlers

pub mod auth;
pub mod client;
pub mod coach;
pub mod health;
pub mod routes;

pub use routes::create_routes;
