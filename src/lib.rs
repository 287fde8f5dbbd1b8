pub mod app;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod failure;
pub mod handlers;
pub mod managers;
pub mod middleware;
pub mod shell;

pub use app::{app, routes, system_state};
pub use dispatch::GatewayState;
