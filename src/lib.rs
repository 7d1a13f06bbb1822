pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod views;
pub mod web;

pub use config::Config;
pub use error::AppError;
pub use routes::router;
pub use state::AppState;
