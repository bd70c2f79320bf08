pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod object_id;
pub mod state;
pub mod users;

pub use app::build_app;
pub use config::{AppConfig, JwtConfig};
pub use error::ApiError;
pub use state::AppState;
