//! HTTP API server

mod error;
mod handlers;
pub mod middleware;
mod state;

pub use error::ApiError;
pub use handlers::create_router;
pub use state::AppState;
