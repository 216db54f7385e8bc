//! Relay server: axum router, handlers, and lifecycle.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use state::AppState;
