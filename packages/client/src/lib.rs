//! Client side of the Tayori relay.
//!
//! - `adapter`: [`RelayClient`], a reconnecting connection to the relay with typed emitters
//! - `session`: the interactive CLI built on top of it

pub mod adapter;
pub mod command;
pub mod config;
pub mod domain;
pub mod error;

mod formatter;
mod session;
mod ui;

pub use adapter::RelayClient;
pub use config::ReconnectPolicy;
pub use domain::ConnectionState;
pub use error::ClientError;
pub use session::run_client;
