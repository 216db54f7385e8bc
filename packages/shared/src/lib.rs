//! Utilities shared by the Tayori relay server and client.

pub mod logger;
pub mod time;
