//! Realtime presence and message relay for Tayori.
//!
//! The relay keeps per-connection state in memory only: which user each
//! connection speaks for, which rooms it has joined, and which users are online.
//! Message persistence happens elsewhere; this crate only fans events out.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
