//! Crossfire client runtime.
//!
//! Joins a room on the coordinator, runs the test case generator (host only)
//! or the program under test, and relays the bytes over the WebSocket.

pub mod config;
pub mod error;
pub mod runtime;

mod domain;
mod formatter;
mod runner;
mod session;
mod ui;

pub use domain::SessionEnd;
pub use runner::run_client;
