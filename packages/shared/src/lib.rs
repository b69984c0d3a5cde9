//! Utilities shared by the Crossfire server and client binaries.

pub mod logger;
pub mod time;
