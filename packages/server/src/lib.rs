//! Crossfire session coordinator.
//!
//! Tracks rooms of connected participants, drives the
//! generate → dispatch → collect → compare round cycle and reports pairwise
//! diffs when two builds of a program disagree.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
