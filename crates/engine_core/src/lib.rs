//! Core engine types and utilities.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Transform and orientation helpers
//! - Simulated time and the fixed-step accumulator
//! - Resumable tick-driven tasks

pub mod task;
pub mod time;
pub mod transform;

pub use task::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Quat, Vec3};
