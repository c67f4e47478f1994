//! Shared utilities

pub mod time;
pub mod vector;
