//! Shared utilities for Banmen binaries.

pub mod logger;
pub mod time;
