//! Configuration and error types shared by the kalends crates.

pub mod config;
pub mod error;
