//! # Rememo Common Library
//!
//! Shared code for the Rememo services:
//! - Error type used across crates
//! - TOML configuration model and resolution
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
