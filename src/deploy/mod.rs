//! Deploy tooling
//!
//! This module handles:
//! - Reading `.env` files and combining them with the process environment
//! - The build step that fills deployment placeholders into the web sources
//! - Preflight checks run before packaging the mobile wrapper

pub mod build;
pub mod env;
pub mod preflight;
