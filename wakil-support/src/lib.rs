//! # Wakil Support
//!
//! Shared utilities for the Wakil factory crates.
//!
//! This crate provides:
//! - Text rendering for error messages and `Debug` output
//! - Tracing subscriber setup for demos and tests

pub mod rendering;
pub mod telemetry;
