//! Utils module - Shared utilities and helpers
//!
//! This module provides utility functions and helpers that are used across
//! multiple layers of the application architecture.

/// Error conversion helpers for HTTP and terminal failures
pub mod error_helpers;

/// `log` facade backend driven by `--verbose`
pub mod logging;

/// Exponential backoff for idempotent API reads
pub mod retry;

/// Display-width aware text helpers
pub mod text;

/// Input validation and result-shape checks
pub mod validation;
