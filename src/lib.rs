//! askdb: a terminal client for asking a database questions in plain
//! English through a remote query engine, and reading the answers as a
//! table, charts and a statistical summary.

pub use error::AppError;

/// Main architecture layers (dependency flow: CLI → Core → Storage)
pub mod cli; // Command-line interface and chat loop
pub mod core; // Conversation session and connection catalog
pub mod storage; // Configuration profiles

/// Support modules (used across layers)
pub mod api; // Query engine HTTP client
pub mod display; // Result views and transcript rendering
pub mod error; // Error handling
pub mod utils; // Shared utilities and helpers

pub type Result<T> = std::result::Result<T, AppError>;
