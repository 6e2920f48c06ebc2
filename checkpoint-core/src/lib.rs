//! Core library for the checkpoint manager.
//!
//! This crate provides the checkpoint models, the SQLite-backed aggregate
//! store and the checkpoint service, independent of any transport layer
//! (HTTP, MCP, CLI).
//!
//! # Usage
//!
//! ```no_run
//! use checkpoint_core::{CheckpointService, Database};
//! use serde_json::json;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let service = CheckpointService::new(db);
//! service.save("auth-refactor", &json!({ "summary": "Halfway through" }))?;
//! let checkpoint = service.resume("auth-refactor")?;
//! # Ok::<(), checkpoint_core::CheckpointError>(())
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

// Re-export commonly used types at crate root
pub use config::Config;
pub use db::Database;
pub use error::{CheckpointError, Result};
pub use service::CheckpointService;
