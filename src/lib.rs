//! Transports and presentation for the checkpoint manager: the MCP stdio
//! server, the HTTP API and the human-readable reports printed by `ckpt`.

pub mod api;
pub mod mcp;
pub mod report;

pub use checkpoint_core::{db, models, CheckpointError, CheckpointService, Database};
