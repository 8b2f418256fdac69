//! # Connector Layer
//!
//! External integrations implementing the application interfaces:
//! - Configuration (environment snapshot and backend resolution)
//! - Storage (Chroma with OpenAI embeddings, SQLite keyword search)
//! - Query expansion (Anthropic Messages API)
//! - The storage factory wiring one backend per process

pub mod adapter;
pub mod config;
pub mod factory;

pub use adapter::*;
pub use config::*;
pub use factory::*;
