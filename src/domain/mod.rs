//! # Domain Layer
//!
//! Task example models, backend configuration shapes, and error types.
//! This layer is independent of external frameworks and infrastructure.

pub mod error;
pub mod models;

pub use error::*;
pub use models::*;
