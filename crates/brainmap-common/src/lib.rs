//! brainmap-common — Shared types and errors used across all Brainmap crates.

pub mod error;
pub mod entities;

// Re-export commonly used types
pub use entities::{AtlasId, ExpressionRecord, GeneInfo, StructureExpression};
pub use error::{AtlasError, Result};
