//! `stockroom-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod duration;
pub mod error;
pub mod id;
pub mod version;

pub use duration::{parse_duration, parse_duration_or};
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, ItemId, RecordId, UserId, WorkspaceId};
pub use version::ExpectedVersion;
