//! Core domain types and shared logic for the Workshop addon catalog.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Content hashes and incremental hashing
//! - Addon metadata and preview image references
//! - Configuration types

pub mod addon;
pub mod config;
pub mod error;
pub mod hash;

pub use addon::{AddonMetadata, ImageRef, MAX_IMAGES_PER_ADDON};
pub use error::{Error, Result};
pub use hash::{ContentHash, ContentHasher};

/// Default maximum size per uploaded artifact: 200 MiB.
pub const DEFAULT_MAX_ARTIFACT_SIZE: u64 = 200 * 1024 * 1024;
