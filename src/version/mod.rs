//! Release lookup, caching and comparison
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐     ┌───────────────┐     ┌───────────────┐
//! │ ReleaseSource │────▶│   Resolution  │◀───▶│   CacheStore  │
//! │   (fetch)     │     │   (decide)    │     │   (persist)   │
//! └───────────────┘     └───────────────┘     └───────────────┘
//!        │                      │                     │
//!        ▼                      ▼                     ▼
//! ┌───────────────┐     ┌───────────────┐     ┌───────────────┐
//! │    Sources    │     │    Semver     │     │  File, SQLite │
//! │(GitHub,static)│     │ (tag compare) │     │     no-op     │
//! └───────────────┘     └───────────────┘     └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`resolver`]: The update-resolution algorithm and fetch deadline
//! - [`semver`]: Prefix-tolerant semver parsing and ordering of tags
//! - [`source`]: Release source trait
//! - [`sources`]: GitHub and static release sources
//! - [`store`]: Cache store trait and the no-op store
//! - [`file_cache`]: JSON file cache store
//! - [`cache`]: SQLite cache store
//! - [`error`]: Error types for caches, sources and options
//! - [`types`]: `CacheRecord`, `Release`, `ReleaseList`

pub mod cache;
pub mod error;
pub mod file_cache;
pub mod resolver;
pub mod semver;
pub mod source;
pub mod sources;
pub mod store;
pub mod types;
