//! Check for newer GitHub releases of a command-line application without
//! slowing down its startup.
//!
//! Versions are expected to follow <https://semver.org>, optionally with a
//! one-character prefix such as `v1.2.3`. Results are cached on disk and the
//! release source is consulted at most once per check interval.
//!
//! See [`check::check`] for the entry point.

pub mod check;
pub mod config;
pub mod version;

pub use check::{CheckOptions, UpdateCheck, check};
