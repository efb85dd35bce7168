//! Release source implementations

pub mod fixed;
pub mod github;

pub use fixed::StaticReleases;
pub use github::GitHubReleases;
