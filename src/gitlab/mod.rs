//! GitLab API module
//!
//! Provides a typed client for the GitLab REST endpoints the resource
//! handlers use.

pub mod api;
pub mod client;
pub mod types;

pub use client::GitLabClient;
pub use types::*;
