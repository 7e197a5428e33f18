//! # Common Components
//!
//! Shared utilities and data structures used by both the client and the stub backend.
//!
//! ## Modules
//!
//! - [`messages`]: JSON wire types for every backend endpoint
//! - [`error`]: client error taxonomy and user-facing messages
//! - [`config`]: configuration parsing and base URL resolution
//! - [`logging`]: logger setup for the binaries

pub mod config;
pub mod error;
pub mod logging;
pub mod messages;
