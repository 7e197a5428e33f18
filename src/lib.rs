pub mod capture;
pub mod client;
pub mod common;
pub mod server;

pub use client::{ApiClient, VerificationOutcome};
pub use common::error::{Action, ClientError, ErrorKind};
