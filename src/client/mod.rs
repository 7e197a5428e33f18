//! # Client Components
//!
//! The client is split into a transport layer and the views built on it.
//!
//! ## Transport ([`client`], [`requests`])
//! [`ApiClient`] performs one generic operation: send an [`requests`] payload,
//! classify the response. Every endpoint shares that single error classification.
//!
//! ## Views
//! Each view owns its transient state (current image, form inputs, request state)
//! and talks only to the backend, never to another view:
//! - [`VerificationClient`]: capture a photo and verify a guardian
//! - [`RegistrationClient`]: register a guardian with authorised students
//! - [`AddStudentForm`]: add a student to the roster
//! - [`RosterClient`]: fetch and filter the student list
//!
//! ## Supporting modules
//! - [`state`]: `Idle → Pending → Succeeded | Failed`
//! - [`outcome`]: verification results
//! - [`metrics`]: per-request latency and outcome tracking

pub mod client;
pub mod metrics;
pub mod outcome;
pub mod registration;
pub mod requests;
pub mod roster;
pub mod state;
pub mod students;
pub mod verification;

// Re-export for convenience
pub use client::ApiClient;
pub use metrics::ClientMetrics;
pub use outcome::{PickupAuthorization, PickupResult, VerificationOutcome};
pub use registration::RegistrationClient;
pub use roster::{filter_students, RosterClient};
pub use state::RequestState;
pub use students::AddStudentForm;
pub use verification::VerificationClient;
