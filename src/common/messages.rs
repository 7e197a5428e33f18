//! # Wire Types
//!
//! JSON bodies exchanged with the pickup backend. The same types are used by the
//! client to decode responses and by the stub backend to produce them, so both
//! sides of the contract stay in step.
//!
//! ## Endpoints
//!
//! | Endpoint | Request | Success body |
//! |---|---|---|
//! | `GET /students` | - | `[Student]` |
//! | `POST /add_student` | [`NewStudent`] (JSON) | [`StudentAdded`] |
//! | `POST /register_guardian` | multipart `image`, `name`, `student_ids` | [`GuardianRegistered`] |
//! | `POST /verify_pickup` | multipart `image` | [`PickupResponse`] |
//!
//! Every endpoint reports failures as [`ErrorBody`].

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Identifier of a student or guardian record.
///
/// The backend may hand out numeric ids or opaque document ids. Both are accepted
/// and serialised back in the form they arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        RecordId::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::convert::Infallible;

    /// Digits become a numeric id, anything else an opaque one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<u64>() {
            Ok(n) => RecordId::Number(n),
            Err(_) => RecordId::Text(s.to_string()),
        })
    }
}

// ============================================================================
// STUDENTS
// ============================================================================

/// A student as listed by `GET /students`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: RecordId,
    pub name: String,
    /// Contact for pickup notifications, when the school has one on file
    #[serde(default)]
    pub teacher_email: Option<String>,
}

/// Body of `POST /add_student`. `teacher_email` is sent as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub teacher_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAdded {
    pub message: String,
    pub name: String,
    pub student_id: RecordId,
    #[serde(default)]
    pub teacher_email: Option<String>,
}

/// Short student reference embedded in registration responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: RecordId,
    pub name: String,
}

// ============================================================================
// GUARDIANS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianRegistered {
    pub message: String,
    pub name: String,
    pub guardian_id: RecordId,
    #[serde(default)]
    pub students_associated: Vec<StudentSummary>,
}

/// Body of `POST /verify_pickup`, for both the match and the no-match case.
///
/// On a match the guardian fields and `pickup_log_time` are present; on a
/// non-match only `message` is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupResponse {
    #[serde(rename = "match")]
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_log_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorized_students: Vec<Student>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error payload shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
        }
    }
}
