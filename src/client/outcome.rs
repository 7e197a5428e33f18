//! Terminal results of a verification request.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::common::error::{Action, ClientError, ErrorKind};
use crate::common::messages::{RecordId, Student};

/// Shown when the backend reports a non-match without a message.
pub const DEFAULT_NO_MATCH_MESSAGE: &str = "No match found.";

/// A guardian the backend recognised, and the pickup it logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupAuthorization {
    pub guardian_id: RecordId,
    pub guardian_name: String,
    /// Timestamp as sent by the backend
    pub pickup_log_time: String,
    pub authorized_students: Vec<Student>,
}

impl PickupAuthorization {
    /// The pickup time, if the backend's timestamp is RFC 3339 or a naive ISO-8601 date-time.
    pub fn pickup_time(&self) -> Option<DateTime<Utc>> {
        parse_pickup_time(&self.pickup_log_time)
    }
}

pub(crate) fn parse_pickup_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// What the backend said about a verification image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickupResult {
    Matched(PickupAuthorization),
    NoMatch { reason: String },
}

/// The outcome a verification view renders. Exactly one variant holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Matched(PickupAuthorization),
    NoMatch { reason: String },
    Failed { kind: ErrorKind, message: String },
}

impl VerificationOutcome {
    pub fn from_result(result: Result<PickupResult, ClientError>) -> Self {
        match result {
            Ok(PickupResult::Matched(auth)) => VerificationOutcome::Matched(auth),
            Ok(PickupResult::NoMatch { reason }) => VerificationOutcome::NoMatch { reason },
            Err(e) => VerificationOutcome::Failed {
                kind: e.kind(),
                message: e.user_message(Action::Verification),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_backend_timestamps() {
        let ts = parse_pickup_time("2024-05-01T15:04:05.123456Z").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 5, 1));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (15, 4, 5));

        assert!(parse_pickup_time("2024-05-01T15:04:05+02:00").is_some());
        assert!(parse_pickup_time("2024-05-01T15:04:05").is_some());
        assert!(parse_pickup_time("yesterday").is_none());
    }

    #[test]
    fn failures_carry_kind_and_message() {
        let outcome = VerificationOutcome::from_result(Err(ClientError::Connectivity));
        assert_eq!(
            outcome,
            VerificationOutcome::Failed {
                kind: ErrorKind::Connectivity,
                message: "Verification failed: Could not connect to the server.".into(),
            }
        );
    }
}
