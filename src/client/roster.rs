//! # Student Roster
//!
//! Fetches the student list once when a view mounts and filters it locally.
//!
//! The fetched list is a read-only snapshot owned by the view; it is reloaded per
//! session by mounting a new [`RosterClient`], never shared globally. A failed
//! fetch leaves the roster empty and records the error; it is not retried.
//!
//! Filtering is evaluated fresh against the full roster on every change of the
//! search text. An empty search shows no students at all: the list stays quiet
//! until the user starts typing.

use log::{info, warn};

use super::client::ApiClient;
use super::requests::ListStudents;
use super::state::{RequestState, RequestTracker};
use crate::common::error::ClientError;
use crate::common::messages::Student;

/// Shown in place of the list when the fetch failed.
pub const ROSTER_LOAD_ERROR: &str = "Failed to load student list. Please try again later.";

pub struct RosterClient {
    students: Vec<Student>,
    search: String,
    tracker: RequestTracker<usize>,
}

impl RosterClient {
    /// An empty roster that has not been fetched yet.
    pub fn new() -> Self {
        Self {
            students: Vec::new(),
            search: String::new(),
            tracker: RequestTracker::new(),
        }
    }

    /// Create the roster and fetch it, as a view does when it mounts.
    pub async fn mount(api: &ApiClient) -> Self {
        let mut roster = Self::new();
        roster.load(api).await;
        roster
    }

    /// Fetch the full roster, replacing whatever was held.
    pub async fn load(&mut self, api: &ApiClient) {
        let guard = self.tracker.begin();
        match api.submit(ListStudents).await {
            Ok(students) => {
                info!("Loaded {} students", students.len());
                let _ = guard.settle(Ok(students.len()));
                self.students = students;
            }
            Err(e) => {
                warn!("Roster fetch failed: {}", e);
                let _ = guard.settle(Err(e));
                self.students.clear();
            }
        }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn load_error(&self) -> Option<ClientError> {
        self.tracker.snapshot().error().cloned()
    }

    /// Message to show instead of the list, if loading failed.
    pub fn load_error_message(&self) -> Option<&'static str> {
        self.load_error().map(|_| ROSTER_LOAD_ERROR)
    }

    pub fn state(&self) -> RequestState<usize> {
        self.tracker.snapshot()
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Students matching the current search text.
    pub fn visible(&self) -> Vec<&Student> {
        filter_students(&self.students, &self.search)
    }
}

impl Default for RosterClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive substring match on name or id. Blank queries match nothing.
pub fn filter_students<'a>(students: &'a [Student], query: &str) -> Vec<&'a Student> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    students
        .iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&query) || s.id.to_string().to_lowercase().contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::messages::RecordId;

    fn roster() -> Vec<Student> {
        vec![
            Student {
                id: RecordId::Number(1),
                name: "Alice".into(),
                teacher_email: None,
            },
            Student {
                id: RecordId::Number(2),
                name: "Bob".into(),
                teacher_email: None,
            },
            Student {
                id: RecordId::Number(12),
                name: "Carla".into(),
                teacher_email: Some("ms.park@school.org".into()),
            },
        ]
    }

    #[test]
    fn matches_name_case_insensitively() {
        let students = roster();
        let names: Vec<_> = filter_students(&students, "AL")
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, ["Alice"]);

        let names: Vec<_> = filter_students(&students, "La")
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, ["Carla"]);
    }

    #[test]
    fn matches_stringified_id() {
        let students = roster();
        let ids: Vec<_> = filter_students(&students, "2").iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, [RecordId::Number(2), RecordId::Number(12)]);
    }

    #[test]
    fn empty_search_shows_nothing() {
        let students = roster();
        assert!(filter_students(&students, "").is_empty());
        assert!(filter_students(&students, "   ").is_empty());
    }

    #[test]
    fn two_student_roster() {
        let students = vec![
            Student {
                id: RecordId::Number(1),
                name: "Alice".into(),
                teacher_email: None,
            },
            Student {
                id: RecordId::Number(2),
                name: "Bob".into(),
                teacher_email: None,
            },
        ];
        assert_eq!(filter_students(&students, "al"), vec![&students[0]]);
        assert!(filter_students(&students, "").is_empty());
    }

    #[test]
    fn view_filters_fresh_on_each_change() {
        let mut view = RosterClient::new();
        view.students = roster();

        assert!(view.visible().is_empty());
        view.set_search("b");
        assert_eq!(view.visible().len(), 1);
        view.set_search("");
        assert!(view.visible().is_empty());
        view.set_search("a");
        assert_eq!(view.visible().len(), 2);
    }
}
