//! Add-student form: a name, an optional teacher e-mail, one JSON request.

use tokio::sync::watch;

use super::client::ApiClient;
use super::requests::AddStudent;
use super::state::{RequestState, RequestTracker};
use crate::common::error::ClientError;
use crate::common::messages::{NewStudent, StudentAdded};

#[derive(Default)]
pub struct AddStudentForm {
    name: String,
    teacher_email: String,
    tracker: RequestTracker<StudentAdded>,
}

impl AddStudentForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_teacher_email(&mut self, email: impl Into<String>) {
        self.teacher_email = email.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn teacher_email(&self) -> &str {
        &self.teacher_email
    }

    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty() && !self.tracker.is_pending()
    }

    /// Submit the form. On success both inputs are cleared.
    pub async fn submit(&mut self, api: &ApiClient) -> Result<StudentAdded, ClientError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(self
                .tracker
                .reject(ClientError::validation("Student name cannot be empty.")));
        }

        let email = self.teacher_email.trim();
        let body = NewStudent {
            name: name.to_string(),
            teacher_email: (!email.is_empty()).then(|| email.to_string()),
        };

        let guard = self.tracker.begin();
        let result = guard.settle(api.submit(AddStudent(body)).await);

        if result.is_ok() {
            self.name.clear();
            self.teacher_email.clear();
        }

        result
    }

    pub fn state(&self) -> RequestState<StudentAdded> {
        self.tracker.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<StudentAdded>> {
        self.tracker.subscribe()
    }
}
