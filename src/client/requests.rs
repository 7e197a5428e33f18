//! # Backend Requests
//!
//! The four operations of the pickup backend, each expressed as an [`ApiRequest`]:
//!
//! - [`ListStudents`]: `GET /students`
//! - [`AddStudent`]: `POST /add_student` (JSON)
//! - [`RegisterGuardian`]: `POST /register_guardian` (multipart)
//! - [`VerifyPickup`]: `POST /verify_pickup` (multipart)
//!
//! Payload builders re-check the invariants the views validate, so no request
//! leaves with an empty image, a blank name or an empty student list.

use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};

use super::client::{ApiRequest, RequestBody};
use super::outcome::{PickupAuthorization, PickupResult, DEFAULT_NO_MATCH_MESSAGE};
use crate::capture::ImageCapture;
use crate::common::error::{Action, ClientError};
use crate::common::messages::{
    GuardianRegistered, NewStudent, PickupResponse, RecordId, Student, StudentAdded,
};

fn image_part(image: ImageCapture, file_name: String) -> Result<Part, ClientError> {
    if image.bytes.is_empty() {
        return Err(ClientError::validation("Failed to process the image."));
    }
    Part::bytes(image.bytes)
        .file_name(file_name)
        .mime_str(&image.mime)
        .map_err(ClientError::unexpected)
}

/// `GET /students`
pub struct ListStudents;

impl ApiRequest for ListStudents {
    type Response = Vec<Student>;
    type Output = Vec<Student>;

    const ACTION: Action = Action::LoadRoster;

    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> &'static str {
        "/students"
    }

    fn into_body(self) -> Result<RequestBody, ClientError> {
        Ok(RequestBody::Empty)
    }

    fn into_output(response: Vec<Student>) -> Result<Vec<Student>, ClientError> {
        Ok(response)
    }
}

/// `POST /add_student`
pub struct AddStudent(pub NewStudent);

impl ApiRequest for AddStudent {
    type Response = StudentAdded;
    type Output = StudentAdded;

    const ACTION: Action = Action::AddStudent;

    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> &'static str {
        "/add_student"
    }

    fn into_body(self) -> Result<RequestBody, ClientError> {
        if self.0.name.trim().is_empty() {
            return Err(ClientError::validation("Student name cannot be empty."));
        }
        serde_json::to_value(&self.0)
            .map(RequestBody::Json)
            .map_err(ClientError::unexpected)
    }

    fn into_output(response: StudentAdded) -> Result<StudentAdded, ClientError> {
        Ok(response)
    }
}

/// `POST /register_guardian`
pub struct RegisterGuardian {
    pub image: ImageCapture,
    pub file_name: String,
    pub name: String,
    pub student_ids: Vec<RecordId>,
}

impl RegisterGuardian {
    /// The `student_ids` form field: ids joined by commas.
    pub fn joined_student_ids(&self) -> String {
        self.student_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl ApiRequest for RegisterGuardian {
    type Response = GuardianRegistered;
    type Output = GuardianRegistered;

    const ACTION: Action = Action::Registration;

    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> &'static str {
        "/register_guardian"
    }

    fn into_body(self) -> Result<RequestBody, ClientError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ClientError::validation("Please enter the guardian's name."));
        }
        if self.student_ids.is_empty() {
            return Err(ClientError::validation("Please select at least one student."));
        }

        let student_ids = self.joined_student_ids();
        let form = Form::new()
            .part("image", image_part(self.image, self.file_name)?)
            .text("name", name)
            .text("student_ids", student_ids);

        Ok(RequestBody::Multipart(form))
    }

    fn into_output(response: GuardianRegistered) -> Result<GuardianRegistered, ClientError> {
        Ok(response)
    }
}

/// `POST /verify_pickup`
pub struct VerifyPickup {
    pub image: ImageCapture,
    pub file_name: String,
}

impl ApiRequest for VerifyPickup {
    type Response = PickupResponse;
    type Output = PickupResult;

    const ACTION: Action = Action::Verification;

    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> &'static str {
        "/verify_pickup"
    }

    fn into_body(self) -> Result<RequestBody, ClientError> {
        let form = Form::new().part("image", image_part(self.image, self.file_name)?);
        Ok(RequestBody::Multipart(form))
    }

    fn into_output(response: PickupResponse) -> Result<PickupResult, ClientError> {
        if !response.matched {
            return Ok(no_match(response.message));
        }

        let missing = |field: &str| ClientError::unexpected(format!("match response missing {}", field));

        Ok(PickupResult::Matched(PickupAuthorization {
            guardian_id: response.guardian_id.ok_or_else(|| missing("guardian_id"))?,
            guardian_name: response.guardian_name.ok_or_else(|| missing("guardian_name"))?,
            pickup_log_time: response
                .pickup_log_time
                .ok_or_else(|| missing("pickup_log_time"))?,
            authorized_students: response.authorized_students,
        }))
    }

    /// The backend reports a non-match as 401 with `{match: false, message}`.
    fn from_error_status(
        _status: StatusCode,
        body: &[u8],
    ) -> Option<Result<PickupResult, ClientError>> {
        match serde_json::from_slice::<PickupResponse>(body) {
            Ok(response) if !response.matched => Some(Ok(no_match(response.message))),
            _ => None,
        }
    }
}

fn no_match(message: Option<String>) -> PickupResult {
    PickupResult::NoMatch {
        reason: message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NO_MATCH_MESSAGE.to_string()),
    }
}
