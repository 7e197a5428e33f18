//! # Stub Backend Store
//!
//! In-memory students, guardians and pickup log. Face matching is replaced by exact
//! comparison of the uploaded image bytes with each guardian's reference image, so
//! a photo "matches" only the guardian it was registered for.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::common::messages::{ErrorBody, RecordId, Student, StudentSummary};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = match &self {
            BackendError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BackendError::NotFound(_) => StatusCode::NOT_FOUND,
            BackendError::Conflict(_) => StatusCode::CONFLICT,
        };
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// A student as listed by `GET /students`.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRecord {
    pub id: u64,
    pub name: String,
    pub teacher_email: Option<String>,
    pub guardian_ids: Vec<u64>,
}

impl StudentRecord {
    fn summary(&self) -> StudentSummary {
        StudentSummary {
            id: RecordId::Number(self.id),
            name: self.name.clone(),
        }
    }

    fn contact(&self) -> Student {
        Student {
            id: RecordId::Number(self.id),
            name: self.name.clone(),
            teacher_email: self.teacher_email.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuardianRecord {
    pub id: u64,
    pub name: String,
    pub reference_file: String,
    reference_image: Vec<u8>,
    pub student_ids: Vec<u64>,
}

/// A guardian as listed by `GET /guardians`.
#[derive(Debug, Clone, Serialize)]
pub struct GuardianListing {
    pub id: u64,
    pub name: String,
    pub reference_image_path: String,
    pub has_face_encoding: bool,
    pub student_ids: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct PickupLogEntry {
    pub guardian_id: u64,
    pub student_id: u64,
    pub verified_file: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of a successful match.
#[derive(Debug, Clone)]
pub struct Pickup {
    pub guardian_id: u64,
    pub guardian_name: String,
    pub students: Vec<Student>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct BackendState {
    students: Vec<StudentRecord>,
    guardians: Vec<GuardianRecord>,
    pickups: Vec<PickupLogEntry>,
    next_student_id: u64,
    next_guardian_id: u64,
}

impl BackendState {
    pub fn new() -> Self {
        Self {
            next_student_id: 1,
            next_guardian_id: 1,
            ..Default::default()
        }
    }

    pub fn students(&self) -> &[StudentRecord] {
        &self.students
    }

    pub fn pickups(&self) -> &[PickupLogEntry] {
        &self.pickups
    }

    pub fn guardians(&self) -> Vec<GuardianListing> {
        self.guardians
            .iter()
            .map(|g| GuardianListing {
                id: g.id,
                name: g.name.clone(),
                reference_image_path: format!("reference/{}", g.reference_file),
                has_face_encoding: !g.reference_image.is_empty(),
                student_ids: g.student_ids.clone(),
            })
            .collect()
    }

    pub fn add_student(
        &mut self,
        name: &str,
        teacher_email: Option<String>,
    ) -> Result<StudentRecord, BackendError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BackendError::BadRequest(
                "Student name not provided in JSON body".to_string(),
            ));
        }
        if self.students.iter().any(|s| s.name == name) {
            return Err(BackendError::Conflict(format!(
                "Student with name '{}' already exists",
                name
            )));
        }

        let record = StudentRecord {
            id: self.next_student_id,
            name: name.to_string(),
            teacher_email: teacher_email.filter(|e| !e.trim().is_empty()),
            guardian_ids: Vec::new(),
        };
        self.next_student_id += 1;
        self.students.push(record.clone());
        Ok(record)
    }

    /// Register a guardian. `student_ids` is the raw comma-separated form field.
    pub fn register_guardian(
        &mut self,
        name: &str,
        reference_file: &str,
        image: Vec<u8>,
        student_ids: &str,
    ) -> Result<(u64, Vec<StudentSummary>), BackendError> {
        let ids = parse_student_ids(student_ids)?;

        let missing: Vec<u64> = ids
            .iter()
            .copied()
            .filter(|id| !self.students.iter().any(|s| s.id == *id))
            .collect();
        if !missing.is_empty() {
            return Err(BackendError::NotFound(format!(
                "Could not find students with IDs: {:?}",
                missing
            )));
        }

        if self.guardians.iter().any(|g| g.reference_image == image) {
            return Err(BackendError::Conflict(format!(
                "An image with this content ({}) already exists as a reference.",
                reference_file
            )));
        }

        let guardian_id = self.next_guardian_id;
        self.next_guardian_id += 1;

        let mut associated = Vec::with_capacity(ids.len());
        for student in self.students.iter_mut().filter(|s| ids.contains(&s.id)) {
            student.guardian_ids.push(guardian_id);
            associated.push(student.summary());
        }

        self.guardians.push(GuardianRecord {
            id: guardian_id,
            name: name.trim().to_string(),
            reference_file: reference_file.to_string(),
            reference_image: image,
            student_ids: ids,
        });

        Ok((guardian_id, associated))
    }

    /// Match `image` against the registered guardians and log the pickup.
    ///
    /// `Ok(None)` means there are guardians but none matched.
    pub fn verify(&mut self, image: &[u8], file_name: &str) -> Result<Option<Pickup>, BackendError> {
        if self.guardians.is_empty() {
            return Err(BackendError::NotFound(
                "No registered guardians with face encodings found in the system.".to_string(),
            ));
        }

        let Some(guardian) = self.guardians.iter().find(|g| g.reference_image == image) else {
            return Ok(None);
        };

        let timestamp = Utc::now();
        let students: Vec<Student> = guardian
            .student_ids
            .iter()
            .filter_map(|id| self.students.iter().find(|s| s.id == *id))
            .map(StudentRecord::contact)
            .collect();

        let pickup = Pickup {
            guardian_id: guardian.id,
            guardian_name: guardian.name.clone(),
            students,
            timestamp,
        };

        for student in &pickup.students {
            if let RecordId::Number(student_id) = student.id {
                self.pickups.push(PickupLogEntry {
                    guardian_id: pickup.guardian_id,
                    student_id,
                    verified_file: file_name.to_string(),
                    timestamp,
                });
            }
        }

        Ok(Some(pickup))
    }
}

fn parse_student_ids(raw: &str) -> Result<Vec<u64>, BackendError> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part.parse::<u64>().map_err(|_| {
            BackendError::BadRequest(
                "Invalid Student IDs format. Please provide comma-separated integers.".to_string(),
            )
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(BackendError::BadRequest("Student IDs not provided".to_string()));
    }
    Ok(ids)
}
