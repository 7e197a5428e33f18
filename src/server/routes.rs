//! HTTP handlers of the stub backend.

use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use super::state::{BackendError, BackendState};
use crate::common::messages::{GuardianRegistered, PickupResponse, RecordId};

pub type SharedState = Arc<Mutex<BackendState>>;

/// Uploads larger than this are refused.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/students", get(list_students))
        .route("/add_student", post(add_student))
        .route("/guardians", get(list_guardians))
        .route("/register_guardian", post(register_guardian))
        .route("/verify_pickup", post(verify_pickup))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "online",
        "message": "Safe pickup stub API is running",
        "endpoints": [
            "/register_guardian",
            "/verify_pickup",
            "/add_student",
            "/students",
            "/guardians"
        ]
    }))
}

async fn list_students(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.lock().await;
    Json(state.students().to_vec())
}

async fn list_guardians(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.lock().await;
    Json(state.guardians())
}

#[derive(Debug, Deserialize)]
struct AddStudentBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    teacher_email: Option<String>,
}

async fn add_student(
    State(state): State<SharedState>,
    Json(body): Json<AddStudentBody>,
) -> Result<impl IntoResponse, BackendError> {
    let mut state = state.lock().await;
    let student = state.add_student(body.name.as_deref().unwrap_or(""), body.teacher_email)?;

    info!("Added student {} ({})", student.id, student.name);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Student added successfully",
            "student_id": student.id,
            "name": student.name,
            "teacher_email": student.teacher_email,
            "guardian_ids": student.guardian_ids,
        })),
    ))
}

/// Multipart upload: the `image` file plus any text fields.
struct UploadForm {
    image: Option<(String, Vec<u8>)>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, BackendError> {
        let mut form = UploadForm {
            image: None,
            fields: HashMap::new(),
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| BackendError::BadRequest(format!("Failed to read multipart data: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name == "image" {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| {
                    BackendError::BadRequest(format!("Failed to read image data: {}", e))
                })?;
                form.image = Some((file_name, data.to_vec()));
            } else {
                let text = field.text().await.map_err(|e| {
                    BackendError::BadRequest(format!("Failed to read field {}: {}", name, e))
                })?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// The uploaded image, checked the way the real backend checks it.
    fn take_image(&mut self) -> Result<(String, Vec<u8>), BackendError> {
        let (file_name, data) = self
            .image
            .take()
            .ok_or_else(|| BackendError::BadRequest("No image file provided".to_string()))?;

        if file_name.is_empty() {
            return Err(BackendError::BadRequest("No selected file".to_string()));
        }
        if image::guess_format(&data).is_err() {
            return Err(BackendError::BadRequest(
                "Could not detect a face in the provided image or processing failed.".to_string(),
            ));
        }

        Ok((file_name, data))
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

async fn register_guardian(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, BackendError> {
    let mut form = UploadForm::read(multipart).await?;

    let (file_name, image) = form.take_image()?;
    let name = form
        .field("name")
        .ok_or_else(|| BackendError::BadRequest("Guardian name not provided".to_string()))?;
    let student_ids = form
        .field("student_ids")
        .ok_or_else(|| BackendError::BadRequest("Student IDs not provided".to_string()))?;

    let mut state = state.lock().await;
    let (guardian_id, students_associated) =
        state.register_guardian(name, &file_name, image, student_ids)?;

    info!(
        "Registered guardian {} ({}) for students {:?}",
        guardian_id,
        name.trim(),
        students_associated.iter().map(|s| s.id.to_string()).collect::<Vec<_>>()
    );

    Ok((
        StatusCode::CREATED,
        Json(GuardianRegistered {
            message: "Guardian registered successfully".to_string(),
            name: name.trim().to_string(),
            guardian_id: RecordId::Number(guardian_id),
            students_associated,
        }),
    ))
}

async fn verify_pickup(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, BackendError> {
    let mut form = UploadForm::read(multipart).await?;
    let (file_name, image) = form.take_image()?;

    let mut state = state.lock().await;
    let Some(pickup) = state.verify(&image, &file_name)? else {
        warn!("Verification failed: no match for {}", file_name);
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(PickupResponse {
                matched: false,
                guardian_id: None,
                guardian_name: None,
                pickup_log_time: None,
                authorized_students: Vec::new(),
                message: Some("No authorized guardian matched the provided image.".to_string()),
            }),
        ));
    };

    info!(
        "Verification successful: guardian {} ({})",
        pickup.guardian_id, pickup.guardian_name
    );

    for student in &pickup.students {
        match &student.teacher_email {
            Some(email) => info!(
                "NOTIFICATION: Send email to {} for pickup of {} by {}",
                email, student.name, pickup.guardian_name
            ),
            None => warn!(
                "NOTIFICATION: No teacher email for student {} (ID: {}) to notify.",
                student.name, student.id
            ),
        }
    }

    Ok((
        StatusCode::OK,
        Json(PickupResponse {
            matched: true,
            guardian_id: Some(RecordId::Number(pickup.guardian_id)),
            guardian_name: Some(pickup.guardian_name),
            pickup_log_time: Some(format!(
                "{}Z",
                pickup.timestamp.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f")
            )),
            authorized_students: pickup.students,
            message: None,
        }),
    ))
}
