//! # Guardian Registration
//!
//! Registers a guardian's reference photo together with the students they may pick
//! up. The roster to choose from is loaded separately by a
//! [`RosterClient`](super::roster::RosterClient); this view only keeps the ids the
//! user ticked.

use log::info;
use std::path::Path;
use tokio::sync::watch;

use super::client::ApiClient;
use super::requests::RegisterGuardian;
use super::state::{RequestState, RequestTracker};
use crate::capture::{CapturedImage, FrameSource, ImageSlot};
use crate::common::config::CaptureConfig;
use crate::common::error::ClientError;
use crate::common::messages::{GuardianRegistered, RecordId};

pub struct RegistrationClient {
    settings: CaptureConfig,
    image: ImageSlot,
    guardian_name: String,
    /// Ticked students, in the order they were ticked
    selected: Vec<RecordId>,
    tracker: RequestTracker<GuardianRegistered>,
}

impl RegistrationClient {
    pub fn new(settings: CaptureConfig) -> Self {
        Self {
            settings,
            image: ImageSlot::new(),
            guardian_name: String::new(),
            selected: Vec::new(),
            tracker: RequestTracker::new(),
        }
    }

    pub fn capture(&mut self, source: &dyn FrameSource) -> Result<(), ClientError> {
        match self.image.capture(source, &self.settings) {
            Ok(_) => {
                self.tracker.reset();
                Ok(())
            }
            Err(e) => Err(self.tracker.reject(ClientError::from(e))),
        }
    }

    /// Use a reference image file. Its name is kept for the upload.
    pub async fn select_file(&mut self, path: &Path) -> Result<(), ClientError> {
        match self.image.load_file(path).await {
            Ok(_) => {
                self.tracker.reset();
                Ok(())
            }
            Err(e) => Err(self.tracker.reject(ClientError::from(e))),
        }
    }

    pub fn set_image(&mut self, image: CapturedImage) {
        self.image.set(image);
        self.tracker.reset();
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.get()
    }

    pub fn set_guardian_name(&mut self, name: impl Into<String>) {
        self.guardian_name = name.into();
    }

    pub fn guardian_name(&self) -> &str {
        &self.guardian_name
    }

    /// Tick or untick a student.
    pub fn toggle_student(&mut self, id: RecordId) {
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id);
        }
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_students(&self) -> &[RecordId] {
        &self.selected
    }

    pub fn can_submit(&self) -> bool {
        !self.image.is_empty()
            && !self.guardian_name.trim().is_empty()
            && !self.selected.is_empty()
            && !self.tracker.is_pending()
    }

    pub async fn register(&mut self, api: &ApiClient) -> Result<GuardianRegistered, ClientError> {
        let request = match self.prepare() {
            Ok(request) => request,
            Err(e) => return Err(self.tracker.reject(e)),
        };

        let guard = self.tracker.begin();
        let result = guard.settle(api.submit(request).await);

        if let Ok(registered) = &result {
            info!(
                "Registered guardian {} ({}) with {} student(s)",
                registered.name,
                registered.guardian_id,
                registered.students_associated.len()
            );
            self.image.clear();
        }

        result
    }

    fn prepare(&self) -> Result<RegisterGuardian, ClientError> {
        let captured = self
            .image
            .get()
            .ok_or_else(|| ClientError::validation("Please capture or upload an image first."))?;

        if self.guardian_name.trim().is_empty() {
            return Err(ClientError::validation("Please enter the guardian's name."));
        }
        if self.selected.is_empty() {
            return Err(ClientError::validation("Please select at least one student."));
        }

        let image = captured
            .decode()
            .ok_or_else(|| ClientError::validation("Failed to process the image."))?;

        Ok(RegisterGuardian {
            image,
            file_name: captured.upload_name().to_string(),
            name: self.guardian_name.trim().to_string(),
            student_ids: self.selected.clone(),
        })
    }

    pub fn state(&self) -> RequestState<GuardianRegistered> {
        self.tracker.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<GuardianRegistered>> {
        self.tracker.subscribe()
    }
}
