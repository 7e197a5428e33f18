//! # Guardian Verification
//!
//! The pickup-desk view: capture a live photo of the person at the desk, send it to
//! `POST /verify_pickup`, and render one [`VerificationOutcome`].
//!
//! ## Workflow
//!
//! 1. **Capture**: snapshot a [`FrameSource`] (or load a file). A new capture clears
//!    the previous outcome.
//! 2. **Validate**: an image must be present and decode to bytes plus MIME type.
//! 3. **Submit**: one multipart request, state `Pending` until it resolves.
//! 4. **Render**: `Matched`, `NoMatch` or `Failed`.
//!
//! A successful verification discards the image; a failed one keeps it so the
//! user can simply trigger the request again.

use log::info;
use std::path::Path;
use tokio::sync::watch;

use super::client::ApiClient;
use super::outcome::{PickupResult, VerificationOutcome};
use super::requests::VerifyPickup;
use super::state::{RequestState, RequestTracker};
use crate::capture::{CapturedImage, FrameSource, ImageSlot};
use crate::common::config::CaptureConfig;
use crate::common::error::ClientError;

pub struct VerificationClient {
    settings: CaptureConfig,
    image: ImageSlot,
    tracker: RequestTracker<PickupResult>,
}

impl VerificationClient {
    pub fn new(settings: CaptureConfig) -> Self {
        Self {
            settings,
            image: ImageSlot::new(),
            tracker: RequestTracker::new(),
        }
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.get()
    }

    /// Snapshot the current camera frame.
    pub fn capture(&mut self, source: &dyn FrameSource) -> Result<(), ClientError> {
        match self.image.capture(source, &self.settings) {
            Ok(_) => {
                self.tracker.reset();
                Ok(())
            }
            Err(e) => Err(self.tracker.reject(ClientError::from(e))),
        }
    }

    /// Use an image file instead of the camera.
    pub async fn select_file(&mut self, path: &Path) -> Result<(), ClientError> {
        match self.image.load_file(path).await {
            Ok(_) => {
                self.tracker.reset();
                Ok(())
            }
            Err(e) => Err(self.tracker.reject(ClientError::from(e))),
        }
    }

    /// Whether the verify control should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.image.is_empty() && !self.tracker.is_pending()
    }

    /// Verify the held image against the registered guardians.
    pub async fn verify(&mut self, api: &ApiClient) -> VerificationOutcome {
        let request = match self.prepare() {
            Ok(request) => request,
            Err(e) => return VerificationOutcome::from_result(Err(self.tracker.reject(e))),
        };

        let guard = self.tracker.begin();
        let result = guard.settle(api.submit(request).await);

        if let Ok(PickupResult::Matched(auth)) = &result {
            info!(
                "Guardian {} ({}) verified for {} student(s)",
                auth.guardian_name,
                auth.guardian_id,
                auth.authorized_students.len()
            );
        }
        if result.is_ok() {
            self.image.clear();
        }

        VerificationOutcome::from_result(result)
    }

    fn prepare(&self) -> Result<VerifyPickup, ClientError> {
        let captured = self
            .image
            .get()
            .ok_or_else(|| ClientError::validation("Please capture an image first."))?;

        let image = captured
            .decode()
            .ok_or_else(|| ClientError::validation("Failed to process captured image."))?;

        Ok(VerifyPickup {
            image,
            file_name: captured.upload_name().to_string(),
        })
    }

    /// The outcome of the last request, if it has finished.
    pub fn outcome(&self) -> Option<VerificationOutcome> {
        match self.tracker.snapshot() {
            RequestState::Succeeded(result) => Some(VerificationOutcome::from_result(Ok(result))),
            RequestState::Failed(e) => Some(VerificationOutcome::from_result(Err(e))),
            RequestState::Idle | RequestState::Pending => None,
        }
    }

    pub fn state(&self) -> RequestState<PickupResult> {
        self.tracker.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<PickupResult>> {
        self.tracker.subscribe()
    }

    /// Hand over an already-encoded image, e.g. a browser screenshot.
    pub fn set_image(&mut self, image: CapturedImage) {
        self.image.set(image);
        self.tracker.reset();
    }
}
