//! # Stub Backend
//!
//! An in-memory implementation of the pickup backend's HTTP contract, for running
//! the client locally and for end-to-end tests. It answers with the same bodies and
//! status codes as the real service; matching is exact image equality.

pub mod routes;
pub mod state;

use anyhow::Result;
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub use routes::{router, SharedState};
pub use state::BackendState;

pub fn shared_state() -> SharedState {
    Arc::new(Mutex::new(BackendState::new()))
}

/// Serve the stub on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    info!("🌐 Stub backend listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
