//! # Stub Backend Binary Entry Point
//!
//! Thin wrapper that serves the in-memory pickup backend.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin stub_backend -- --bind 127.0.0.1:5000 --student Alice --student Bob
//! ```

use clap::Parser;
use log::info;

use safe_pickup::common::logging::init_logger;
use safe_pickup::server::{serve, shared_state};

/// Command-line arguments for the stub backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    bind: String,

    /// Student to put on the roster at startup; repeatable
    #[arg(long = "student")]
    students: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();
    let state = shared_state();

    {
        let mut backend = state.lock().await;
        for name in &args.students {
            let student = backend.add_student(name, None)?;
            info!("Seeded student {} ({})", student.id, student.name);
        }
    }

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    serve(listener, state).await
}
