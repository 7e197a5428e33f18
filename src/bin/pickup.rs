//! # Pickup Desk Binary Entry Point
//!
//! Command-line front-end for the school pickup backend.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin pickup -- students --search al
//! cargo run --bin pickup -- add-student --name "Jane Doe" --teacher-email ms.park@school.org
//! cargo run --bin pickup -- register --name "Maria Lopez" --student 1 --student 4 --image maria.jpg
//! cargo run --bin pickup -- verify --snapshot desk_camera.jpg
//! ```
//!
//! `--snapshot` pushes the file through the camera path (scaled JPEG at the configured
//! resolution); `--image` uploads the file as selected.
//!
//! The backend is located with `--api-url`, `PICKUP_API_URL`, the config file, or the
//! loopback default, in that order.

use anyhow::{bail, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use safe_pickup::capture::StillFrameSource;
use safe_pickup::client::{
    AddStudentForm, ApiClient, ClientMetrics, RegistrationClient, RosterClient,
    VerificationClient, VerificationOutcome,
};
use safe_pickup::common::config::{ClientConfig, API_URL_ENV};
use safe_pickup::common::error::{Action, ClientError};
use safe_pickup::common::logging::init_logger;
use safe_pickup::common::messages::RecordId;

/// Command-line arguments for the pickup desk
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the client configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Backend base URL, overriding the config file
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Path to write metrics JSON output (optional)
    #[arg(long)]
    metrics_output: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the roster and show students matching a search
    Students {
        /// Case-insensitive match on name or id; nothing is listed without it
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Add a student to the roster
    AddStudent {
        #[arg(long)]
        name: String,
        #[arg(long)]
        teacher_email: Option<String>,
    },
    /// Register a guardian's reference photo and authorised students
    Register {
        #[arg(long)]
        name: String,
        /// Student id; repeat for several students
        #[arg(long = "student", required = true)]
        students: Vec<RecordId>,
        #[command(flatten)]
        image: ImageSource,
    },
    /// Verify the guardian at the desk
    Verify {
        #[command(flatten)]
        image: ImageSource,
    },
}

#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
struct ImageSource {
    /// Upload an image file as selected
    #[arg(long)]
    image: Option<PathBuf>,
    /// Treat an image file as the current camera frame
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let args = Args::parse();
    let config = ClientConfig::from_file_or_default(args.config.as_deref())?;

    let mut api = ApiClient::new(config.base_url(args.api_url.as_deref()))?;

    let metrics = args
        .metrics_output
        .as_ref()
        .map(|_| Arc::new(Mutex::new(ClientMetrics::new("pickup-desk".to_string()))));
    if let Some(metrics) = &metrics {
        api = api.with_metrics(metrics.clone());
    }

    let result = run(args.command, &api, &config).await;

    if let (Some(metrics), Some(output_path)) = (metrics, args.metrics_output) {
        match metrics.lock() {
            Ok(metrics) => {
                metrics.export_to_json(&output_path)?;
                println!("Metrics exported to: {}", output_path);
            }
            Err(_) => error!("Metrics unavailable: lock poisoned"),
        }
    }

    result
}

async fn run(command: Command, api: &ApiClient, config: &ClientConfig) -> Result<()> {
    match command {
        Command::Students { search } => {
            let mut roster = RosterClient::mount(api).await;
            if let Some(message) = roster.load_error_message() {
                bail!("{}", message);
            }

            roster.set_search(search);
            println!("{} students on the roster", roster.students().len());
            for student in roster.visible() {
                match &student.teacher_email {
                    Some(email) => println!("  {} (ID: {}) - Teacher: {}", student.name, student.id, email),
                    None => println!("  {} (ID: {})", student.name, student.id),
                }
            }
        }

        Command::AddStudent {
            name,
            teacher_email,
        } => {
            let mut form = AddStudentForm::new();
            form.set_name(name);
            form.set_teacher_email(teacher_email.unwrap_or_default());

            let added = form.submit(api).await.or_else(|e| fail(e, Action::AddStudent))?;
            println!("{}", added.message);
            println!("Student: {} (ID: {})", added.name, added.student_id);
            if let Some(email) = added.teacher_email {
                println!("Teacher Email: {}", email);
            }
        }

        Command::Register {
            name,
            students,
            image,
        } => {
            let mut view = RegistrationClient::new(config.capture);
            match (image.image, image.snapshot) {
                (Some(path), _) => view.select_file(&path).await,
                (None, Some(path)) => match StillFrameSource::from_file(&path).await {
                    Ok(source) => view.capture(&source),
                    Err(e) => Err(ClientError::from(e)),
                },
                (None, None) => unreachable!("clap enforces one image source"),
            }
            .or_else(|e| fail(e, Action::Registration))?;

            view.set_guardian_name(name);
            for id in students {
                if !view.is_selected(&id) {
                    view.toggle_student(id);
                }
            }

            let registered = view
                .register(api)
                .await
                .or_else(|e| fail(e, Action::Registration))?;
            println!("{}", registered.message);
            println!("Guardian: {} (ID: {})", registered.name, registered.guardian_id);
            println!("Students Associated:");
            for student in registered.students_associated {
                println!("  {} (ID: {})", student.name, student.id);
            }
        }

        Command::Verify { image } => {
            let mut view = VerificationClient::new(config.capture);
            match (image.image, image.snapshot) {
                (Some(path), _) => view.select_file(&path).await,
                (None, Some(path)) => match StillFrameSource::from_file(&path).await {
                    Ok(source) => view.capture(&source),
                    Err(e) => Err(ClientError::from(e)),
                },
                (None, None) => unreachable!("clap enforces one image source"),
            }
            .or_else(|e| fail(e, Action::Verification))?;

            match view.verify(api).await {
                VerificationOutcome::Matched(auth) => {
                    println!("Match Found!");
                    println!("Guardian: {} (ID: {})", auth.guardian_name, auth.guardian_id);
                    match auth.pickup_time() {
                        Some(ts) => println!(
                            "Pickup Time: {}",
                            ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
                        ),
                        None => println!("Pickup Time: {}", auth.pickup_log_time),
                    }
                    if auth.authorized_students.is_empty() {
                        println!("No students associated with this guardian.");
                    } else {
                        println!("Authorized Students:");
                        for student in &auth.authorized_students {
                            match &student.teacher_email {
                                Some(email) => println!(
                                    "  {} (ID: {}) - Teacher: {}",
                                    student.name, student.id, email
                                ),
                                None => println!("  {} (ID: {})", student.name, student.id),
                            }
                        }
                    }
                }
                VerificationOutcome::NoMatch { reason } => bail!("{}", reason),
                VerificationOutcome::Failed { message, .. } => bail!("Error: {}", message),
            }
        }
    }

    Ok(())
}

fn fail<T>(err: ClientError, action: Action) -> Result<T> {
    bail!("Error: {}", err.user_message(action))
}
