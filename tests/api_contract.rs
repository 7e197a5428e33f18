//! Client behaviour against a mocked backend.

use serde_json::json;
use tokio::io::AsyncReadExt;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use safe_pickup::capture::{encode_data_uri, CapturedImage, ImageOrigin};
use safe_pickup::client::{
    AddStudentForm, ApiClient, RegistrationClient, RosterClient, VerificationClient,
    VerificationOutcome,
};
use safe_pickup::common::config::CaptureConfig;
use safe_pickup::common::error::{Action, ClientError, ErrorKind};
use safe_pickup::common::messages::RecordId;

fn photo() -> CapturedImage {
    CapturedImage {
        data_uri: encode_data_uri(b"guardian-photo-bytes", "image/jpeg"),
        origin: ImageOrigin::File {
            file_name: "maria.jpg".to_string(),
        },
    }
}

fn api_for(server: &MockServer) -> ApiClient {
    ApiClient::new(server.uri()).unwrap()
}

/// A base URL on which nothing is listening.
fn unreachable_api() -> ApiClient {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ApiClient::new(format!("http://{}", addr)).unwrap()
}

/// A backend that accepts each connection, reads the request and hangs up without answering.
async fn silent_api() -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while let Ok(n) = socket.read(&mut buf).await {
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    });

    ApiClient::new(format!("http://{}", addr)).unwrap()
}

fn verification_view() -> VerificationClient {
    let mut view = VerificationClient::new(CaptureConfig::default());
    view.set_image(photo());
    view
}

#[tokio::test]
async fn verify_reports_a_match() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify_pickup"))
        .and(body_string_contains("filename=\"maria.jpg\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "match": true,
            "guardian_id": 3,
            "guardian_name": "Maria Lopez",
            "pickup_log_time": "2024-05-01T15:04:05.123456Z",
            "authorized_students": [
                {"id": 1, "name": "Alice", "teacher_email": "ms.park@school.org"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = verification_view();
    let outcome = view.verify(&api_for(&server)).await;

    let VerificationOutcome::Matched(auth) = outcome else {
        panic!("expected a match, got {:?}", outcome);
    };
    assert_eq!(auth.guardian_id, RecordId::Number(3));
    assert_eq!(auth.guardian_name, "Maria Lopez");
    assert_eq!(auth.authorized_students.len(), 1);
    assert!(auth.pickup_time().is_some());
    assert!(view.image().is_none());
}

#[tokio::test]
async fn verify_reads_no_match_from_ok_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify_pickup"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"match": false, "message": "No match found."})),
        )
        .mount(&server)
        .await;

    let outcome = verification_view().verify(&api_for(&server)).await;
    assert_eq!(
        outcome,
        VerificationOutcome::NoMatch {
            reason: "No match found.".to_string()
        }
    );
}

#[tokio::test]
async fn verify_reads_no_match_from_unauthorized_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify_pickup"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "match": false,
            "message": "No authorized guardian matched the provided image."
        })))
        .mount(&server)
        .await;

    let outcome = verification_view().verify(&api_for(&server)).await;
    assert_eq!(
        outcome,
        VerificationOutcome::NoMatch {
            reason: "No authorized guardian matched the provided image.".to_string()
        }
    );
}

#[tokio::test]
async fn verify_shows_server_error_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify_pickup"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "No registered guardians with face encodings found in the system."
        })))
        .mount(&server)
        .await;

    let mut view = verification_view();
    let outcome = view.verify(&api_for(&server)).await;

    assert_eq!(
        outcome,
        VerificationOutcome::Failed {
            kind: ErrorKind::Server,
            message: "No registered guardians with face encodings found in the system."
                .to_string()
        }
    );
    assert!(view.image().is_some(), "image is kept for a retry");
    assert!(view.can_submit());
}

#[tokio::test]
async fn bodiless_error_falls_back_to_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify_pickup"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = verification_view().verify(&api_for(&server)).await;
    assert_eq!(
        outcome,
        VerificationOutcome::Failed {
            kind: ErrorKind::Server,
            message: "Verification failed: Internal Server Error".to_string()
        }
    );
}

#[tokio::test]
async fn verify_without_image_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify_pickup"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut view = VerificationClient::new(CaptureConfig::default());
    let outcome = view.verify(&api_for(&server)).await;

    assert_eq!(
        outcome,
        VerificationOutcome::Failed {
            kind: ErrorKind::Validation,
            message: "Please capture an image first.".to_string()
        }
    );
}

#[tokio::test]
async fn unreachable_backend_is_a_connectivity_failure() {
    let api = unreachable_api();

    let outcome = verification_view().verify(&api).await;
    assert_eq!(
        outcome,
        VerificationOutcome::Failed {
            kind: ErrorKind::Connectivity,
            message: "Verification failed: Could not connect to the server.".to_string()
        }
    );

    let mut registration = RegistrationClient::new(CaptureConfig::default());
    registration.set_image(photo());
    registration.set_guardian_name("Maria Lopez");
    registration.toggle_student(RecordId::Number(1));
    let err = registration.register(&api).await.unwrap_err();
    assert_eq!(err, ClientError::Connectivity);
    assert_eq!(
        err.user_message(Action::Registration),
        "Registration failed: Could not connect to the server."
    );

    let mut form = AddStudentForm::new();
    form.set_name("Jane");
    let err = form.submit(&api).await.unwrap_err();
    assert_eq!(
        err.user_message(Action::AddStudent),
        "Failed to add student: Could not connect to the server."
    );
    assert_eq!(form.name(), "Jane");
}

#[tokio::test]
async fn dropped_response_is_a_connectivity_failure() {
    let api = silent_api().await;

    let outcome = verification_view().verify(&api).await;
    assert_eq!(
        outcome,
        VerificationOutcome::Failed {
            kind: ErrorKind::Connectivity,
            message: "Verification failed: Could not connect to the server.".to_string()
        }
    );

    let roster = RosterClient::mount(&api).await;
    assert!(roster.students().is_empty());
    assert_eq!(roster.load_error(), Some(ClientError::Connectivity));
}

#[tokio::test]
async fn registration_sends_multipart_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register_guardian"))
        .and(body_string_contains("name=\"name\"\r\n\r\nMaria Lopez"))
        .and(body_string_contains("name=\"student_ids\"\r\n\r\n4,1"))
        .and(body_string_contains("guardian-photo-bytes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Guardian registered successfully",
            "name": "Maria Lopez",
            "guardian_id": "g-7f3a",
            "students_associated": [
                {"id": 4, "name": "Dan"},
                {"id": 1, "name": "Alice"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = RegistrationClient::new(CaptureConfig::default());
    view.set_image(photo());
    view.set_guardian_name("  Maria Lopez ");
    view.toggle_student(RecordId::Number(4));
    view.toggle_student(RecordId::Number(1));

    let registered = view.register(&api_for(&server)).await.unwrap();
    assert_eq!(registered.guardian_id, RecordId::Text("g-7f3a".to_string()));
    assert_eq!(registered.students_associated.len(), 2);
    assert!(view.image().is_none());
}

#[tokio::test]
async fn registration_conflict_is_shown_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register_guardian"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "An image with this content (maria.jpg) already exists as a reference."
        })))
        .mount(&server)
        .await;

    let mut view = RegistrationClient::new(CaptureConfig::default());
    view.set_image(photo());
    view.set_guardian_name("Maria Lopez");
    view.toggle_student(RecordId::Number(1));

    let err = view.register(&api_for(&server)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(
        err.user_message(Action::Registration),
        "An image with this content (maria.jpg) already exists as a reference."
    );
    assert!(view.image().is_some());
}

#[tokio::test]
async fn add_student_success_clears_the_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/add_student"))
        .and(body_json(json!({"name": "Jane", "teacher_email": null})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"message": "ok", "name": "Jane", "student_id": 7})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut form = AddStudentForm::new();
    form.set_name(" Jane ");
    form.set_teacher_email("   ");

    let added = form.submit(&api_for(&server)).await.unwrap();
    assert_eq!(added.student_id, RecordId::Number(7));
    assert_eq!(form.name(), "");
    assert_eq!(form.teacher_email(), "");
    assert_eq!(form.state().succeeded(), Some(&added));
}

#[tokio::test]
async fn add_student_conflict_keeps_inputs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/add_student"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "Student with name 'Jane' already exists"
        })))
        .mount(&server)
        .await;

    let mut form = AddStudentForm::new();
    form.set_name("Jane");
    form.set_teacher_email("ms.park@school.org");

    let err = form.submit(&api_for(&server)).await.unwrap_err();
    assert_eq!(
        err.user_message(Action::AddStudent),
        "Student with name 'Jane' already exists"
    );
    assert_eq!(form.name(), "Jane");
    assert_eq!(form.teacher_email(), "ms.park@school.org");
}

#[tokio::test]
async fn roster_loads_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/students"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Alice"},
            {"id": "b0b", "name": "Bob", "teacher_email": "mr.lee@school.org"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut roster = RosterClient::mount(&api_for(&server)).await;
    assert_eq!(roster.students().len(), 2);
    assert!(roster.load_error().is_none());
    assert!(roster.visible().is_empty());

    roster.set_search("AL");
    let names: Vec<_> = roster.visible().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Alice"]);

    roster.set_search("b0");
    let names: Vec<_> = roster.visible().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Bob"]);
}

#[tokio::test]
async fn roster_failure_leaves_list_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/students"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut roster = RosterClient::mount(&api_for(&server)).await;
    roster.set_search("a");

    assert!(roster.students().is_empty());
    assert!(roster.visible().is_empty());
    assert_eq!(roster.load_error().map(|e| e.kind()), Some(ErrorKind::Server));
    assert_eq!(
        roster.load_error_message(),
        Some("Failed to load student list. Please try again later.")
    );
}
