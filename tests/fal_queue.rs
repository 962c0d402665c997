//! Integration tests for the fal.ai queue client against a mock backend.

use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;
use vidgen::model::ModelId;
use vidgen::normalize::{normalize_generation, normalize_status};
use vidgen::translate::{translate, TranslatedCall};
use vidgen::{FalClient, VidGenError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const LUMA_ENDPOINT: &str = "fal-ai/luma-dream-machine/ray-2-flash/image-to-video";
const KLING_ENDPOINT: &str = "fal-ai/kling-video/v1.6/pro/image-to-video";

fn test_client(server: &MockServer) -> FalClient {
    FalClient::builder()
        .api_key("test-key")
        .queue_url(server.uri())
        .poll_interval(Duration::from_millis(10))
        .build()
}

/// Matches only requests whose JSON body carries no `model` field.
struct NoModelField;

impl Match for NoModelField {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .map(|body| body.get("model").is_none())
            .unwrap_or(false)
    }
}

/// Mounts the submit → status → result chain for one job.
async fn mount_generation(
    server: &MockServer,
    endpoint: &str,
    request_id: &str,
    in_progress_logs: Value,
    result: Value,
) {
    let status_path = format!("/{}/requests/{}/status", endpoint, request_id);
    let result_path = format!("/{}/requests/{}", endpoint, request_id);

    Mock::given(method("POST"))
        .and(path(format!("/{}", endpoint)))
        .and(NoModelField)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": request_id,
            "status_url": format!("{}{}", server.uri(), status_path),
            "response_url": format!("{}{}", server.uri(), result_path),
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(status_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "IN_PROGRESS",
            "logs": in_progress_logs,
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(status_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "COMPLETED" })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(result_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(result))
        .mount(server)
        .await;
}

#[tokio::test]
async fn generate_flow_yields_video_url_and_progress() {
    let server = MockServer::start().await;
    mount_generation(
        &server,
        LUMA_ENDPOINT,
        "req-1",
        json!(["warming up", {"message": "rendering frames"}, {"level": "INFO"}]),
        json!({"video": {"url": "https://fal.media/files/out.mp4"}}),
    )
    .await;

    let client = test_client(&server);
    let call = translate(
        "generate-video",
        json!({"prompt": "a lighthouse in fog", "model": "luma"}),
    )
    .unwrap();
    let TranslatedCall::Generate { model, payload } = call else {
        panic!("expected generate");
    };

    let seen = Mutex::new(Vec::new());
    let sink = |line: &str| seen.lock().unwrap().push(line.to_string());

    let submitted = client
        .subscribe(model.endpoint(), &payload, &sink)
        .await
        .unwrap();

    assert_eq!(submitted.request_id, "req-1");

    let envelope = normalize_generation(model, &submitted.result, Some(&submitted.request_id));
    assert_eq!(envelope.video_url, "https://fal.media/files/out.mp4");
    assert_eq!(envelope.request_id, "req-1");
    assert_eq!(
        envelope.message,
        "Video generated successfully using luma model"
    );

    // Progress arrived in order; the message-less object was dropped.
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["warming up", "rendering frames"]
    );
}

#[tokio::test]
async fn nested_result_shape_is_normalized() {
    let server = MockServer::start().await;
    mount_generation(
        &server,
        KLING_ENDPOINT,
        "req-2",
        json!([]),
        json!({"data": {"video": {"url": "https://fal.media/files/nested.mp4"}}}),
    )
    .await;

    let client = test_client(&server);
    let sink = |_: &str| {};
    let submitted = client
        .subscribe(KLING_ENDPOINT, &json!({"prompt": "x"}), &sink)
        .await
        .unwrap();

    let envelope = normalize_generation(ModelId::Kling, &submitted.result, None);
    assert_eq!(envelope.video_url, "https://fal.media/files/nested.mp4");
}

#[tokio::test]
async fn stale_response_url_falls_back_to_endpoint_url() {
    let server = MockServer::start().await;
    let status_path = format!("/{}/requests/req-fb/status", LUMA_ENDPOINT);
    let result_path = format!("/{}/requests/req-fb", LUMA_ENDPOINT);

    // The queue hands out a response_url that turns out to be a 404.
    Mock::given(method("POST"))
        .and(path(format!("/{}", LUMA_ENDPOINT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-fb",
            "status_url": format!("{}{}", server.uri(), status_path),
            "response_url": format!("{}/stale/requests/req-fb", server.uri()),
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(status_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "COMPLETED" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/stale/requests/req-fb"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(result_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"video": {"url": "https://fal.media/files/fb.mp4"}}),
        ))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let sink = |_: &str| {};
    let submitted = client
        .subscribe(LUMA_ENDPOINT, &json!({"prompt": "x"}), &sink)
        .await
        .unwrap();

    let envelope = normalize_generation(ModelId::Luma, &submitted.result, None);
    assert_eq!(envelope.video_url, "https://fal.media/files/fb.mp4");
}

#[tokio::test]
async fn failed_job_is_a_terminal_fault() {
    let server = MockServer::start().await;
    let status_path = format!("/{}/requests/req-3/status", LUMA_ENDPOINT);

    Mock::given(method("POST"))
        .and(path(format!("/{}", LUMA_ENDPOINT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-3",
            "status_url": format!("{}{}", server.uri(), status_path),
            "response_url": format!("{}/{}/requests/req-3", server.uri(), LUMA_ENDPOINT),
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(status_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "FAILED" })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let sink = |_: &str| {};
    let err = client
        .subscribe(LUMA_ENDPOINT, &json!({"prompt": "x"}), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, VidGenError::Generation(_)));
}

#[tokio::test]
async fn rejected_submission_preserves_backend_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{}", LUMA_ENDPOINT)))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"detail": "prompt too long"})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let sink = |_: &str| {};
    let err = client
        .subscribe(LUMA_ENDPOINT, &json!({"prompt": "x"}), &sink)
        .await
        .unwrap_err();

    match err {
        VidGenError::Api { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "prompt too long");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn status_check_is_a_single_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{}/requests/req-4/status", KLING_ENDPOINT)))
        .and(query_param("logs", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "IN_QUEUE",
            "logs": ["accepted"],
            "queue_position": 3,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let raw = client.status(KLING_ENDPOINT, "req-4").await.unwrap();
    let envelope = normalize_status(ModelId::Kling, &raw);

    assert_eq!(envelope.status, "IN_QUEUE");
    assert_eq!(envelope.logs, vec!["accepted"]);
    // `position` was absent; `queue_position` supplied the value.
    assert_eq!(envelope.position, 3);
}

#[tokio::test]
async fn unknown_request_id_is_never_a_silent_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/{}/requests/no-such-id/status",
            LUMA_ENDPOINT
        )))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Request not found"})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .status(LUMA_ENDPOINT, "no-such-id")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Request not found"));
}

#[tokio::test]
async fn auth_failure_only_surfaces_when_a_call_is_attempted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{}", LUMA_ENDPOINT)))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Unauthorized"})),
        )
        .mount(&server)
        .await;

    // Construction without a key succeeds.
    let client = FalClient::builder()
        .queue_url(server.uri())
        .poll_interval(Duration::from_millis(10))
        .build();

    let sink = |_: &str| {};
    let err = client
        .subscribe(LUMA_ENDPOINT, &json!({"prompt": "x"}), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, VidGenError::Auth(_)));
}

#[tokio::test]
async fn concurrent_generations_proceed_independently() {
    let server = MockServer::start().await;
    mount_generation(
        &server,
        LUMA_ENDPOINT,
        "req-luma",
        json!(["luma step 1", "luma step 2"]),
        json!({"video": {"url": "https://fal.media/files/luma.mp4"}}),
    )
    .await;
    mount_generation(
        &server,
        KLING_ENDPOINT,
        "req-kling",
        json!(["kling step 1"]),
        json!({"video": {"url": "https://fal.media/files/kling.mp4"}}),
    )
    .await;

    let client = test_client(&server);

    let luma_seen = Mutex::new(Vec::new());
    let luma_sink = |line: &str| luma_seen.lock().unwrap().push(line.to_string());
    let kling_seen = Mutex::new(Vec::new());
    let kling_sink = |line: &str| kling_seen.lock().unwrap().push(line.to_string());

    let luma_payload = json!({"prompt": "sunrise"});
    let kling_payload = json!({"prompt": "sunset"});
    let (luma, kling) = tokio::join!(
        client.subscribe(LUMA_ENDPOINT, &luma_payload, &luma_sink),
        client.subscribe(KLING_ENDPOINT, &kling_payload, &kling_sink),
    );

    let luma = luma.unwrap();
    let kling = kling.unwrap();

    // Each call got its own result and its own progress stream.
    assert_eq!(luma.request_id, "req-luma");
    assert_eq!(kling.request_id, "req-kling");
    assert_eq!(
        normalize_generation(ModelId::Luma, &luma.result, None).video_url,
        "https://fal.media/files/luma.mp4"
    );
    assert_eq!(
        normalize_generation(ModelId::Kling, &kling.result, None).video_url,
        "https://fal.media/files/kling.mp4"
    );
    assert_eq!(*luma_seen.lock().unwrap(), vec!["luma step 1", "luma step 2"]);
    assert_eq!(*kling_seen.lock().unwrap(), vec!["kling step 1"]);
}
