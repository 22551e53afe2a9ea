//! Integration tests for the Axum web server.
//!
//! These drive the router in-process against a scripted backend.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;

use common::{TestApp, WAIT, json_body, wait_for};
use fetchq_axum::bootstrap::CorsConfig;
use fetchq_core::{JobId, JobStatus, ProbeOutput, TransferTarget};
use fetchq_download::testing::{AutoWorker, ScriptedBackend};

const PROGRESS_OUTPUT: &str = "[youtube] abc: Downloading webpage\n\
[download]  42.0% of 1.00MiB at 512.00KiB/s ETA 00:01\n\
[download] 100% of 1.00MiB in 00:02\n";

fn start_body(id: &str) -> serde_json::Value {
    serde_json::json!({ "id": id, "videoId": "abc", "quality": "720" })
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let app = TestApp::new(ScriptedBackend::new());

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn start_without_parameters_is_rejected() {
    let app = TestApp::new(ScriptedBackend::new());

    let (status, body) = json_body(
        app.post_json("/api/queue/start", serde_json::json!({ "videoId": "abc" }))
            .await,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required parameters");
    assert_eq!(body["status"], 400);
    assert!(app.backend.probe_calls().is_empty());
}

#[tokio::test]
async fn start_with_unknown_quality_is_rejected() {
    let app = TestApp::new(ScriptedBackend::new());

    let body = serde_json::json!({ "id": "a", "videoId": "abc", "quality": "4k" });
    let (status, body) = json_body(app.post_json("/api/queue/start", body).await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("4k"));
    assert_eq!(app.scheduler.list().await.jobs.len(), 0);
}

#[tokio::test]
async fn queued_job_runs_to_completion() {
    let app = TestApp::new(
        ScriptedBackend::new().with_auto_worker(AutoWorker::new(PROGRESS_OUTPUT, 0)),
    );
    let mut sub = app.subscribe().await;

    let (status, body) = json_body(app.post_json("/api/queue/start", start_body("job-1")).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["downloadId"], "job-1");

    let done = wait_for(&mut sub, "job-1", JobStatus::Completed).await;
    assert!((done.progress - 100.0).abs() < f64::EPSILON);

    let (status, listing) = json_body(app.get("/api/queue").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["downloads"][0]["id"], "job-1");
    assert_eq!(listing["downloads"][0]["status"], "completed");
    assert_eq!(listing["stats"]["totalProgress"], 100.0);

    let requests = app.backend.transfer_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://www.youtube.com/watch?v=abc");
    match &requests[0].target {
        TransferTarget::File { template } => assert!(template.starts_with(&app.downloads_dir)),
        TransferTarget::Stdout => panic!("queued job must write to disk"),
    }
}

#[tokio::test]
async fn duplicate_live_submission_conflicts() {
    let app = TestApp::new(ScriptedBackend::new());
    let mut sub = app.subscribe().await;

    let response = app.post_json("/api/queue/start", start_body("job-1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let _worker = tokio::time::timeout(WAIT, app.backend.next_worker())
        .await
        .unwrap();
    wait_for(&mut sub, "job-1", JobStatus::Downloading).await;

    let (status, body) = json_body(app.post_json("/api/queue/start", start_body("job-1")).await).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Download already in progress");
}

#[tokio::test]
async fn controls_on_unknown_ids_succeed() {
    let app = TestApp::new(ScriptedBackend::new());

    for (uri, message) in [
        ("/api/queue/pause/missing", "Download paused"),
        ("/api/queue/resume/missing", "Download resumed"),
        ("/api/queue/cancel/missing", "Download cancelled"),
    ] {
        let (status, body) = json_body(app.post(uri).await).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn pause_and_cancel_running_job() {
    let app = TestApp::new(ScriptedBackend::new());
    let mut sub = app.subscribe().await;

    app.post_json("/api/queue/start", start_body("job-1")).await;
    let _worker = tokio::time::timeout(WAIT, app.backend.next_worker())
        .await
        .unwrap();
    wait_for(&mut sub, "job-1", JobStatus::Downloading).await;

    let (status, _) = json_body(app.post("/api/queue/pause/job-1").await).await;
    assert_eq!(status, StatusCode::OK);
    wait_for(&mut sub, "job-1", JobStatus::Paused).await;

    let (status, _) = json_body(app.post("/api/queue/cancel/job-1").await).await;
    assert_eq!(status, StatusCode::OK);
    wait_for(&mut sub, "job-1", JobStatus::Cancelled).await;

    assert_eq!(app.backend.shutdown_count(), 1);
    assert!(app.scheduler.snapshot(&JobId::new("job-1")).await.is_none());
}

#[tokio::test]
async fn bulk_controls_and_cleanup() {
    let app = TestApp::new(ScriptedBackend::new());

    app.post_json("/api/queue/start", start_body("job-1")).await;
    app.post_json("/api/queue/start", start_body("job-2")).await;
    let _worker = tokio::time::timeout(WAIT, app.backend.next_worker())
        .await
        .unwrap();

    let (_, body) = json_body(app.post("/api/queue/pause-all").await).await;
    assert_eq!(body["message"], "All downloads paused");
    let (_, body) = json_body(app.post("/api/queue/resume-all").await).await;
    assert_eq!(body["message"], "All downloads resumed");

    let (status, body) = json_body(app.post("/api/queue/cleanup").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 2);
    assert_eq!(body["message"], "Cleaned up 2 downloads");

    let (_, listing) = json_body(app.get("/api/queue").await).await;
    assert_eq!(listing["downloads"].as_array().unwrap().len(), 0);
    assert_eq!(listing["stats"]["totalProgress"], 0.0);
}

#[tokio::test]
async fn progress_stream_opens_with_retry_hint_and_ack() {
    let app = TestApp::new(ScriptedBackend::new());

    let response = app.get("/api/queue/progress").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"))
    );
    assert_eq!(app.broadcast.subscriber_count(), 1);

    let mut body = response.into_body();
    let frame = tokio::time::timeout(WAIT, body.frame())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("retry:") && text.contains("3000"), "{text}");
    assert!(text.contains(r#"data: {"type":"connected"}"#), "{text}");

    drop(body);
    assert_eq!(app.broadcast.subscriber_count(), 0);
}

#[tokio::test]
async fn progress_stream_carries_job_snapshots() {
    let app = TestApp::new(ScriptedBackend::new());
    let mut body = app.get("/api/queue/progress").await.into_body();

    app.post_json("/api/queue/start", start_body("job-1")).await;

    let mut seen = String::new();
    while !seen.contains(r#""status":"pending""#) {
        let frame = tokio::time::timeout(WAIT, body.frame())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Ok(data) = frame.into_data() {
            seen.push_str(&String::from_utf8_lossy(&data));
        }
    }
    assert!(seen.contains(r#""id":"job-1""#));
}

#[tokio::test]
async fn direct_download_streams_worker_output() {
    let media = b"not really an mp4";
    let backend = ScriptedBackend::new()
        .with_probe(|_| {
            Some(ProbeOutput {
                filename: "Live: Best/Set 2024.mp4".to_string(),
                size_bytes: Some(17),
            })
        })
        .with_auto_worker(AutoWorker::new(media.to_vec(), 0));
    let app = TestApp::new(backend);

    let response = app.get("/api/download?videoId=abc&quality=480").await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(headers[header::CONTENT_LENGTH], "17");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        r#"attachment; filename="Live_ Best_Set 2024.mp4""#
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], media);

    let requests = app.backend.transfer_requests();
    assert_eq!(requests[0].target, TransferTarget::Stdout);
    assert_eq!(requests[0].selector, "best[height<=480][ext=mp4]");
}

#[tokio::test]
async fn direct_download_without_size_omits_content_length() {
    let backend = ScriptedBackend::new()
        .with_probe(|_| {
            Some(ProbeOutput {
                filename: "clip.webm".to_string(),
                size_bytes: None,
            })
        })
        .with_auto_worker(AutoWorker::new(b"bytes".to_vec(), 0));
    let app = TestApp::new(backend);

    let response = app.get("/api/download?videoId=abc&quality=720p").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
}

#[tokio::test]
async fn direct_download_failing_worker_errors_the_body() {
    let backend = ScriptedBackend::new().with_auto_worker(
        AutoWorker::new(b"partial".to_vec(), 1).with_stderr("ERROR: HTTP Error 403: Forbidden\n"),
    );
    let app = TestApp::new(backend);

    let response = app.get("/api/download?videoId=abc&quality=360").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.into_body().collect().await.is_err());
}

#[tokio::test]
async fn direct_download_without_viable_format_is_unprocessable() {
    let app = TestApp::new(ScriptedBackend::new().with_probe(|_| None));

    let (status, body) = json_body(app.get("/api/download?videoId=abc&quality=1080").await).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("1080p"));
    assert!(app.backend.transfer_requests().is_empty());
}

#[tokio::test]
async fn direct_download_requires_quality() {
    let app = TestApp::new(ScriptedBackend::new());

    let (status, _) = json_body(app.get("/api/download?videoId=abc").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.backend.probe_calls().is_empty());
}

#[tokio::test]
async fn video_info_reports_exact_sizes_or_unavailable() {
    let backend = ScriptedBackend::new().with_probe(|selector| {
        let size = if selector.contains("1080") {
            47_395_635
        } else if selector.contains("720") {
            1_572_864
        } else {
            return None;
        };
        Some(ProbeOutput {
            filename: "clip.mp4".to_string(),
            size_bytes: Some(size),
        })
    });
    let app = TestApp::new(backend);

    let (status, body) = json_body(app.get("/api/video-info?videoId=abc").await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["sizes"],
        serde_json::json!({ "1080": "45.2 MB", "720": "1.5 MB" })
    );
    assert_eq!(body["unavailable"], serde_json::json!(["480", "360"]));
}

#[tokio::test]
async fn video_info_requires_video_id() {
    let app = TestApp::new(ScriptedBackend::new());

    let (status, body) = json_body(app.get("/api/video-info").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn downloads_folder_is_created_on_request() {
    let app = TestApp::new(ScriptedBackend::new());
    assert!(!app.downloads_dir.exists());

    let (status, body) = json_body(app.get("/api/downloads/folder").await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["path"], app.downloads_dir.display().to_string());
    assert!(app.downloads_dir.is_dir());
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let app = TestApp::with_cors(
        ScriptedBackend::new(),
        &CorsConfig::AllowOrigins(vec!["http://localhost:5173".to_string()]),
    );

    let response = app
        .send(
            Request::builder()
                .uri("/api/queue")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn unknown_api_route_is_not_found() {
    let app = TestApp::new(ScriptedBackend::new());

    let response = app.get("/api/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
