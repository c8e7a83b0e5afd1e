//! End-to-end tests: executor -> facade -> HTTP client -> mock device server.

mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use touchmap_core::action::{ActionLog, ActionResult, ActionType};
use touchmap_core::client::DeviceClient;
use touchmap_core::executor::ActionExecutor;
use touchmap_core::gestures::Gestures;
use touchmap_core::orientation::{Orientation, RotationDirection};
use touchmap_core::recording::RecordingStore;

async fn executor_for(server: &MockServer, recordings: &tempfile::TempDir) -> ActionExecutor {
    let client = DeviceClient::new(&server.uri()).unwrap();
    let store = RecordingStore::new(vec![recordings.path().to_path_buf()]);
    ActionExecutor::new(Gestures::new(Arc::new(client), store))
}

fn success(results: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"outcome": "SUCCESS", "results": results}))
}

#[tokio::test]
async fn scripted_session_over_http() {
    let server = MockServer::start().await;
    let recordings = common::recordings_dir();

    Mock::given(method("POST"))
        .and(path("/play"))
        .and(body_partial_json(json!({"events": "rotate_home_down"})))
        .respond_with(success(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/play"))
        .and(body_partial_json(json!({"events": "swipe_right"})))
        .respond_with(success(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/map"))
        .and(body_partial_json(json!({"query": "view {text == 'Inbox'}"})))
        .respond_with(success(json!([{"class": "UILabel", "text": "Inbox"}])))
        .expect(1)
        .mount(&server)
        .await;

    let mut executor = executor_for(&server, &recordings).await;
    let script = vec![
        ActionType::Rotate { direction: RotationDirection::Left },
        ActionType::Swipe { direction: Orientation::Up },
        ActionType::ScreenShouldContainText { text: "Inbox".into() },
    ];

    let mut log = Vec::new();
    for action in script {
        let result = executor.execute(action.clone()).await;
        assert!(result.success, "{}: {}", action.name(), result.message);
        log.push(ActionLog::new(action, ActionResult::Success, None, None));
    }
    assert_eq!(log.len(), 3);
    assert_eq!(executor.gestures().current_orientation(), 90);
}

#[tokio::test]
async fn http_failure_status_surfaces_in_result() {
    let server = MockServer::start().await;
    let recordings = common::recordings_dir();

    Mock::given(method("POST"))
        .and(path("/play"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut executor = executor_for(&server, &recordings).await;
    let result = executor.execute(ActionType::Touch { query: "button".into() }).await;
    assert!(!result.success);
    assert!(result.message.contains("device sent http status code 404"), "{}", result.message);
}

#[tokio::test]
async fn screenshot_on_failure_fetches_from_device() {
    let server = MockServer::start().await;
    let recordings = common::recordings_dir();

    Mock::given(method("POST"))
        .and(path("/map"))
        .respond_with(success(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/screenshot"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let mut executor = executor_for(&server, &recordings).await;
    executor.set_capture_screenshots(true);

    let result = executor
        .execute(ActionType::ScreenShouldContain { label: "Checkout".into() })
        .await;
    assert!(!result.success);
    assert_eq!(result.screenshot.as_deref(), Some("iVBORw=="));
}
