mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use futures::StreamExt;

use blink_trigger::blink::{BlinkEvent, Observation};
use common::app::{spawn_test_app, spawn_with_sse_limit};
use common::http::{assert_json_error, read_sse_until, request, response_json};

#[tokio::test]
async fn it_sse_endpoint_is_reachable() {
    let app = spawn_test_app();

    let response = request(&app.app, Method::GET, "/api/realtime/events", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("text/event-stream"));
}

#[tokio::test]
async fn it_sse_sends_stats_then_blinks() {
    let app = spawn_test_app();
    app.state
        .session()
        .observe(Some(Observation::EyeCount(0)))
        .await;

    let response = request(&app.app, Method::GET, "/api/realtime/events", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut body = response.into_body().into_data_stream();

    let stats = read_sse_until(&mut body, "\n\n").await;
    assert!(stats.contains("event: stats"), "{stats}");
    assert!(stats.contains("\"closedRunLength\":1"), "{stats}");

    app.state.publish(BlinkEvent { blink_number: 7 });
    let blink = read_sse_until(&mut body, "\"blinkNumber\":7").await;
    assert!(blink.contains("event: blink"), "{blink}");
    assert!(blink.contains(&app.state.session().id().to_string()), "{blink}");
}

#[tokio::test]
async fn it_sse_closes_on_shutdown() {
    let app = spawn_test_app();

    let response = request(&app.app, Method::GET, "/api/realtime/events", None).await;
    let mut body = response.into_body().into_data_stream();
    read_sse_until(&mut body, "event: stats").await;

    app.state.shutdown_tx().send(()).unwrap();

    let end = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(chunk) = body.next().await {
            chunk.expect("sse chunk");
        }
    })
    .await;
    assert!(end.is_ok(), "stream did not close after shutdown");
}

#[tokio::test]
async fn it_sse_rejects_over_limit() {
    let app = spawn_with_sse_limit(0);

    let response = request(&app.app, Method::GET, "/api/realtime/events", None).await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_json_error(&body, "RATE_LIMITED");
}

#[tokio::test]
async fn it_sse_slot_is_released_when_client_leaves() {
    let app = spawn_with_sse_limit(1);

    let first = request(&app.app, Method::GET, "/api/realtime/events", None).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = request(&app.app, Method::GET, "/api/realtime/events", None).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    drop(first);
    let third = request(&app.app, Method::GET, "/api/realtime/events", None).await;
    assert_eq!(third.status(), StatusCode::OK);
}

#[tokio::test]
async fn it_sse_limit_is_per_app() {
    let full = spawn_with_sse_limit(1);
    let _held = request(&full.app, Method::GET, "/api/realtime/events", None).await;

    let other = spawn_with_sse_limit(1);
    let response = request(&other.app, Method::GET, "/api/realtime/events", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
