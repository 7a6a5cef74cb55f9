//! HTTP contract of the tracker: the pixel response never depends on the queue.

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use click_tracker::ingest::{self, pixel::PIXEL_GIF};
use click_tracker::AppState;
use durable_queue::MemoryQueue;
use std::sync::Arc;

macro_rules! tracker_app {
    ($queue:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new($queue.clone())))
                .configure(ingest::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_track_returns_pixel_and_enqueues_record() {
    let queue = Arc::new(MemoryQueue::new());
    let app = tracker_app!(queue);

    let req = test::TestRequest::get()
        .uri("/track?uniqueId=abc-123&sub1=s1&sub10=last&unknown=zzz")
        .insert_header(("x-forwarded-for", "203.0.113.50"))
        .insert_header(("user-agent", "Mozilla/5.0 (Test)"))
        .peer_addr("10.0.0.1:12345".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/gif"
    );
    let body = test::read_body(resp).await;
    assert_eq!(body.len(), 43);
    assert_eq!(&body[..], &PIXEL_GIF[..]);

    let entries = queue.snapshot().await;
    assert_eq!(entries.len(), 1);
    let record = click_event::decode(&entries[0]).unwrap();
    assert_eq!(record.attributes().unique_id(), "abc-123");
    assert_eq!(record.attributes().sub(1), "s1");
    assert_eq!(record.attributes().sub(10), "last");
    assert_eq!(record.attributes().sub(5), "");
    assert_eq!(record.client_ip(), "203.0.113.50");
    assert_eq!(record.user_agent(), "Mozilla/5.0 (Test)");
}

#[actix_web::test]
async fn test_track_without_parameters_or_headers() {
    let queue = Arc::new(MemoryQueue::new());
    let app = tracker_app!(queue);

    let req = test::TestRequest::get()
        .uri("/track")
        .peer_addr("192.0.2.10:443".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let record = click_event::decode(&queue.snapshot().await[0]).unwrap();
    assert!(record.attributes().iter().all(|(_, v)| v.is_empty()));
    assert_eq!(record.client_ip(), "192.0.2.10");
    assert_eq!(record.user_agent(), "");
}

#[actix_web::test]
async fn test_track_still_returns_pixel_when_queue_down() {
    let queue = Arc::new(MemoryQueue::new());
    queue.set_unavailable(true);
    let app = tracker_app!(queue);

    let req = test::TestRequest::get()
        .uri("/track?uniqueId=lost")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/gif"
    );
    assert_eq!(&test::read_body(resp).await[..], &PIXEL_GIF[..]);

    queue.set_unavailable(false);
    assert!(queue.snapshot().await.is_empty());
}

#[actix_web::test]
async fn test_each_click_gets_its_own_record() {
    let queue = Arc::new(MemoryQueue::new());
    let app = tracker_app!(queue);

    for i in 0..5 {
        let req = test::TestRequest::get()
            .uri(&format!("/track?uniqueId=u{}", i))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let records: Vec<_> = queue
        .snapshot()
        .await
        .iter()
        .map(|e| click_event::decode(e).unwrap())
        .collect();
    assert_eq!(records.len(), 5);

    let mut ids: Vec<_> = records.iter().map(|r| r.id()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);
}

#[actix_web::test]
async fn test_health_is_static() {
    let queue = Arc::new(MemoryQueue::new());
    queue.set_unavailable(true);
    let app = tracker_app!(queue);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}

#[actix_web::test]
async fn test_ready_reports_queue_depth() {
    let queue = Arc::new(MemoryQueue::with_entries(vec![b"a".to_vec(), b"b".to_vec()]));
    let app = tracker_app!(queue);

    let req = test::TestRequest::get().uri("/ready").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ready");
    assert_eq!(body["queue_depth"], 2);
}

#[actix_web::test]
async fn test_ready_unavailable_when_queue_down() {
    let queue = Arc::new(MemoryQueue::new());
    queue.set_unavailable(true);
    let app = tracker_app!(queue);

    let req = test::TestRequest::get().uri("/ready").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "unavailable");
}

#[actix_web::test]
async fn test_metrics_exposes_ingest_counter() {
    let queue = Arc::new(MemoryQueue::new());
    let app = tracker_app!(queue);

    let req = test::TestRequest::get().uri("/track").to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("click_tracker_ingest_total"));
}
