use std::time::Duration;

use relay_service::{FanoutMode, RelayHub};
use serde_json::{json, Value};

use super::support::{connect, next_text, send_text, start_relay_server, wait_for_connections};

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(300);

#[actix_rt::test]
async fn post_created_reaches_everyone_but_the_sender() {
    let hub = RelayHub::new();
    let (addr, handle) = start_relay_server(hub.clone(), FanoutMode::ExcludeSender)
        .await
        .expect("start relay server");

    let mut a = connect(addr, "/ws").await;
    let mut b = connect(addr, "/ws").await;
    let mut c = connect(addr, "/api/socket").await;
    wait_for_connections(&hub, 3).await;

    let post = json!({ "id": "p1", "content": "hello", "mood": "happy", "likes": 0 });
    send_text(
        &mut a,
        &json!({ "event": "post-created", "data": post }).to_string(),
    )
    .await;

    for client in [&mut b, &mut c] {
        let frame: Value = serde_json::from_str(&next_text(client, WAIT).await.expect("frame"))
            .unwrap();
        assert_eq!(frame, json!({ "event": "post-created", "data": post }));
        assert_eq!(next_text(client, QUIET).await, None, "exactly one frame");
    }
    assert_eq!(next_text(&mut a, QUIET).await, None, "sender gets no echo");

    handle.stop(true).await;
}

#[actix_rt::test]
async fn include_sender_mode_echoes() {
    let hub = RelayHub::new();
    let (addr, handle) = start_relay_server(hub.clone(), FanoutMode::IncludeSender)
        .await
        .expect("start relay server");

    let mut a = connect(addr, "/ws").await;
    let mut b = connect(addr, "/ws").await;
    wait_for_connections(&hub, 2).await;

    let frame = json!({ "event": "like-updated", "data": { "postId": "p1", "likes": 7 } });
    send_text(&mut a, &frame.to_string()).await;

    for client in [&mut a, &mut b] {
        let received: Value =
            serde_json::from_str(&next_text(client, WAIT).await.expect("frame")).unwrap();
        assert_eq!(received, frame);
    }

    handle.stop(true).await;
}

#[actix_rt::test]
async fn legacy_event_names_arrive_canonical() {
    let hub = RelayHub::new();
    let (addr, handle) = start_relay_server(hub.clone(), FanoutMode::ExcludeSender)
        .await
        .expect("start relay server");

    let mut a = connect(addr, "/api/socket").await;
    let mut b = connect(addr, "/api/socket").await;
    wait_for_connections(&hub, 2).await;

    send_text(
        &mut a,
        &json!({ "event": "new-comment", "data": { "postId": "p1", "comment": { "id": "c1" } } })
            .to_string(),
    )
    .await;

    let received: Value =
        serde_json::from_str(&next_text(&mut b, WAIT).await.expect("frame")).unwrap();
    assert_eq!(received["event"], "comment-created");
    assert_eq!(received["data"]["postId"], "p1");
    assert_eq!(received["data"]["comment"]["id"], "c1");

    handle.stop(true).await;
}

#[actix_rt::test]
async fn events_from_one_sender_keep_their_order() {
    let hub = RelayHub::new();
    let (addr, handle) = start_relay_server(hub.clone(), FanoutMode::ExcludeSender)
        .await
        .expect("start relay server");

    let mut a = connect(addr, "/ws").await;
    let mut b = connect(addr, "/ws").await;
    wait_for_connections(&hub, 2).await;

    for likes in 1..=5 {
        send_text(
            &mut a,
            &json!({ "event": "like-updated", "data": { "postId": "p1", "likes": likes } })
                .to_string(),
        )
        .await;
    }

    let mut seen = Vec::new();
    for _ in 0..5 {
        let frame: Value =
            serde_json::from_str(&next_text(&mut b, WAIT).await.expect("frame")).unwrap();
        seen.push(frame["data"]["likes"].as_i64().unwrap());
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);

    handle.stop(true).await;
}
