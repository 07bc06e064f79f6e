use std::time::Duration;

use awc::ws;
use futures_util::SinkExt;
use relay_service::relay::HeartbeatConfig;
use relay_service::{FanoutMode, RelayHub};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::support::{
    connect, error_disconnects, next_text, send_text, start_relay_server,
    start_relay_server_with, wait_for_connections,
};

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(300);

#[actix_rt::test]
async fn malformed_frames_are_dropped_and_connection_survives() {
    let hub = RelayHub::new();
    let (addr, handle) = start_relay_server(hub.clone(), FanoutMode::ExcludeSender)
        .await
        .expect("start relay server");

    let mut a = connect(addr, "/ws").await;
    let mut b = connect(addr, "/ws").await;
    wait_for_connections(&hub, 2).await;

    send_text(&mut a, "definitely not json").await;
    send_text(&mut a, &json!({ "event": "post-deleted", "data": {} }).to_string()).await;
    send_text(
        &mut a,
        &json!({ "event": "like-updated", "data": { "postId": "p1" } }).to_string(),
    )
    .await;
    a.send(ws::Message::Binary(vec![1u8, 2, 3].into()))
        .await
        .expect("send binary");

    assert_eq!(next_text(&mut b, QUIET).await, None);
    assert_eq!(hub.connection_count(), 2);

    // Same connection still relays valid events
    send_text(
        &mut a,
        &json!({ "event": "post-created", "data": { "id": "p2" } }).to_string(),
    )
    .await;
    let frame: Value =
        serde_json::from_str(&next_text(&mut b, WAIT).await.expect("frame")).unwrap();
    assert_eq!(frame["data"]["id"], "p2");

    handle.stop(true).await;
}

#[actix_rt::test]
async fn disconnected_clients_stop_being_targets() {
    let hub = RelayHub::new();
    let (addr, handle) = start_relay_server(hub.clone(), FanoutMode::ExcludeSender)
        .await
        .expect("start relay server");

    let mut a = connect(addr, "/ws").await;
    let mut b = connect(addr, "/ws").await;
    let mut c = connect(addr, "/ws").await;
    wait_for_connections(&hub, 3).await;

    c.send(ws::Message::Close(None)).await.expect("send close");
    drop(c);
    wait_for_connections(&hub, 2).await;

    send_text(
        &mut a,
        &json!({ "event": "post-created", "data": { "id": "p3" } }).to_string(),
    )
    .await;
    assert!(next_text(&mut b, WAIT).await.is_some());
    assert_eq!(hub.connection_count(), 2);

    drop(b);
    wait_for_connections(&hub, 1).await;

    handle.stop(true).await;
}

#[actix_rt::test]
async fn health_reports_live_connections() {
    let hub = RelayHub::new();
    let (addr, handle) = start_relay_server(hub.clone(), FanoutMode::ExcludeSender)
        .await
        .expect("start relay server");

    let _a = connect(addr, "/ws").await;
    wait_for_connections(&hub, 1).await;

    let mut resp = awc::Client::new()
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .expect("health request");
    let body: Value = resp.json().await.expect("health body");

    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], 1);
    assert!(body["errorDisconnects"].is_u64());

    handle.stop(true).await;
}

#[actix_rt::test]
async fn silent_client_is_dropped_without_affecting_others() {
    let hub = RelayHub::new();
    let heartbeat = HeartbeatConfig {
        interval: Duration::from_millis(50),
        client_timeout: Duration::from_millis(200),
    };
    let (addr, handle) = start_relay_server_with(hub.clone(), FanoutMode::ExcludeSender, heartbeat)
        .await
        .expect("start relay server");
    let errors_before = error_disconnects(addr).await;

    let mut a = connect(addr, "/ws").await;
    let mut b = connect(addr, "/ws").await;
    // Never read, so its pings go unanswered
    let silent = connect(addr, "/ws").await;
    wait_for_connections(&hub, 3).await;

    // A and B answer pings while C times out
    let mut polls = 0;
    while hub.connection_count() > 2 {
        assert!(polls < 50, "silent client was never dropped");
        next_text(&mut a, Duration::from_millis(20)).await;
        next_text(&mut b, Duration::from_millis(20)).await;
        polls += 1;
    }
    assert_eq!(hub.connection_count(), 2);
    assert!(error_disconnects(addr).await > errors_before);

    send_text(
        &mut a,
        &json!({ "event": "post-created", "data": { "id": "p1" } }).to_string(),
    )
    .await;
    let frame: Value =
        serde_json::from_str(&next_text(&mut b, WAIT).await.expect("frame")).unwrap();
    assert_eq!(frame["event"], "post-created");
    assert_eq!(frame["data"]["id"], "p1");

    drop(silent);
    handle.stop(true).await;
}

#[actix_rt::test]
async fn protocol_error_disconnects_only_that_client() {
    let hub = RelayHub::new();
    let (addr, handle) = start_relay_server(hub.clone(), FanoutMode::ExcludeSender)
        .await
        .expect("start relay server");
    let errors_before = error_disconnects(addr).await;

    let mut a = connect(addr, "/ws").await;
    let mut b = connect(addr, "/ws").await;

    let mut raw = TcpStream::connect(addr).await.expect("raw connect");
    let upgrade = format!(
        "GET /ws HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n"
    );
    raw.write_all(upgrade.as_bytes()).await.expect("send upgrade");

    let mut response = Vec::new();
    let mut buf = [0u8; 512];
    while !response.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = tokio::time::timeout(WAIT, raw.read(&mut buf))
            .await
            .expect("upgrade response in time")
            .expect("read upgrade response");
        assert!(n > 0, "connection closed during upgrade");
        response.extend_from_slice(&buf[..n]);
    }
    assert!(String::from_utf8_lossy(&response).starts_with("HTTP/1.1 101"));
    wait_for_connections(&hub, 3).await;

    // Client frames must be masked; this one is not
    raw.write_all(&[0x81, 0x02, b'h', b'i'])
        .await
        .expect("send unmasked frame");

    wait_for_connections(&hub, 2).await;
    assert!(error_disconnects(addr).await > errors_before);

    send_text(
        &mut a,
        &json!({ "event": "like-updated", "data": { "postId": "p1", "likes": 3 } }).to_string(),
    )
    .await;
    let frame: Value =
        serde_json::from_str(&next_text(&mut b, WAIT).await.expect("frame")).unwrap();
    assert_eq!(frame["event"], "like-updated");
    assert_eq!(frame["data"]["likes"], 3);

    handle.stop(true).await;
}
