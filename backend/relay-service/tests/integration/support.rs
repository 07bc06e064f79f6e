use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use actix_web::{dev::ServerHandle, web, App, HttpServer};
use actix_web_actors::ws::ProtocolError;
use awc::ws;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use relay_service::relay::HeartbeatConfig;
use relay_service::{routes, FanoutMode, RelayHub, RelayState};

/// Client side of a relay connection
pub trait WsConnection:
    Stream<Item = Result<ws::Frame, ProtocolError>> + Sink<ws::Message, Error = ProtocolError> + Unpin
{
}

impl<T> WsConnection for T where
    T: Stream<Item = Result<ws::Frame, ProtocolError>>
        + Sink<ws::Message, Error = ProtocolError>
        + Unpin
{
}

pub async fn start_relay_server(
    hub: RelayHub,
    fanout: FanoutMode,
) -> std::io::Result<(SocketAddr, ServerHandle)> {
    start_relay_server_with(hub, fanout, HeartbeatConfig::default()).await
}

pub async fn start_relay_server_with(
    hub: RelayHub,
    fanout: FanoutMode,
    heartbeat: HeartbeatConfig,
) -> std::io::Result<(SocketAddr, ServerHandle)> {
    let state = web::Data::new(RelayState {
        fanout,
        heartbeat,
        ..RelayState::new(hub)
    });

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .workers(1)
    .listen(listener)?
    .run();

    let handle = server.handle();
    actix_rt::spawn(server);
    Ok((addr, handle))
}

pub async fn connect(addr: SocketAddr, path: &str) -> impl WsConnection {
    let (_resp, connection) = awc::Client::new()
        .ws(format!("http://{addr}{path}"))
        .connect()
        .await
        .expect("connect websocket client");
    connection
}

pub async fn send_text(connection: &mut impl WsConnection, text: &str) {
    connection
        .send(ws::Message::Text(text.to_string().into()))
        .await
        .expect("send frame");
}

/// Next text frame, skipping pings; `None` if nothing arrives in time
pub async fn next_text(connection: &mut impl WsConnection, wait: Duration) -> Option<String> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let frame = tokio::time::timeout_at(deadline, connection.next())
            .await
            .ok()??
            .expect("frame data");
        match frame {
            ws::Frame::Text(bytes) => return Some(String::from_utf8(bytes.to_vec()).unwrap()),
            ws::Frame::Ping(payload) => {
                connection
                    .send(ws::Message::Pong(payload))
                    .await
                    .expect("send pong");
            }
            ws::Frame::Close(_) => return None,
            _ => {}
        }
    }
}

/// Sessions register before the handshake answers, but give the server a
/// moment for disconnect bookkeeping
pub async fn wait_for_connections(hub: &RelayHub, expected: usize) {
    for _ in 0..100 {
        if hub.connection_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {expected} connections, hub has {}",
        hub.connection_count()
    );
}

pub async fn error_disconnects(addr: SocketAddr) -> u64 {
    let mut resp = awc::Client::new()
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .expect("health request");
    let body: serde_json::Value = resp.json().await.expect("health body");
    body["errorDisconnects"].as_u64().expect("errorDisconnects")
}
