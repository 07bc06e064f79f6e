use actix::{Actor, ActorContext, AsyncContext, StreamHandler};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{ConnectionId, FanoutMode, RelayEvent, RelayHub};
use crate::metrics;

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// How often the server pings
    pub interval: Duration,
    /// Silence after which the client is considered gone
    pub client_timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            client_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Close frame or end of stream
    Clean,
    /// Protocol error or heartbeat timeout
    Error,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Clean => "clean",
            DisconnectReason::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Connected,
    Disconnected(DisconnectReason),
}

/// One WebSocket connection
///
/// The route registers the connection with the hub before the upgrade
/// completes and hands the receiver over; the session forwards whatever
/// arrives on it to the socket and unregisters when it stops.
pub struct WsSession {
    id: ConnectionId,
    hub: RelayHub,
    fanout: FanoutMode,
    heartbeat: HeartbeatConfig,
    hb: Instant,
    state: SessionState,
    outbound: Option<UnboundedReceiver<String>>,
}

impl WsSession {
    pub fn new(
        id: ConnectionId,
        outbound: UnboundedReceiver<String>,
        hub: RelayHub,
        fanout: FanoutMode,
        heartbeat: HeartbeatConfig,
    ) -> Self {
        Self {
            id,
            hub,
            fanout,
            heartbeat,
            hb: Instant::now(),
            state: SessionState::Connecting,
            outbound: Some(outbound),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let HeartbeatConfig {
            interval,
            client_timeout,
        } = self.heartbeat;

        ctx.run_interval(interval, move |act, ctx| {
            if Instant::now().duration_since(act.hb) > client_timeout {
                tracing::warn!(connection_id = %act.id, "Heartbeat timed out, disconnecting");
                act.disconnect(DisconnectReason::Error, ctx);
                return;
            }
            ctx.ping(b"");
        });
    }

    fn disconnect(&mut self, reason: DisconnectReason, ctx: &mut ws::WebsocketContext<Self>) {
        if self.state == SessionState::Connected {
            self.state = SessionState::Disconnected(reason);
        }
        ctx.stop();
    }

    /// Decode, re-encode canonically and fan out one inbound frame
    fn relay(&self, text: &str) {
        let event = match RelayEvent::decode(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(connection_id = %self.id, error = %e, "Dropping inbound frame");
                metrics::record_dropped_frame("invalid");
                return;
            }
        };

        let frame = match event.encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(connection_id = %self.id, error = %e, "Dropping inbound frame");
                metrics::record_dropped_frame("invalid");
                return;
            }
        };

        let delivered = self.hub.broadcast(self.id, &frame, self.fanout);
        metrics::record_event(event.kind());

        tracing::info!(
            connection_id = %self.id,
            kind = %event.kind(),
            post_id = event.post_id().unwrap_or("-"),
            delivered,
            "Relayed event"
        );
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        if let Some(rx) = self.outbound.take() {
            ctx.add_stream(UnboundedReceiverStream::new(rx));
        }
        self.state = SessionState::Connected;
        self.hb(ctx);

        tracing::info!(
            connection_id = %self.id,
            connections = self.hub.connection_count(),
            "Client connected"
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let reason = match self.state {
            SessionState::Disconnected(reason) => reason,
            _ => DisconnectReason::Clean,
        };
        self.state = SessionState::Disconnected(reason);
        metrics::record_disconnect(reason);
        self.hub.unregister(self.id);

        tracing::info!(
            connection_id = %self.id,
            reason = reason.as_str(),
            connections = self.hub.connection_count(),
            "Client disconnected"
        );
    }
}

/// Frames fanned out by other sessions
impl StreamHandler<String> for WsSession {
    fn handle(&mut self, frame: String, ctx: &mut Self::Context) {
        ctx.text(frame);
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        // The hub dropped our sender, so nothing more can reach this client
        tracing::debug!(connection_id = %self.id, "Outbound channel closed");
        self.disconnect(DisconnectReason::Clean, ctx);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                self.relay(&text);
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!(connection_id = %self.id, "Binary frames not supported, dropping");
                metrics::record_dropped_frame("binary");
            }
            Ok(ws::Message::Continuation(_)) => {
                tracing::warn!(connection_id = %self.id, "Fragmented frames not supported, dropping");
                metrics::record_dropped_frame("continuation");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::debug!(connection_id = %self.id, reason = ?reason, "Close frame received");
                ctx.close(reason);
                self.disconnect(DisconnectReason::Clean, ctx);
            }
            Ok(ws::Message::Nop) => {}
            Err(e) => {
                tracing::warn!(connection_id = %self.id, error = %e, "WebSocket protocol error");
                self.disconnect(DisconnectReason::Error, ctx);
            }
        }
    }
}
