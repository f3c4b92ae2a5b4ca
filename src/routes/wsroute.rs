use crate::services::UserService;
use crate::state::AppState;
use crate::websocket::message_types::WsClientEvent;
use crate::websocket::{ConnectionId, PresenceRegistry};
use actix::{Actor, ActorContext, AsyncContext, StreamHandler};
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use deadpool_postgres::Pool;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::error;
use uuid::Uuid;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// One user's real-time connection.
///
/// The actor drives the presence state machine: the route handler registers
/// the connection before the upgrade completes, the actor forwards pushed
/// payloads to the socket, and teardown deregisters exactly the connection
/// it owns (a superseded connection cannot evict its replacement).
struct WsSession {
    user_id: Uuid,
    connection_id: ConnectionId,
    registry: PresenceRegistry,
    db: Pool,
    hb: Instant,
    // taken in started() and bridged onto the actor's mailbox
    rx: Option<UnboundedReceiver<String>>,
}

impl WsSession {
    fn new(
        user_id: Uuid,
        connection_id: ConnectionId,
        registry: PresenceRegistry,
        db: Pool,
        rx: UnboundedReceiver<String>,
    ) -> Self {
        Self {
            user_id,
            connection_id,
            registry,
            db,
            hb: Instant::now(),
            rx: Some(rx),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(user_id = %act.user_id, "WebSocket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "WebSocket session started");

        self.hb(ctx);

        // Bridge the registry's delivery channel onto this socket
        if let Some(rx) = self.rx.take() {
            ctx.add_stream(UnboundedReceiverStream::new(rx));
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "WebSocket session stopped");

        let registry = self.registry.clone();
        let db = self.db.clone();
        let user_id = self.user_id;
        let connection_id = self.connection_id;

        actix::spawn(async move {
            // Mirror the offline flag only when this was still the live
            // connection; a superseded session must leave the flag alone.
            if registry.disconnect(user_id, connection_id).await {
                if let Err(e) = UserService::set_online(&db, user_id, false).await {
                    tracing::warn!(error = %e, %user_id, "failed to mirror offline flag");
                }
            }
        });
    }
}

/// Payloads pushed through the presence registry for this user.
impl StreamHandler<String> for WsSession {
    fn handle(&mut self, payload: String, ctx: &mut Self::Context) {
        ctx.text(payload);
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        // The delivery channel closed, which means a newer connection took
        // over this user id. Close the stale socket.
        tracing::debug!(user_id = %self.user_id, "delivery stream ended, closing session");
        ctx.stop();
    }
}

// Handle WebSocket protocol messages
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
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<WsClientEvent>(&text) {
                Ok(WsClientEvent::Logout) => {
                    tracing::info!(user_id = %self.user_id, "explicit logout");
                    ctx.close(None);
                    ctx.stop();
                }
                Err(e) => {
                    tracing::warn!(user_id = %self.user_id, "unparseable WS message: {:?}", e);
                }
            },
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("Binary WebSocket messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::info!("WebSocket close message received: {:?}", reason);
                ctx.stop();
            }
            _ => {}
        }
    }
}

// Token validation
fn authenticate(
    state: &AppState,
    params: &WsParams,
    req: &HttpRequest,
) -> Result<Uuid, actix_web::http::StatusCode> {
    let token = params.token.clone().or_else(|| {
        req.headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    });

    match token {
        None => {
            error!("WebSocket connection rejected: no token provided");
            Err(actix_web::http::StatusCode::UNAUTHORIZED)
        }
        Some(t) => state.jwt.user_id(&t).map_err(|e| {
            error!("WebSocket connection rejected: invalid token: {}", e);
            actix_web::http::StatusCode::UNAUTHORIZED
        }),
    }
}

// HTTP handler
#[get("/ws")]
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsParams>,
) -> Result<HttpResponse, Error> {
    let params = query.into_inner();

    // Authentication
    let user_id = match authenticate(&state, &params, &req) {
        Ok(id) => id,
        Err(status) => return Ok(HttpResponse::build(status).finish()),
    };

    // Register presence before the upgrade so a push arriving during the
    // handshake already sees the new handle
    let (connection_id, rx) = state.registry.connect(user_id).await;

    // Best-effort online mirror; delivery never consults it
    if let Err(e) = UserService::set_online(&state.db, user_id, true).await {
        tracing::warn!(error = %e, %user_id, "failed to mirror online flag");
    }

    let session = WsSession::new(
        user_id,
        connection_id,
        state.registry.clone(),
        state.db.clone(),
        rx,
    );

    match ws::start(session, &req, stream) {
        Ok(resp) => Ok(resp),
        Err(e) => {
            state.registry.disconnect(user_id, connection_id).await;
            Err(e)
        }
    }
}
