//! Axum-based connection gateway.
//!
//! Endpoints:
//! - GET `/ws` - the persistent bidirectional channel. Inbound text frames
//!   are [`ClientRequest`] JSON; outbound frames are
//!   [`WireEvent`](crate::events::WireEvent) JSON.
//! - GET `/api/state` - one-shot snapshot of the actuator store.
//!
//! Every new connection triggers a broadcast of the current LED, laser
//! and RGB state to *all* clients (connect emissions), then joins the
//! fan-out stream. Malformed frames and per-request hardware faults are
//! logged and scoped to the offending frame; the connection stays up.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::events::ClientRequest;
use crate::hub::SharedHub;
use crate::store::{ActuatorSnapshot, RgbValue, Switch};
use crate::traits::PinAdapter;

// ============================================================================
// REST Envelope
// ============================================================================

/// API response wrapper for consistent JSON structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data (present when success=true).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/state - current actuator snapshot
async fn get_state<P: PinAdapter + Send + 'static>(
    State(hub): State<Arc<SharedHub<P>>>,
) -> Json<ApiResponse<ActuatorSnapshot>> {
    Json(ApiResponse::ok(hub.snapshot()))
}

/// GET /ws - upgrade to the bidirectional event channel
async fn ws_upgrade<P: PinAdapter + Send + 'static>(
    State(hub): State<Arc<SharedHub<P>>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| client_session(socket, hub))
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// WebSocket Session
// ============================================================================

/// One connected client: pump broadcasts out, dispatch requests in.
async fn client_session<P: PinAdapter + Send + 'static>(socket: WebSocket, hub: Arc<SharedHub<P>>) {
    info!("client connected");

    // Subscribe before announcing so this client receives its own catch-up
    // events; the announcement reaches every other client too.
    let mut events = hub.subscribe();
    hub.with_engine(|engine| engine.broadcast_snapshot());

    let (mut sink, mut stream) = socket.split();

    let mut fan_out = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let frame = match event.to_json() {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(%e, "dropping unserializable event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "client fell behind; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let inbound_hub = Arc::clone(&hub);
    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => dispatch_frame(&inbound_hub, &text),
                Message::Close(_) => break,
                // Ping/pong handled by axum; binary frames are not part of
                // the protocol.
                _ => {}
            }
        }
    });

    // Whichever half ends first tears down the other.
    tokio::select! {
        _ = &mut fan_out => inbound.abort(),
        _ = &mut inbound => fan_out.abort(),
    }

    info!("client disconnected");
}

/// Parse and apply one inbound frame. All failures stay scoped here.
fn dispatch_frame<P: PinAdapter>(hub: &SharedHub<P>, text: &str) {
    let request = match ClientRequest::from_json(text) {
        Ok(request) => request,
        Err(e) => {
            warn!(%e, "dropping malformed request frame");
            return;
        }
    };

    debug!(?request, "request received");
    let result = hub.with_engine(|engine| match request {
        ClientRequest::Led { status } => engine.apply_switch(Switch::Led, status),
        ClientRequest::Laser { status } => engine.apply_switch(Switch::Laser, status),
        ClientRequest::Rgb { red, green, blue } => {
            engine.apply_rgb(RgbValue::new(red, green, blue))
        }
    });

    match result {
        Ok(outcome) => debug!(?outcome, "request handled"),
        Err(e) => warn!(%e, "request failed"),
    }
}

// ============================================================================
// Server Builder
// ============================================================================

/// Build the axum router with all routes.
pub fn build_router<P: PinAdapter + Send + 'static>(
    hub: Arc<SharedHub<P>>,
    config: &GatewayConfig,
) -> Router {
    let mut router = Router::new()
        .route("/ws", get(ws_upgrade::<P>))
        .route("/api/state", get(get_state::<P>))
        .fallback(not_found)
        .with_state(hub);

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Bind and serve the gateway until the listener fails or the future is
/// dropped.
pub async fn run_gateway<P: PinAdapter + Send + 'static>(
    hub: Arc<SharedHub<P>>,
    config: &GatewayConfig,
) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let router = build_router(hub, config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gateway listening");

    axum::serve(listener, router).await
}
