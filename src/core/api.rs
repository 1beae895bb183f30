//! HTTP + WebSocket API for GripLock
//!
//! Endpoints:
//! - POST /session/new - Create new squeeze session
//! - GET /session/{id} - Get session status
//! - DELETE /session/{id} - End session and stop its tick loop
//! - POST /session/{id}/command - Relay endpoint for reporter commands
//! - WS /ws/{id} - Live tick updates
//! - GET /health - Health check
//!
//! The command endpoint is the transport stand-in for remote reporters: a
//! well-formed command is always accepted and queued, never answered with
//! state. Reliability and ordering beyond the authority's staleness window
//! are explicitly not promised.

use axum::{
    extract::{ws::{Message, WebSocket}, Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info};

use crate::core::{AuthorityLink, AuthorityRuntime, QueueLink};
use crate::types::{AuthorityCommand, SqueezeConfig, TickOutput, Vec3};

/// One live squeeze session: an authority runtime plus its tick loop
pub struct Session {
    pub id: String,
    pub config: SqueezeConfig,
    pub link: QueueLink,
    pub runtime: Arc<Mutex<AuthorityRuntime>>,
    pub update_tx: broadcast::Sender<TickOutput>,
    tick_task: tokio::task::JoinHandle<()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.tick_task.abort();
    }
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Session>>,
    pub tick_hz: f32,
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    pub config: Option<SqueezeConfig>,
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub command_url: String,
    pub websocket_url: String,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub engaged_a: bool,
    pub engaged_b: bool,
    pub rest_distance: Option<f32>,
    pub sustain_s: f32,
    pub cooldown_s: f32,
    pub trigger_count: u64,
    pub config: SqueezeConfig,
}

/// Command acknowledgement: the command was queued, nothing more
#[derive(Debug, Serialize)]
pub struct CommandAck {
    pub queued: bool,
}

/// Session deletion response
#[derive(Debug, Serialize)]
pub struct SessionEndedResponse {
    pub session_id: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Create the API router
pub fn create_router(tick_hz: f32) -> Router {
    let state = Arc::new(AppState {
        sessions: RwLock::new(HashMap::new()),
        tick_hz,
    });

    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(delete_session))
        .route("/session/:id/command", post(post_command))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// Create new session and start its authority tick loop
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Result<Json<NewSessionResponse>, (StatusCode, String)> {
    let config = req.config.unwrap_or_default();
    config
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let session_id = generate_session_id();
    let (mut runtime, link) = AuthorityRuntime::new(config);
    let (tx, _) = broadcast::channel(100);

    {
        let sid = session_id.clone();
        runtime.authority_mut().set_sink(Box::new(move |mid: Vec3| {
            info!(session = %sid, midpoint = %mid, "squeeze triggered");
        }));
    }

    let runtime = Arc::new(Mutex::new(runtime));
    let tick_task = spawn_tick_loop(Arc::clone(&runtime), tx.clone(), state.tick_hz);

    let session = Session {
        id: session_id.clone(),
        config,
        link,
        runtime,
        update_tx: tx,
        tick_task,
    };

    let mut sessions = state.sessions.write().await;
    sessions.insert(session_id.clone(), session);
    info!(session = %session_id, "session created");

    Ok(Json(NewSessionResponse {
        session_id: session_id.clone(),
        command_url: format!("/session/{}/command", session_id),
        websocket_url: format!("/ws/{}", session_id),
    }))
}

/// Drive the authority at a fixed cadence and broadcast each tick
fn spawn_tick_loop(
    runtime: Arc<Mutex<AuthorityRuntime>>,
    tx: broadcast::Sender<TickOutput>,
    tick_hz: f32,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs_f32(1.0 / tick_hz));
        loop {
            interval.tick().await;
            let out = runtime.lock().await.tick();
            let _ = tx.send(out);
        }
    })
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    let runtime = session.runtime.lock().await;
    let authority = runtime.authority();

    Ok(Json(SessionStatusResponse {
        session_id: id,
        engaged_a: authority.engaged(crate::types::Side::A),
        engaged_b: authority.engaged(crate::types::Side::B),
        rest_distance: authority.rest_distance(),
        sustain_s: authority.sustain_secs(),
        cooldown_s: authority.cooldown_secs(),
        trigger_count: authority.trigger_count(),
        config: session.config,
    }))
}

/// End a session. Dropping it aborts the tick loop; in-flight reporter
/// commands for the id simply start returning 404.
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionEndedResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.remove(&id).ok_or(StatusCode::NOT_FOUND)?;
    let triggers = session.runtime.lock().await.authority().trigger_count();
    info!(session = %id, triggers, "session ended");

    Ok(Json(SessionEndedResponse { session_id: id }))
}

/// Queue a reporter command. Fire-and-forget: a well-formed command is
/// always accepted; it takes effect at the authority's next tick.
async fn post_command(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(cmd): Json<AuthorityCommand>,
) -> Result<Json<CommandAck>, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    debug!(session = %id, side = %cmd.side(), "command queued");
    session.link.send(cmd);
    Ok(Json(CommandAck { queued: true }))
}

/// WebSocket handler for live tick updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let rx = session.update_tx.subscribe();
    drop(sessions);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Handle WebSocket connection
async fn handle_websocket(mut socket: WebSocket, mut rx: broadcast::Receiver<TickOutput>) {
    while let Ok(update) = rx.recv().await {
        let json = serde_json::to_string(&update).unwrap_or_default();
        if socket.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

/// Generate session ID
fn generate_session_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("squeeze_{:x}", nanos as u64)
}

/// Run the API server
pub async fn run_server(addr: &str, tick_hz: f32) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(tick_hz);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("GripLock authority running on {}", addr);
    println!("  POST /session/new          - Create session");
    println!("  GET  /session/:id          - Get status");
    println!("  DEL  /session/:id          - End session");
    println!("  POST /session/:id/command  - Relay a reporter command");
    println!("  WS   /ws/:id               - Live tick updates");
    println!("  GET  /health               - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
