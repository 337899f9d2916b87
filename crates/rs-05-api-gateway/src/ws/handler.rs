//! Shell websocket handlers.
//!
//! | Route | Relay task |
//! |-------|------------|
//! | `/shell/:id/:image/operator/input` | `operator_input` (attaches the operator) |
//! | `/shell/:id/:image/operator/output` | `operator_output` |
//! | `/shell/:id/:image/target/input` | `target_input` |
//! | `/shell/:id/:image/target/output` | `target_output` |
//!
//! Unknown team or image is refused before the upgrade. The operator only
//! activates the session once its socket is live, so an aborted upgrade
//! leaves the session Pending. A second operator is upgraded, told the
//! shell is in use, and closed.

use std::sync::Arc;

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use rs_02_ingestion::AgentStatus;
use rs_04_shell_relay::{relay, FrameTransport, RelayEnd, Session, SessionKey, ShellError};
use tracing::{debug, info, warn};

use crate::domain::error::ApiError;
use crate::router::AppState;
use crate::ws::transport::WsTransport;

/// Text sent to an operator who lost the attach race.
pub const IN_USE_MESSAGE: &str = "Shell already in use";

/// Which relay task a passive socket feeds. Operator input goes through
/// `serve_operator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    OperatorOutput,
    TargetInput,
    TargetOutput,
}

pub async fn operator_input(
    State(state): State<AppState>,
    Path((team, image)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> Response {
    match state.shells.lookup_or_create(&team, &image) {
        Ok(session) => {
            let key = session.key().clone();
            ws.on_upgrade(move |socket| async move {
                let mut transport = WsTransport::new(socket);
                let end = serve_operator(&state, &key, &mut transport).await;
                transport.close().await;
                debug!(%key, ?end, "Operator input socket finished");
            })
        }
        Err(err) => refuse(err),
    }
}

/// Attach the operator on a live transport and relay its keystrokes.
///
/// Returns `None` when another operator holds the session; the transport is
/// told so and nothing else happens.
pub(crate) async fn serve_operator<T>(
    state: &AppState,
    key: &SessionKey,
    transport: &mut T,
) -> Option<RelayEnd>
where
    T: FrameTransport + ?Sized,
{
    let session = match state.shells.attach_operator(&key.team, &key.image) {
        Ok(session) => session,
        Err(err) => {
            info!(error = %err, "Rejecting shell operator");
            let _ = transport
                .send_frame(Bytes::from_static(IN_USE_MESSAGE.as_bytes()))
                .await;
            return None;
        }
    };
    state
        .ingestion
        .status_board()
        .post(&key.team, &key.image, AgentStatus::Shell);
    Some(relay::operator_input(&session, transport).await)
}

pub async fn operator_output(
    state: State<AppState>,
    path: Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> Response {
    connect(state, path, ws, Endpoint::OperatorOutput)
}

pub async fn target_input(
    state: State<AppState>,
    path: Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> Response {
    connect(state, path, ws, Endpoint::TargetInput)
}

pub async fn target_output(
    state: State<AppState>,
    path: Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> Response {
    connect(state, path, ws, Endpoint::TargetOutput)
}

fn connect(
    State(state): State<AppState>,
    Path((team, image)): Path<(String, String)>,
    ws: WebSocketUpgrade,
    endpoint: Endpoint,
) -> Response {
    match state.shells.lookup_or_create(&team, &image) {
        Ok(session) => upgrade(ws, endpoint, session),
        Err(err) => refuse(err),
    }
}

fn refuse(err: ShellError) -> Response {
    warn!(error = %err, "Refusing shell connection");
    ApiError::from(err).into_response()
}

fn upgrade(ws: WebSocketUpgrade, endpoint: Endpoint, session: Arc<Session>) -> Response {
    ws.on_upgrade(move |socket| run_relay(endpoint, session, socket))
}

async fn run_relay(endpoint: Endpoint, session: Arc<Session>, socket: WebSocket) {
    let mut transport = WsTransport::new(socket);
    let end = match endpoint {
        Endpoint::OperatorOutput => relay::operator_output(&session, &mut transport).await,
        Endpoint::TargetInput => relay::target_input(&session, &mut transport).await,
        Endpoint::TargetOutput => relay::target_output(&session, &mut transport).await,
    };
    transport.close().await;
    debug!(key = %session.key(), ?endpoint, ?end, "Shell socket finished");
}
