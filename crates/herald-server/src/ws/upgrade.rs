//! Realtime upgrade endpoint.
//!
//! `GET /notifications/websocket?id=&idType=&manageSiteId=&clientType=&clientFlag=`
//!
//! Precondition ladder, each failure distinct: the request must negotiate a
//! WebSocket upgrade (`NOT_WEBSOCKET`), carry `id` (`ID_MISSING`) and `idType`
//! (`ID_TYPE_MISSING`), and `idType` must be `user-id` or `cid`
//! (`ID_TYPE_ERROR`). A duplicate `(id, idType)` is refused with HTTP 403 and
//! the existing holder keeps its session; otherwise the protocol switches
//! (101) and the connection joins the registry until close, protocol error,
//! or eviction.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use herald_core::{ApiError, IdentifierKind};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::routes::reply_err;
use crate::state::AppState;
use crate::ws::registry::{AdmitError, Attachment, ConnectionKey, ConnectionRegistry};

/// Upgrade query parameters. Only `id` and `idType` are mandatory.
#[derive(Debug, Deserialize)]
pub struct UpgradeQuery {
    id: Option<String>,
    #[serde(rename = "idType")]
    id_type: Option<String>,
    #[serde(rename = "manageSiteId")]
    manage_site_id: Option<String>,
    #[serde(rename = "clientType")]
    client_type: Option<String>,
    #[serde(rename = "clientFlag")]
    client_flag: Option<String>,
}

/// Handle `GET /notifications/websocket`.
pub async fn websocket(
    State(state): State<AppState>,
    Query(query): Query<UpgradeQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Ok(ws) = ws else {
        return reply_err(&ApiError::not_websocket());
    };
    let Some(id) = query.id.filter(|v| !v.is_empty()) else {
        return reply_err(&ApiError::id_missing());
    };
    let Some(id_type) = query.id_type.filter(|v| !v.is_empty()) else {
        return reply_err(&ApiError::id_type_missing());
    };
    let Ok(kind) = id_type.parse::<IdentifierKind>() else {
        return reply_err(&ApiError::id_type_error());
    };

    let key = ConnectionKey {
        identifier: id,
        kind,
    };
    let attachment = Attachment {
        manage_site_id: query.manage_site_id.filter(|v| !v.is_empty()),
        client_type: query.client_type.and_then(|v| v.parse().ok()),
        client_flag: query.client_flag.and_then(|v| v.parse().ok()),
    };

    // Admission happens before the switch so a duplicate identity is refused
    // with 403 instead of an accepted-then-dropped socket.
    let (tx, rx) = mpsc::channel(state.ws_buffer);
    match state.registry.admit(key.clone(), attachment, tx) {
        Err(AdmitError::Duplicate) => StatusCode::FORBIDDEN.into_response(),
        Ok(serial) => {
            let registry = Arc::clone(&state.registry);
            let shutdown = state.shutdown.clone();
            ws.on_upgrade(move |socket| {
                serve_connection(socket, registry, key, serial, rx, shutdown)
            })
        }
    }
}

/// Drive one admitted connection until it ends.
///
/// The task suspends on the outbound channel while idle and resumes only when
/// targeted by a push. It ends on client close, socket error, a failed write,
/// or channel closure (registry eviction) — and always evicts its own entry,
/// guarded by the admission serial so a late finish never removes a newer
/// connection that reused the key.
async fn serve_connection(
    socket: WebSocket,
    registry: Arc<ConnectionRegistry>,
    key: ConnectionKey,
    serial: u64,
    mut rx: mpsc::Receiver<Arc<String>>,
    shutdown: CancellationToken,
) {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(payload) => {
                    if sink.send(Message::Text(payload.as_str().into())).await.is_err() {
                        break;
                    }
                }
                // Sender dropped: the registry evicted this connection.
                None => break,
            },
            inbound = stream.next() => match inbound {
                // Client→server messages are not part of the protocol.
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            () = shutdown.cancelled() => break,
        }
    }
    let _ = sink.close().await;
    if registry.evict(&key, serial) {
        debug!(identifier = %key.identifier, kind = %key.kind, "connection closed");
    }
}
