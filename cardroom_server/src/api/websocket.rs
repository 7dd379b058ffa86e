//! Subscription gateway: a push channel of authoritative snapshots.
//!
//! Clients attach with `GET /ws/games/{id}?token=<bearer>`. After the token
//! and table membership check the socket receives the current snapshot
//! immediately, then every subsequent update in mutation order, plus the
//! one-shot `game_summary_notification` when the game completes.
//!
//! Close codes: 4001 unauthenticated, 4003 not a participant, 1011 internal.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use cardroom::game::entities::{PlayerId, TableId};
use cardroom::game::errors::GameError;
use cardroom::table::broadcast::SUBSCRIBER_QUEUE_DEPTH;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::AppState;

pub const CLOSE_UNAUTHENTICATED: u16 = 4001;
pub const CLOSE_NOT_PARTICIPANT: u16 = 4003;
pub const CLOSE_INTERNAL: u16 = 1011;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(table_id): Path<TableId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, table_id, query.token, state))
}

async fn close_with(mut socket: WebSocket, code: u16, reason: &'static str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await;
}

async fn handle_socket(socket: WebSocket, table_id: TableId, token: String, state: AppState) {
    // Authentication happens post-upgrade so the close code can say why.
    let player_id: PlayerId = match state.auth.verify_token(&token) {
        Ok(claims) => claims.sub,
        Err(_) => {
            close_with(socket, CLOSE_UNAUTHENTICATED, "invalid token").await;
            return;
        }
    };

    let Some(handle) = state.manager.get(table_id).await else {
        close_with(socket, CLOSE_NOT_PARTICIPANT, "unknown table").await;
        return;
    };

    let (tx, mut rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
    match handle.subscribe(player_id, tx).await {
        Ok(()) => {}
        Err(GameError::Forbidden(_)) => {
            close_with(socket, CLOSE_NOT_PARTICIPANT, "not a participant").await;
            return;
        }
        Err(err) => {
            warn!("subscribe failed for player {player_id} on table {table_id}: {err}");
            close_with(socket, CLOSE_INTERNAL, "subscription failed").await;
            return;
        }
    }

    info!("websocket attached: table={table_id} player={player_id}");
    crate::metrics::subscribers_delta(1);

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            update = rx.recv() => {
                let Some(update) = update else {
                    // Table actor shut down.
                    let _ = sink
                        .send(Message::Close(Some(CloseFrame {
                            code: 1000,
                            reason: "table closed".into(),
                        })))
                        .await;
                    break;
                };
                let payload = match serde_json::to_string(&update) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!("snapshot serialization failed: {err}");
                        let _ = sink
                            .send(Message::Close(Some(CloseFrame {
                                code: CLOSE_INTERNAL,
                                reason: "serialization failure".into(),
                            })))
                            .await;
                        break;
                    }
                };
                if sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(_)) => {
                        // The push channel is one-way; client payloads are
                        // ignored, commands go over HTTP.
                        debug!("ignoring client message on table {table_id}");
                    }
                    Some(Err(_)) => break,
                }
            }
        }
    }

    handle.unsubscribe(player_id).await;
    crate::metrics::subscribers_delta(-1);
    info!("websocket detached: table={table_id} player={player_id}");
}
