//! WebSocket upgrade handler and per-connection task.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::AppState;

use super::admission::{self, AdmissionError};
use super::connection::ConnectionHandle;

/// Close code sent when admission fails (4000-range, application-level).
const CLOSE_AUTH_FAILED: u16 = 4004;

pub fn router() -> Router<AppState> {
    Router::new().route("/events/{user_id}", get(ws_upgrade))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state, user_id))
}

async fn handle_connection(socket: WebSocket, state: AppState, user_id: String) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, outbound_rx) = ConnectionHandle::channel(state.config.outbound_buffer);

    let admitted = match admission::read_token(&mut ws_rx, state.config.identify_timeout()).await {
        Ok(token) => {
            admission::admit(
                state.identity.as_ref(),
                &state.directory,
                &user_id,
                &token,
                &handle,
            )
            .await
        }
        Err(err) => {
            handle.complete();
            Err(err)
        }
    };

    if let Err(err) = admitted {
        tracing::debug!(%user_id, reason = %err, "admission failed");
        reject(&mut ws_tx, &err).await;
        return;
    }

    tracing::info!(
        %user_id,
        connection_id = %handle.id(),
        "event connection admitted"
    );

    let writer = tokio::spawn(write_loop(ws_tx, outbound_rx, handle.completion().clone()));
    read_loop(&mut ws_rx, handle.completion()).await;

    handle.complete();
    let _ = writer.await;
    state.directory.prune(&user_id, &[handle.id()]);

    tracing::info!(
        %user_id,
        connection_id = %handle.id(),
        "event connection closed"
    );
}

/// Consume inbound frames until the peer goes away or completion is settled.
/// Clients have nothing to say after admission; their frames are ignored.
async fn read_loop(ws_rx: &mut SplitStream<WebSocket>, completion: &CancellationToken) {
    loop {
        tokio::select! {
            _ = completion.cancelled() => break,
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(?e, "ws read error");
                    break;
                }
                Some(Ok(_)) => continue,
            },
        }
    }
}

/// Drain the outbound queue onto the socket. Exits, settling completion,
/// when a write fails; dropping the queue receiver then marks the handle
/// closed for everyone holding it.
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<Message>,
    completion: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = completion.cancelled() => break,
            next = outbound_rx.recv() => match next {
                Some(msg) => {
                    if ws_tx.send(msg).await.is_err() {
                        completion.cancel();
                        break;
                    }
                }
                None => break,
            },
        }
    }
}

/// Tell the client why, then drop the socket.
async fn reject(ws_tx: &mut SplitSink<WebSocket, Message>, err: &AdmissionError) {
    if matches!(err, AdmissionError::Closed) {
        return;
    }
    let close_msg = Message::Close(Some(CloseFrame {
        code: CLOSE_AUTH_FAILED,
        reason: err.close_reason().to_string().into(),
    }));
    let _ = ws_tx.send(close_msg).await;
}
