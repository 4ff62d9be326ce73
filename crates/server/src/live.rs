//! Live search suggestions over a WebSocket.
//!
//! Each socket owns one [`SuggestionCoordinator`]. Text frames are decoded
//! into coordinator inputs; every state change is pushed back as a JSON
//! snapshot.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use marquee_search::{CoordinatorConfig, Input, SuggestionCoordinator};
use tracing::{debug, warn};

use crate::state::AppState;

const MAX_FRAME_BYTES: usize = 16 * 1024;

pub async fn live_suggestions(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.max_message_size(MAX_FRAME_BYTES)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let coordinator =
        SuggestionCoordinator::spawn(state.metadata.clone(), CoordinatorConfig::default());
    let mut snapshots = coordinator.subscribe();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<Input>(text.as_str()) {
                    Ok(input) => {
                        if !coordinator.send(input) {
                            break;
                        }
                    }
                    Err(e) => debug!(error = %e, "ignoring unrecognised live-search frame"),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "live-search socket error");
                    break;
                }
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let body = {
                    let snapshot = snapshots.borrow_and_update();
                    serde_json::to_string(&*snapshot)
                };
                match body {
                    Ok(body) => {
                        if sender.send(Message::Text(body.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to encode suggestion snapshot"),
                }
            }
        }
    }
    debug!("live-search socket closed");
}
