use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};

use crate::auth::{Claims, decode_jwt};
use crate::db::AppState;
use crate::domain::Viewer;
use crate::realtime::{Event, Hub, SUPPORT_CHANNEL};
use crate::services::request_service;

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: String,
    pub channels: String,
}

/// Subscribe a client to realtime channels. The token travels in the
/// query string because browsers cannot set headers on WebSocket
/// upgrades; every requested channel is authorized before the upgrade.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let claims = decode_jwt(&query.token).map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid or expired token" })),
        )
    })?;

    let channels: Vec<String> = query
        .channels
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if channels.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "At least one channel is required" })),
        ));
    }

    for channel in &channels {
        if !authorized(&state, &claims, channel).await {
            return Err((
                StatusCode::FORBIDDEN,
                Json(json!({ "error": format!("Not allowed to join '{}'", channel) })),
            ));
        }
    }

    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| relay(socket, hub, channels)))
}

async fn authorized(state: &AppState, claims: &Claims, channel: &str) -> bool {
    let viewer = claims.viewer();

    if channel == SUPPORT_CHANNEL {
        return viewer.is_admin();
    }

    if let Some(id) = channel.strip_prefix("user:") {
        return match id.parse::<i32>() {
            Ok(id) => id == claims.uid || viewer.is_admin(),
            Err(_) => false,
        };
    }

    if let Some(id) = channel.strip_prefix("request:") {
        let Ok(id) = id.parse::<i32>() else {
            return false;
        };
        // Participants only: the visibility check covers owner, assigned
        // agent and admin.
        return request_service::get_request(&state.db, viewer, id).await.is_ok();
    }

    false
}

/// Incoming frames from the client; only transient typing indicators are
/// accepted and relayed, never persisted.
#[derive(Deserialize)]
struct ClientFrame {
    channel: String,
    kind: String,
    #[serde(default)]
    payload: Value,
}

async fn relay(socket: WebSocket, hub: Hub, channels: Vec<String>) {
    let (mut sink, mut stream) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(64);
    for channel in &channels {
        let mut sub = hub.subscribe(channel);
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match sub.recv().await {
                    Ok(text) => {
                        if tx.send(text).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("realtime subscriber lagged, {} events dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
    drop(tx);

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                match outgoing {
                    Some(text) => {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(frame) = serde_json::from_str::<ClientFrame>(&text) {
                            if frame.kind == "typing" && channels.contains(&frame.channel) {
                                hub.publish(&frame.channel, &Event::typing(frame.payload));
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
