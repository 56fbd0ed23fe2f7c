//! # routes::monitor
//!
//! **Monitor Loop** — how views keep in sync with the coordinator.
//!
//! | Method    | Path             | Description                              |
//! |-----------|------------------|------------------------------------------|
//! | GET (WS)  | `/ws/monitor`    | Snapshot on connect, then every event    |
//! | GET       | `/api/snapshot`  | Current snapshot                         |
//! | GET       | `/health`        | Tick / trade counters, simulation status |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::atomic::Ordering;
use tracing::{debug, info};

use crate::{events::WsEvent, state::SharedState};

// ─── WebSocket Handler ────────────────────────────────────────────────────────

pub async fn ws_monitor(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    // Subscribe before reading the snapshot so no event falls in between.
    let mut rx = state.broadcast_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!("🔌 WebSocket client connected");

    let snapshot = WsEvent::Snapshot {
        snapshot: Box::new(state.snapshot().await),
    }
    .to_json();

    if sender.send(Message::Text(snapshot)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json_str) => {
                        if sender.send(Message::Text(json_str)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        // The next SNAPSHOT brings the client back in sync.
                        debug!("WS client lagged, skipped {n} events");
                    }
                    Err(_) => break,
                }
            }

            result = receiver.next() => {
                match result {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("🔌 WebSocket client disconnected");
}

// ─── REST ─────────────────────────────────────────────────────────────────────

/// GET /api/snapshot
pub async fn get_snapshot(State(state): State<SharedState>) -> impl IntoResponse {
    let snapshot = state.snapshot().await;
    Json(json!({ "ok": true, "snapshot": snapshot }))
}

/// GET /health
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let (rules, armed) = {
        let market = state.market.read().await;
        (
            market.rules.len(),
            market.rules.iter().filter(|r| r.enabled).count(),
        )
    };

    Json(json!({
        "ok":                 true,
        "tick_count":         state.tick_count.load(Ordering::Relaxed),
        "trade_count":        state.trade_count.load(Ordering::Relaxed),
        "simulation_running": state.simulation_running.load(Ordering::Relaxed),
        "rules":              rules,
        "armed_rules":        armed,
    }))
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::models::TradeRequest;
    use crate::routes::router;
    use crate::state::build_state;
    use futures_util::{Stream, StreamExt};
    use serde_json::Value;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::{self, Message};

    async fn next_event<S>(socket: &mut S) -> Value
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .expect("timed out waiting for a WS frame")
                .expect("socket closed")
                .expect("WS error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_ws_sends_snapshot_then_forwards_events() {
        let state = build_state(&Config::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/monitor"))
            .await
            .unwrap();

        let first = next_event(&mut socket).await;
        assert_eq!(first["event"], "SNAPSHOT");
        assert_eq!(first["snapshot"]["instruments"].as_array().unwrap().len(), 6);
        assert!(first["snapshot"]["transactions"].as_array().unwrap().is_empty());

        // The handler subscribed before sending the snapshot, so this trade
        // reaches the socket.
        let request: TradeRequest = serde_json::from_value(serde_json::json!({
            "symbol": "AAPL", "side": "buy", "quantity": 3,
        }))
        .unwrap();
        state.request_trade(&request).await.unwrap();

        let trade = next_event(&mut socket).await;
        assert_eq!(trade["event"], "TRADE_EXECUTED");
        assert_eq!(trade["origin"]["kind"], "MANUAL");
        assert_eq!(trade["transaction"]["quantity"], 3);

        let snapshot = next_event(&mut socket).await;
        assert_eq!(snapshot["event"], "SNAPSHOT");
        assert_eq!(snapshot["snapshot"]["holdings"][0]["symbol"], "AAPL");
    }
}
