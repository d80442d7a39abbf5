//! WebSocket support for live tally updates
//!
//! The ballot page subscribes to `/ws`; every display-location update and
//! every failed vote is pushed as a [`WsEvent`].

use crate::client::TallyView;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Maximum number of events to buffer per subscriber
const BROADCAST_CAPACITY: usize = 100;

/// WebSocket events that can be broadcast to clients
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsEvent {
    /// A display location has a new tally
    TallyUpdated {
        location: String,
        votes: String,
        at: DateTime<Utc>,
    },
    /// A display location could not be refreshed
    TallyError { location: String, message: String },
    /// A vote was not recorded
    VoteFailed { candidate: String, reason: String },
    /// Every rendered location, sent once when a page connects
    Snapshot { tallies: BTreeMap<String, String> },
}

/// Broadcaster for WebSocket events
#[derive(Debug)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsEvent>,
}

impl WsBroadcaster {
    /// Create a new broadcaster
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Broadcast an event to all connected clients
    pub fn broadcast(&self, event: WsEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.sender.subscribe()
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// View backing the ballot page: latest text per location, pushed over `/ws`
#[derive(Debug)]
pub struct SharedTallyView {
    tallies: RwLock<BTreeMap<String, String>>,
    broadcaster: Arc<WsBroadcaster>,
}

impl SharedTallyView {
    pub fn new(broadcaster: Arc<WsBroadcaster>) -> Self {
        Self {
            tallies: RwLock::new(BTreeMap::new()),
            broadcaster,
        }
    }

    /// Current text of every rendered location
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.tallies
            .read()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// Subscribe to updates along with the state they apply to
    ///
    /// The receiver is created before the snapshot is taken, so no update
    /// falls between the two.
    pub fn subscribe(&self) -> (BTreeMap<String, String>, broadcast::Receiver<WsEvent>) {
        let receiver = self.broadcaster.subscribe();
        (self.snapshot(), receiver)
    }
}

impl TallyView for SharedTallyView {
    fn show_tally(&self, location: &str, votes: &str) {
        if let Ok(mut tallies) = self.tallies.write() {
            tallies.insert(location.to_string(), votes.to_string());
        }
        self.broadcaster.broadcast(WsEvent::TallyUpdated {
            location: location.to_string(),
            votes: votes.to_string(),
            at: Utc::now(),
        });
    }

    fn show_error(&self, location: &str, message: &str) {
        self.broadcaster.broadcast(WsEvent::TallyError {
            location: location.to_string(),
            message: message.to_string(),
        });
    }

    fn show_vote_failed(&self, candidate: &str, reason: &str) {
        self.broadcaster.broadcast(WsEvent::VoteFailed {
            candidate: candidate.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<crate::api::handlers::ApiState>,
) -> impl IntoResponse {
    let view = state.view.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, view))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, view: Arc<SharedTallyView>) {
    let (mut sender, mut receiver) = socket.split();

    let (tallies, mut rx) = view.subscribe();
    if let Ok(json) = serde_json::to_string(&WsEvent::Snapshot { tallies }) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    // Forward broadcast events to this client
    let mut send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(text)) => {
                    log::debug!("Ignoring client message: {}", text);
                }
                Err(e) => {
                    log::warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    log::info!("WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_with_no_subscribers() {
        let view = SharedTallyView::new(Arc::new(WsBroadcaster::new()));
        view.show_vote_failed("==", "reverted");
        assert!(view.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_starts_from_snapshot() {
        let view = SharedTallyView::new(Arc::new(WsBroadcaster::new()));
        view.show_tally("candidate-1", "2");

        let (tallies, mut rx) = view.subscribe();
        assert_eq!(tallies.get("candidate-1").map(String::as_str), Some("2"));

        view.show_tally("candidate-2", "5");
        match rx.recv().await.unwrap() {
            WsEvent::TallyUpdated { location, votes, .. } => {
                assert_eq!(location, "candidate-2");
                assert_eq!(votes, "5");
            }
            other => panic!("unexpected event {:?}", other),
        }

        let json = serde_json::to_string(&WsEvent::Snapshot { tallies }).unwrap();
        assert!(json.contains("\"type\":\"Snapshot\""));
    }

    #[test]
    fn test_event_serialization() {
        let event = WsEvent::VoteFailed {
            candidate: "==".to_string(),
            reason: "reverted".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"VoteFailed\""));
        assert!(json.contains("reverted"));
    }

    #[tokio::test]
    async fn test_shared_view_pushes_updates() {
        let broadcaster = Arc::new(WsBroadcaster::new());
        let mut rx = broadcaster.subscribe();
        let view = SharedTallyView::new(broadcaster);

        view.show_tally("candidate-1", "3");

        assert_eq!(
            view.snapshot().get("candidate-1").map(String::as_str),
            Some("3")
        );
        match rx.recv().await.unwrap() {
            WsEvent::TallyUpdated {
                location, votes, ..
            } => {
                assert_eq!(location, "candidate-1");
                assert_eq!(votes, "3");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
