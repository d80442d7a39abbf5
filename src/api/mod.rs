//! REST API module
//!
//! Serves the ballot page and the endpoints it drives.
//!
//! # Endpoints
//!
//! - `GET /` - Ballot page
//! - `GET /contract.json` - Deployment descriptor
//! - `GET /api/candidates` - Candidates, display locations and last tallies
//! - `GET /api/tallies` - Text of every display location
//! - `POST /api/refresh` - Re-read every tally from the contract
//! - `POST /api/vote` - Cast a vote (`{"candidate": "=="}`)
//! - `GET /health` - Health check
//!
//! ## WebSocket
//! - `GET /ws` - Real-time updates (TallyUpdated, TallyError, VoteFailed)

pub mod handlers;
pub mod routes;
pub mod websocket;

pub use handlers::ApiState;
pub use routes::create_router;
pub use websocket::{SharedTallyView, WsBroadcaster, WsEvent};
