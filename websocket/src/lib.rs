//! WebSocket server for real-time registry notifications.
//!
//! Clients can subscribe to:
//! - Claim registrations
//! - Score submissions
//! - Verifier role updates
//!
//! optionally filtered to a set of identities.

pub mod error;
pub mod server;
pub mod subscriptions;

pub use error::WsError;
pub use server::{WebSocketServer, WsState};
pub use subscriptions::{SubscriptionEvent, SubscriptionFilter, SubscriptionTopic};
