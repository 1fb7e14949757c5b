//! Subscription management for WebSocket clients.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use verileaf_types::{Identity, RegistryEvent, Timestamp};

/// Available subscription topics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTopic {
    /// Claim registrations and overwrites.
    Claims,
    /// Impact score submissions.
    Scores,
    /// Verifier role updates.
    Roles,
}

impl SubscriptionTopic {
    /// The topic a registry notification is published on.
    pub fn for_event(event: &RegistryEvent) -> Self {
        match event {
            RegistryEvent::ClaimRegistered { .. } => Self::Claims,
            RegistryEvent::ScoreSubmitted { .. } => Self::Scores,
            RegistryEvent::VerifierUpdated { .. } => Self::Roles,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claims => "claims",
            Self::Scores => "scores",
            Self::Roles => "roles",
        }
    }
}

impl fmt::Display for SubscriptionTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional filter for subscriptions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SubscriptionFilter {
    /// Only receive events concerning these identities.
    pub identities: Option<Vec<Identity>>,
}

impl SubscriptionFilter {
    pub fn matches(&self, event: &SubscriptionEvent) -> bool {
        match &self.identities {
            None => true,
            Some(wanted) => event.identities.iter().any(|id| wanted.contains(id)),
        }
    }
}

/// Messages a client may send.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        topic: SubscriptionTopic,
        #[serde(default)]
        filter: Option<SubscriptionFilter>,
    },
    Unsubscribe {
        topic: SubscriptionTopic,
    },
    Ping,
}

/// Control messages the server sends back.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Ack {
        action: String,
        topic: SubscriptionTopic,
    },
    Error {
        message: String,
    },
    Pong,
}

/// An event delivered to subscribed clients.
#[derive(Clone, Debug, Serialize)]
pub struct SubscriptionEvent {
    pub topic: SubscriptionTopic,
    pub data: RegistryEvent,
    pub timestamp: u64,
    #[serde(skip)]
    pub identities: Vec<Identity>,
}

impl SubscriptionEvent {
    pub fn new(event: &RegistryEvent, at: Timestamp) -> Self {
        Self {
            topic: SubscriptionTopic::for_event(event),
            data: event.clone(),
            timestamp: at.as_secs(),
            identities: event.identities(),
        }
    }
}

/// The topics one client is subscribed to, each with its filter.
#[derive(Debug, Default)]
pub struct ClientSubscriptions {
    topics: HashMap<SubscriptionTopic, SubscriptionFilter>,
}

impl ClientSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `topic`, replacing any earlier filter for it.
    pub fn subscribe(&mut self, topic: SubscriptionTopic, filter: Option<SubscriptionFilter>) {
        self.topics.insert(topic, filter.unwrap_or_default());
    }

    /// Returns whether the client was subscribed.
    pub fn unsubscribe(&mut self, topic: &SubscriptionTopic) -> bool {
        self.topics.remove(topic).is_some()
    }

    pub fn is_subscribed(&self, topic: &SubscriptionTopic) -> bool {
        self.topics.contains_key(topic)
    }

    /// Whether `event` should be delivered on `topic`.
    pub fn matches_filter(&self, topic: &SubscriptionTopic, event: &SubscriptionEvent) -> bool {
        event.topic == *topic
            && self
                .topics
                .get(topic)
                .is_some_and(|filter| filter.matches(event))
    }
}
