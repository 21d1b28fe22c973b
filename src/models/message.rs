use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::MessageType;

/// A transcript entry. Append-only once logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub message_type: MessageType,
    pub content: String,
    /// Why the engine said this (rule explanations, "why I'm asking").
    pub reasoning: Option<String>,
    /// Which profile facts shaped this message.
    pub profile_insight: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl Message {
    pub fn is_emergency(&self) -> bool {
        self.message_type == MessageType::Emergency
    }
}
