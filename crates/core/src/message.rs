//! Message and history domain types.
//!
//! A [`Turn`] is what the caller sends as conversation history; a [`Message`]
//! is what the resolver hands to the provider. The mapping between the two
//! lives in [`Turn::speaker`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions (persona, tone)
    System,
}

/// A single message sent to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }
}

/// One item of caller-supplied conversation history.
///
/// The web client sends `{"type": "bot", "text": ..}` while API callers send
/// `{"role": "assistant", "text": ..}`. Deserialization never fails: a role
/// that is missing or not a string becomes `None`, and text that is missing
/// or not a string becomes empty. `role` is preferred when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Turn {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    pub text: String,
}

impl<'de> Deserialize<'de> for Turn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl Turn {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            text: text.into(),
        }
    }

    /// Read a turn out of arbitrary JSON, defaulting whatever is unusable.
    pub fn from_value(value: &Value) -> Self {
        Self {
            role: str_field(value, "role")
                .or_else(|| str_field(value, "type"))
                .map(str::to_owned),
            text: str_field(value, "text").unwrap_or_default().to_owned(),
        }
    }

    /// Read a history list out of arbitrary JSON. Anything but an array,
    /// `null` included, is an empty history.
    pub fn history_from_value(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().map(Self::from_value).collect())
            .unwrap_or_default()
    }

    /// Which provider role this turn is forwarded as.
    ///
    /// `assistant` and `bot` (any case) map to [`Role::Assistant`]; everything
    /// else, including a missing role, maps to [`Role::User`].
    pub fn speaker(&self) -> Role {
        match self.role.as_deref().map(str::trim) {
            Some(r) if r.eq_ignore_ascii_case("assistant") || r.eq_ignore_ascii_case("bot") => {
                Role::Assistant
            }
            _ => Role::User,
        }
    }

    /// Convert into a provider message.
    pub fn to_message(&self) -> Message {
        Message::with_role(self.speaker(), self.text.clone())
    }
}

/// `deserialize_with` helper for history fields: see [`Turn::history_from_value`].
pub fn deserialize_history<'de, D>(deserializer: D) -> Result<Vec<Turn>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Turn::history_from_value(&value))
}

fn str_field<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value.get(name).and_then(Value::as_str)
}
