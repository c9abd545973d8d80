//! Conversation and message records
//!
//! Field names follow the backend's JSON so that records fetched from the
//! API round-trip unchanged into the export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

const PREVIEW_CHARS: usize = 50;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// Operator judgment on a bot message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "up")]
    Helpful,
    #[serde(rename = "down")]
    Unhelpful,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Helpful => f.write_str("helpful"),
            Rating::Unhelpful => f.write_str("unhelpful"),
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Backend id; legacy messages may not have one
    #[serde(default)]
    pub id: Option<String>,
    pub sender: Sender,
    pub content: String,
    #[serde(default, with = "wire_time::option")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_improved: bool,
}

impl Message {
    /// A locally authored user message, not yet known to the backend
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            sender: Sender::User,
            content: content.into(),
            timestamp: Some(Utc::now()),
            rating: None,
            feedback: None,
            is_improved: false,
        }
    }

    #[allow(dead_code)] // Constructor for API completeness
    pub fn bot(id: Option<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::Bot,
            content: content.into(),
            timestamp: Some(Utc::now()),
            rating: None,
            feedback: None,
            is_improved: false,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

/// A conversation between one visitor and the bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(with = "wire_time")]
    pub created_at: DateTime<Utc>,
    /// Excluded from export; never reset once set
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_negative: bool,
}

impl Conversation {
    /// First message, truncated for list display
    pub fn preview(&self) -> String {
        let Some(first) = self.messages.first() else {
            return "No messages".to_string();
        };
        let mut preview: String = first.content.chars().take(PREVIEW_CHARS).collect();
        if first.content.chars().count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        preview
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Addresses one message.
///
/// Ids win whenever a message has one; a position is only a fallback for
/// messages the backend never assigned an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageRef {
    ById(String),
    ByPosition { conversation_id: String, index: usize },
}

impl MessageRef {
    /// Reference for the message at `index`, preferring its id
    pub fn for_message(conversation_id: &str, index: usize, id: Option<&str>) -> Self {
        match id {
            Some(id) => MessageRef::ById(id.to_string()),
            None => MessageRef::ByPosition {
                conversation_id: conversation_id.to_string(),
                index,
            },
        }
    }

    /// Id sent to the backend. Positional references become `temp-` ids,
    /// which the backend acknowledges without persisting.
    pub fn wire_id(&self, conversation_id: &str) -> String {
        match self {
            MessageRef::ById(id) => id.clone(),
            MessageRef::ByPosition { index, .. } => format!("temp-{conversation_id}-{index}"),
        }
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRef::ById(id) => write!(f, "message {id}"),
            MessageRef::ByPosition {
                conversation_id,
                index,
            } => write!(f, "message #{index} of conversation {conversation_id}"),
        }
    }
}

/// Copy-on-write change to a message.
///
/// `feedback` travels with `rating`: whenever a rating is written the
/// feedback is replaced too, so a helpful rating never keeps stale feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub rating: Option<Rating>,
    pub feedback: Option<String>,
    pub is_improved: Option<bool>,
}

impl MessagePatch {
    pub fn rated_helpful() -> Self {
        Self {
            rating: Some(Rating::Helpful),
            ..Self::default()
        }
    }

    pub fn rated_unhelpful(feedback: impl Into<String>) -> Self {
        Self {
            rating: Some(Rating::Unhelpful),
            feedback: Some(feedback.into()),
            ..Self::default()
        }
    }

    /// Accepted improved response replaces the content and flips the rating
    pub fn improved(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            rating: Some(Rating::Helpful),
            feedback: None,
            is_improved: Some(true),
        }
    }

    pub fn apply(&self, message: &Message) -> Message {
        let mut updated = message.clone();
        if let Some(content) = &self.content {
            updated.content.clone_from(content);
        }
        if let Some(rating) = self.rating {
            updated.rating = Some(rating);
            updated.feedback.clone_from(&self.feedback);
        }
        if let Some(is_improved) = self.is_improved {
            updated.is_improved = is_improved;
        }
        updated
    }
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Timestamps arrive either as RFC 3339 or as naive ISO-8601 (no offset),
/// the latter being UTC.
mod wire_time {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    /// Keeps whatever sub-second precision the backend sent
    fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use super::{format, parse};
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)] // signature fixed by serde's `with`
        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_some(&format(value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
                None => Ok(None),
            }
        }
    }
}
