//! Request and response bodies of the chat backend

use crate::model::Rating;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/messages`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest {
    pub conversation_id: String,
    pub content: String,
}

/// Body of `POST /api/messages/rate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub message_id: String,
    pub rating: Rating,
    pub feedback: String,
}

impl RateRequest {
    pub fn helpful(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            rating: Rating::Helpful,
            feedback: String::new(),
        }
    }

    pub fn unhelpful(message_id: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            rating: Rating::Unhelpful,
            feedback: feedback.into(),
        }
    }
}

/// Body of `POST /api/messages/improve`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImproveRequest {
    pub conversation_id: String,
    pub message_id: String,
    pub feedback: String,
}

/// Response of `POST /api/messages/improve`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovedResponse {
    pub original_response: String,
    pub improved_response: String,
}

/// Body of `POST /api/conversations/update-response`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponseRequest {
    pub conversation_id: String,
    pub message_id: String,
    pub accept: bool,
    pub improved_response: String,
}

/// Generic acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    #[allow(dead_code)] // Used in tests
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

fn default_success() -> bool {
    true
}
