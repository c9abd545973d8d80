//! Effects produced by state transitions

use crate::client::{ImproveRequest, RateRequest, UpdateResponseRequest};
use crate::model::{MessagePatch, MessageRef};
use std::fmt;

/// Backend request issued by the workflow.
///
/// Rating persistence absorbs failures (the rating is already applied
/// locally and completes as degraded). Improvement and decision failures
/// are surfaced: nothing local depends on an improvement that never
/// arrived, and an unsaved decision is never applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Rate(RateRequest),
    Improve(ImproveRequest),
    Decide(UpdateResponseRequest),
}

impl RemoteCall {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteCall::Rate(_) => "rate",
            RemoteCall::Improve(_) => "improve",
            RemoteCall::Decide(_) => "decide",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient, dismissible message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Copy-on-write change to one message in the store
    MutateMessage {
        conversation_id: String,
        message: MessageRef,
        patch: MessagePatch,
    },

    /// Flag a conversation for exclusion from export
    MarkNegative { conversation_id: String },

    /// Call the backend; the outcome comes back as an event
    Remote(RemoteCall),

    /// Show a notification
    Notify(Notification),
}

impl Effect {
    /// Rating persistence never blocks the operator
    pub fn persist_rating(request: RateRequest) -> Self {
        Effect::Remote(RemoteCall::Rate(request))
    }

    pub fn request_improvement(request: ImproveRequest) -> Self {
        Effect::Remote(RemoteCall::Improve(request))
    }

    pub fn persist_decision(request: UpdateResponseRequest) -> Self {
        Effect::Remote(RemoteCall::Decide(request))
    }

    pub fn mutate(conversation_id: &str, message: &MessageRef, patch: MessagePatch) -> Self {
        Effect::MutateMessage {
            conversation_id: conversation_id.to_string(),
            message: message.clone(),
            patch,
        }
    }

    pub fn notify_success(text: impl Into<String>) -> Self {
        Effect::Notify(Notification::success(text))
    }

    pub fn notify_error(text: impl Into<String>) -> Self {
        Effect::Notify(Notification::error(text))
    }
}
