//! Visitor chat session
//!
//! Starts a conversation and exchanges messages with the bot. The user's
//! message is appended before the backend answers and stays in the
//! transcript even when the send fails.

use crate::client::{Backend, BackendError, SendMessageRequest};
use crate::media::{CssVideoDetector, MediaAttachment, MediaDetector};
use crate::model::Message;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No conversation started")]
    NotStarted,
    #[error("Message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Remote(#[from] BackendError),
}

pub struct ChatSession<B: Backend + ?Sized> {
    backend: Arc<B>,
    conversation_id: Option<String>,
    messages: Vec<Message>,
    detector: Box<dyn MediaDetector>,
}

impl<B: Backend + ?Sized> ChatSession<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            conversation_id: None,
            messages: Vec::new(),
            detector: Box::new(CssVideoDetector),
        }
    }

    #[allow(dead_code)] // Builder for alternative detectors
    pub fn with_detector(mut self, detector: Box<dyn MediaDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Create a conversation and adopt the backend's initial messages.
    ///
    /// Calling it again abandons the current transcript.
    pub async fn start(&mut self) -> Result<(String, Vec<Message>), SessionError> {
        let conversation = self.backend.start_conversation().await?;
        tracing::info!(conv_id = %conversation.id, "Started conversation");
        self.conversation_id = Some(conversation.id.clone());
        self.messages = conversation.messages.clone();
        Ok((conversation.id, conversation.messages))
    }

    /// Send `text` to the conversation `start` created and append the
    /// bot's reply.
    pub async fn send(&mut self, text: &str) -> Result<Message, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let conversation_id = self
            .conversation_id
            .clone()
            .ok_or(SessionError::NotStarted)?;

        self.messages.push(Message::user(text));

        let request = SendMessageRequest {
            conversation_id,
            content: text.to_string(),
        };
        match self.backend.send_message(&request).await {
            Ok(reply) => {
                self.messages.push(reply.clone());
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(conv_id = %request.conversation_id, error = %e, "Failed to send message");
                Err(e.into())
            }
        }
    }

    /// Attachments to render, keyed by message index
    pub fn attachments(&self) -> Vec<(usize, MediaAttachment)> {
        self.messages
            .iter()
            .enumerate()
            .filter_map(|(i, m)| self.detector.detect(m).map(|a| (i, a)))
            .collect()
    }
}
