//! Chat backend client
//!
//! The `Backend` trait is the whole HTTP contract the dashboard and the
//! chat session depend on; `HttpBackend` speaks it over reqwest.

mod error;
mod http;
mod types;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpBackend;
pub use types::*;

use crate::model::{Conversation, Message};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Remote operations of the chat backend
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, BackendError>;

    async fn get_conversation(&self, id: &str) -> Result<Conversation, BackendError>;

    /// Create a conversation; the backend seeds it with a welcome message
    async fn start_conversation(&self) -> Result<Conversation, BackendError>;

    /// Send a visitor message and receive the bot reply
    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message, BackendError>;

    async fn rate_message(&self, request: &RateRequest) -> Result<Ack, BackendError>;

    async fn improve_message(&self, request: &ImproveRequest)
        -> Result<ImprovedResponse, BackendError>;

    async fn update_response(&self, request: &UpdateResponseRequest)
        -> Result<Ack, BackendError>;
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, BackendError> {
        (**self).list_conversations().await
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation, BackendError> {
        (**self).get_conversation(id).await
    }

    async fn start_conversation(&self) -> Result<Conversation, BackendError> {
        (**self).start_conversation().await
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message, BackendError> {
        (**self).send_message(request).await
    }

    async fn rate_message(&self, request: &RateRequest) -> Result<Ack, BackendError> {
        (**self).rate_message(request).await
    }

    async fn improve_message(
        &self,
        request: &ImproveRequest,
    ) -> Result<ImprovedResponse, BackendError> {
        (**self).improve_message(request).await
    }

    async fn update_response(
        &self,
        request: &UpdateResponseRequest,
    ) -> Result<Ack, BackendError> {
        (**self).update_response(request).await
    }
}

/// Logging wrapper for backends
pub struct LoggingBackend {
    inner: Arc<dyn Backend>,
}

impl LoggingBackend {
    pub fn new(inner: Arc<dyn Backend>) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(operation: &str, start: Instant, result: &Result<T, BackendError>) {
    let duration = start.elapsed();
    match result {
        Ok(_) => {
            tracing::debug!(
                operation,
                duration_ms = %duration.as_millis(),
                "Backend call completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                operation,
                duration_ms = %duration.as_millis(),
                kind = ?e.kind,
                transient = e.kind.is_transient(),
                status = ?e.status,
                error = %e.message,
                "Backend call failed"
            );
        }
    }
}

#[async_trait]
impl Backend for LoggingBackend {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, BackendError> {
        let start = Instant::now();
        let result = self.inner.list_conversations().await;
        log_outcome("list_conversations", start, &result);
        result
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation, BackendError> {
        let start = Instant::now();
        let result = self.inner.get_conversation(id).await;
        log_outcome("get_conversation", start, &result);
        result
    }

    async fn start_conversation(&self) -> Result<Conversation, BackendError> {
        let start = Instant::now();
        let result = self.inner.start_conversation().await;
        log_outcome("start_conversation", start, &result);
        result
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message, BackendError> {
        let start = Instant::now();
        let result = self.inner.send_message(request).await;
        log_outcome("send_message", start, &result);
        result
    }

    async fn rate_message(&self, request: &RateRequest) -> Result<Ack, BackendError> {
        let start = Instant::now();
        let result = self.inner.rate_message(request).await;
        log_outcome("rate_message", start, &result);
        result
    }

    async fn improve_message(
        &self,
        request: &ImproveRequest,
    ) -> Result<ImprovedResponse, BackendError> {
        let start = Instant::now();
        let result = self.inner.improve_message(request).await;
        log_outcome("improve_message", start, &result);
        result
    }

    async fn update_response(
        &self,
        request: &UpdateResponseRequest,
    ) -> Result<Ack, BackendError> {
        let start = Instant::now();
        let result = self.inner.update_response(request).await;
        log_outcome("update_response", start, &result);
        result
    }
}
