//! reqwest implementation of the backend contract

use super::types::{
    Ack, ImproveRequest, ImprovedResponse, RateRequest, SendMessageRequest, UpdateResponseRequest,
};
use super::{Backend, BackendError};
use crate::config::ClientConfig;
use crate::model::{Conversation, Message};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// HTTP client for the chat backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::network(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BackendError::network(format!("Invalid base URL {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::network(format!(
                "Invalid base URL {}: cannot hold a path",
                config.base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::network(format!("Invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, BackendError> {
        let response = self.client.get(self.url(path)?).send().await?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, path: &[&str], body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)?).json(body).send().await?;
        decode(response).await
    }

    async fn post_ack<B>(&self, path: &[&str], body: &B) -> Result<Ack, BackendError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let ack: Ack = self.post_json(path, body).await?;
        if ack.success {
            Ok(ack)
        } else {
            Err(BackendError::rejected(
                ack.message
                    .unwrap_or_else(|| format!("Backend rejected /{}", path.join("/"))),
            ))
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::from_status(status.as_u16(), &body));
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, BackendError> {
        self.get_json(&["api", "conversations"]).await
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation, BackendError> {
        self.get_json(&["api", "conversations", id]).await
    }

    async fn start_conversation(&self) -> Result<Conversation, BackendError> {
        let response = self.client.post(self.url(&["api", "conversations"])?).send().await?;
        decode(response).await
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message, BackendError> {
        self.post_json(&["api", "messages"], request).await
    }

    async fn rate_message(&self, request: &RateRequest) -> Result<Ack, BackendError> {
        self.post_ack(&["api", "messages", "rate"], request).await
    }

    async fn improve_message(
        &self,
        request: &ImproveRequest,
    ) -> Result<ImprovedResponse, BackendError> {
        self.post_json(&["api", "messages", "improve"], request).await
    }

    async fn update_response(
        &self,
        request: &UpdateResponseRequest,
    ) -> Result<Ack, BackendError> {
        self.post_ack(&["api", "conversations", "update-response"], request)
            .await
    }
}
