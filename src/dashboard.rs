//! Admin dashboard controller
//!
//! Ties the conversation list, the selected conversation, the feedback
//! workflow and the export together for one operator.

use crate::client::{Backend, BackendError, BackendErrorKind};
use crate::export::{self, ExportError, ExportSummary};
use crate::model::{Conversation, MessageRef};
use crate::runtime::FeedbackWorkflow;
use crate::state_machine::{FeedbackState, Notification, TransitionError, Verdict};
use crate::store::ConversationStore;
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const LOAD_FAILED: &str = "Failed to load conversations. Please try again later.";
const DETAIL_FAILED: &str = "Failed to load conversation details. Please try again later.";

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("{0}")]
    Load(BackendError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub struct AdminDashboard<B: Backend + ?Sized> {
    backend: Arc<B>,
    store: ConversationStore,
    workflow: FeedbackWorkflow<B>,
    load_error: Option<String>,
}

impl<B: Backend + ?Sized> AdminDashboard<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            workflow: FeedbackWorkflow::new(Arc::clone(&backend)),
            backend,
            store: ConversationStore::new(),
            load_error: None,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn workflow_state(&self) -> &FeedbackState {
        self.workflow.state()
    }

    /// Banner text for the last failed load, if any
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Fetch the conversation list and select the first conversation
    pub async fn load(&mut self) -> Result<(), DashboardError> {
        match self.backend.list_conversations().await {
            Ok(conversations) => {
                let first = conversations.first().map(|c| c.id.clone());
                tracing::info!(count = conversations.len(), "Loaded conversations");
                self.store.load(conversations);
                if let Some(id) = first {
                    self.store.select(&id);
                }
                self.load_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load conversations");
                self.load_error = Some(LOAD_FAILED.to_string());
                Err(DashboardError::Load(e))
            }
        }
    }

    /// Fetch a conversation's detail and make it the selection.
    ///
    /// An id the backend does not know leaves the selection as it was.
    pub async fn select(&mut self, id: &str) -> Result<Option<Arc<Conversation>>, DashboardError> {
        match self.backend.get_conversation(id).await {
            Ok(conversation) => {
                self.store.upsert(conversation);
                Ok(self.store.select(id))
            }
            Err(e) if e.kind == BackendErrorKind::NotFound => {
                tracing::debug!(conv_id = %id, "Conversation not found, keeping selection");
                Ok(self.store.selected())
            }
            Err(e) => {
                tracing::error!(conv_id = %id, error = %e, "Failed to load conversation");
                self.load_error = Some(DETAIL_FAILED.to_string());
                Err(DashboardError::Load(e))
            }
        }
    }

    pub fn selected(&self) -> Option<Arc<Conversation>> {
        self.store.selected()
    }

    pub async fn rate(
        &mut self,
        message: MessageRef,
        verdict: Verdict,
    ) -> Result<Vec<Notification>, TransitionError> {
        self.workflow.rate(&mut self.store, message, verdict).await
    }

    pub async fn submit_feedback(
        &mut self,
        text: &str,
    ) -> Result<Vec<Notification>, TransitionError> {
        self.workflow.submit_feedback(&mut self.store, text).await
    }

    pub async fn resolve_improvement(
        &mut self,
        accept: bool,
    ) -> Result<Vec<Notification>, TransitionError> {
        self.workflow.resolve_improvement(&mut self.store, accept).await
    }

    pub async fn cancel_feedback(&mut self) -> Result<Vec<Notification>, TransitionError> {
        self.workflow.cancel_feedback(&mut self.store).await
    }

    pub async fn dismiss_improvement(&mut self) -> Result<Vec<Notification>, TransitionError> {
        self.workflow.dismiss_improvement(&mut self.store).await
    }

    pub fn exportable_count(&self) -> usize {
        export::filter(self.store.conversations()).len()
    }

    pub fn export_jsonl(&self) -> Result<String, DashboardError> {
        let exportable = export::filter(self.store.conversations());
        export::to_jsonl(&exportable).map_err(|e| DashboardError::Export(e.into()))
    }

    pub fn export_to(&self, dir: &Path, date: NaiveDate) -> Result<ExportSummary, DashboardError> {
        Ok(export::write_export(dir, self.store.conversations(), date)?)
    }
}
