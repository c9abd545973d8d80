//! Feedback workflow runtime executor

use crate::client::{Backend, BackendError};
use crate::model::MessageRef;
use crate::state_machine::{
    transition, Effect, Event, FeedbackState, Notification, RemoteCall, TransitionError, Verdict,
};
use crate::store::{ConversationStore, StoreError};
use std::sync::Arc;

/// Drives the feedback state machine against a store and a backend.
///
/// One instance per admin view. Each operation runs the whole event chain
/// it triggers (including backend round-trips) before returning the
/// notifications it produced.
pub struct FeedbackWorkflow<B: Backend + ?Sized> {
    state: FeedbackState,
    backend: Arc<B>,
}

impl<B: Backend + ?Sized> FeedbackWorkflow<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            state: FeedbackState::Idle,
            backend,
        }
    }

    pub fn state(&self) -> &FeedbackState {
        &self.state
    }

    pub async fn rate(
        &mut self,
        store: &mut ConversationStore,
        message: MessageRef,
        verdict: Verdict,
    ) -> Result<Vec<Notification>, TransitionError> {
        self.handle(store, Event::Rate { message, verdict }).await
    }

    pub async fn submit_feedback(
        &mut self,
        store: &mut ConversationStore,
        text: impl Into<String>,
    ) -> Result<Vec<Notification>, TransitionError> {
        self.handle(store, Event::SubmitFeedback { text: text.into() })
            .await
    }

    pub async fn resolve_improvement(
        &mut self,
        store: &mut ConversationStore,
        accept: bool,
    ) -> Result<Vec<Notification>, TransitionError> {
        self.handle(store, Event::Resolve { accept }).await
    }

    pub async fn cancel_feedback(
        &mut self,
        store: &mut ConversationStore,
    ) -> Result<Vec<Notification>, TransitionError> {
        self.handle(store, Event::CancelFeedback).await
    }

    pub async fn dismiss_improvement(
        &mut self,
        store: &mut ConversationStore,
    ) -> Result<Vec<Notification>, TransitionError> {
        self.handle(store, Event::DismissImprovement).await
    }

    /// Process an event and every completion event its effects generate.
    ///
    /// Operator errors (validation, busy, disabled rating) come back as
    /// `Err` with the state unchanged. Backend failures never do: they end
    /// up as error notifications and an explicit state. A store change that
    /// no longer applies (the target vanished in a reload) stops the chain
    /// in `Idle` with an error notification; no later effect or backend
    /// call runs.
    pub async fn handle(
        &mut self,
        store: &mut ConversationStore,
        event: Event,
    ) -> Result<Vec<Notification>, TransitionError> {
        let mut notifications = Vec::new();
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            // Pure state transition
            let result = match transition(&self.state, store, current_event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(state = self.state.name(), error = %e, "Transition rejected");
                    return Err(e);
                }
            };

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            tracing::debug!(
                from = old_state.name(),
                to = self.state.name(),
                "Feedback workflow transition"
            );

            for effect in result.effects {
                match self.execute_effect(store, effect, &mut notifications).await {
                    Ok(Some(generated_event)) => events_to_process.push(generated_event),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(state = self.state.name(), error = %e, "Store update failed, abandoning workflow");
                        self.state = FeedbackState::Idle;
                        notifications.push(Notification::error(format!(
                            "Could not update the conversation: {e}"
                        )));
                        return Ok(notifications);
                    }
                }
            }
        }

        Ok(notifications)
    }

    async fn execute_effect(
        &self,
        store: &mut ConversationStore,
        effect: Effect,
        notifications: &mut Vec<Notification>,
    ) -> Result<Option<Event>, StoreError> {
        match effect {
            Effect::MutateMessage {
                conversation_id,
                message,
                patch,
            } => {
                store.apply_message_mutation(&conversation_id, &message, &patch)?;
                Ok(None)
            }
            Effect::MarkNegative { conversation_id } => {
                store.mark_negative(&conversation_id)?;
                tracing::info!(conv_id = %conversation_id, "Conversation excluded from export");
                Ok(None)
            }
            Effect::Remote(call) => Ok(Some(self.execute_remote(call).await)),
            Effect::Notify(notification) => {
                if notification.is_error() {
                    tracing::warn!(text = %notification.text, "Workflow error");
                } else {
                    tracing::info!(text = %notification.text, "Workflow notification");
                }
                notifications.push(notification);
                Ok(None)
            }
        }
    }

    /// Perform a backend call and turn its outcome into the next event.
    ///
    /// Rating failures are absorbed: the rating is already applied locally.
    /// Improvement and decision failures are surfaced as failure events.
    async fn execute_remote(&self, call: RemoteCall) -> Event {
        let name = call.name();
        match call {
            RemoteCall::Rate(request) => match self.backend.rate_message(&request).await {
                Ok(_) => Event::RatingPersisted { degraded: false },
                Err(e) => {
                    log_absorbed(name, &e);
                    Event::RatingPersisted { degraded: true }
                }
            },
            RemoteCall::Improve(request) => match self.backend.improve_message(&request).await {
                Ok(response) => Event::ImprovementReady {
                    original: response.original_response,
                    improved: response.improved_response,
                },
                Err(e) => Event::ImprovementFailed { message: e.message },
            },
            RemoteCall::Decide(request) => match self.backend.update_response(&request).await {
                Ok(_) => Event::DecisionPersisted,
                Err(e) => Event::DecisionFailed { message: e.message },
            },
        }
    }
}

fn log_absorbed(call: &str, error: &BackendError) {
    tracing::warn!(
        call,
        kind = ?error.kind,
        error = %error.message,
        "Backend call failed, continuing with local state"
    );
}
