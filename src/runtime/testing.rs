//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use crate::client::{
    Ack, Backend, BackendError, ImproveRequest, ImprovedResponse, RateRequest,
    SendMessageRequest, UpdateResponseRequest,
};
use crate::model::{Conversation, Message};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Fixtures
// ============================================================================

pub mod fixtures {
    use crate::model::{Conversation, Message};
    use chrono::{TimeZone, Utc};

    pub fn bot(id: Option<&str>, content: &str) -> Message {
        Message::bot(id.map(String::from), content)
    }

    pub fn user(content: &str) -> Message {
        Message::user(content)
    }

    pub fn conversation(id: &str, messages: Vec<Message>) -> Conversation {
        Conversation {
            id: id.to_string(),
            messages,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            is_negative: false,
        }
    }
}

// ============================================================================
// Mock Backend
// ============================================================================

/// A backend call as the mock received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    List,
    Get(String),
    Start,
    Send(SendMessageRequest),
    Rate(RateRequest),
    Improve(ImproveRequest),
    Decide(UpdateResponseRequest),
}

type Queue<T> = Mutex<VecDeque<Result<T, BackendError>>>;

/// Mock backend that returns queued responses per operation
#[derive(Default)]
pub struct MockBackend {
    lists: Queue<Vec<Conversation>>,
    details: Queue<Conversation>,
    starts: Queue<Conversation>,
    replies: Queue<Message>,
    ratings: Queue<Ack>,
    improvements: Queue<ImprovedResponse>,
    decisions: Queue<Ack>,
    /// Record of all calls made
    pub calls: Mutex<Vec<RecordedCall>>,
}

fn pop<T>(queue: &Queue<T>, operation: &str) -> Result<T, BackendError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(BackendError::network(format!("No mock response queued for {operation}"))))
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_list(&self, result: Result<Vec<Conversation>, BackendError>) {
        self.lists.lock().unwrap().push_back(result);
    }

    pub fn queue_detail(&self, result: Result<Conversation, BackendError>) {
        self.details.lock().unwrap().push_back(result);
    }

    pub fn queue_start(&self, result: Result<Conversation, BackendError>) {
        self.starts.lock().unwrap().push_back(result);
    }

    pub fn queue_reply(&self, result: Result<Message, BackendError>) {
        self.replies.lock().unwrap().push_back(result);
    }

    pub fn queue_rating(&self, result: Result<Ack, BackendError>) {
        self.ratings.lock().unwrap().push_back(result);
    }

    pub fn queue_improvement(&self, original: &str, improved: &str) {
        self.improvements.lock().unwrap().push_back(Ok(ImprovedResponse {
            original_response: original.to_string(),
            improved_response: improved.to_string(),
        }));
    }

    pub fn queue_improvement_error(&self, error: BackendError) {
        self.improvements.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_decision(&self, result: Result<Ack, BackendError>) {
        self.decisions.lock().unwrap().push_back(result);
    }

    /// Get recorded calls
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, BackendError> {
        self.record(RecordedCall::List);
        pop(&self.lists, "list_conversations")
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation, BackendError> {
        self.record(RecordedCall::Get(id.to_string()));
        pop(&self.details, "get_conversation")
    }

    async fn start_conversation(&self) -> Result<Conversation, BackendError> {
        self.record(RecordedCall::Start);
        pop(&self.starts, "start_conversation")
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message, BackendError> {
        self.record(RecordedCall::Send(request.clone()));
        pop(&self.replies, "send_message")
    }

    async fn rate_message(&self, request: &RateRequest) -> Result<Ack, BackendError> {
        self.record(RecordedCall::Rate(request.clone()));
        pop(&self.ratings, "rate_message")
    }

    async fn improve_message(
        &self,
        request: &ImproveRequest,
    ) -> Result<ImprovedResponse, BackendError> {
        self.record(RecordedCall::Improve(request.clone()));
        pop(&self.improvements, "improve_message")
    }

    async fn update_response(
        &self,
        request: &UpdateResponseRequest,
    ) -> Result<Ack, BackendError> {
        self.record(RecordedCall::Decide(request.clone()));
        pop(&self.decisions, "update_response")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{bot, conversation, user};
    use super::*;
    use crate::export;
    use crate::model::{MessageRef, Rating};
    use crate::runtime::FeedbackWorkflow;
    use crate::state_machine::{FeedbackState, NotificationLevel, Proposal, TransitionError, Verdict};
    use crate::store::ConversationStore;
    use std::sync::Arc;

    fn test_store() -> ConversationStore {
        let mut store = ConversationStore::new();
        store.load(vec![
            conversation(
                "c-1",
                vec![bot(Some("m-0"), "Hello"), user("How do I center a div?"), bot(None, "Use tables")],
            ),
            conversation("c-2", vec![bot(Some("m-9"), "Welcome")]),
        ]);
        store
    }

    fn setup() -> (Arc<MockBackend>, FeedbackWorkflow<MockBackend>, ConversationStore) {
        let backend = Arc::new(MockBackend::new());
        let workflow = FeedbackWorkflow::new(Arc::clone(&backend));
        (backend, workflow, test_store())
    }

    fn message(store: &ConversationStore, conv: &str, index: usize) -> Message {
        store.get(conv).unwrap().messages[index].clone()
    }

    fn positional(index: usize) -> MessageRef {
        MessageRef::ByPosition {
            conversation_id: "c-1".into(),
            index,
        }
    }

    /// Drive a positional bot message to `AwaitingDecision`
    async fn reach_decision(
        backend: &MockBackend,
        workflow: &mut FeedbackWorkflow<MockBackend>,
        store: &mut ConversationStore,
    ) {
        backend.queue_rating(Ok(Ack::ok()));
        backend.queue_improvement("Use tables", "Use flexbox: display: flex; justify-content: center;");
        workflow.rate(store, positional(2), Verdict::Down).await.unwrap();
        workflow.submit_feedback(store, "outdated advice").await.unwrap();
        assert!(matches!(workflow.state(), FeedbackState::AwaitingDecision { .. }));
    }

    #[tokio::test]
    async fn test_mock_backend_records_and_runs_dry() {
        let backend = MockBackend::new();
        backend.queue_rating(Ok(Ack::ok()));

        let request = RateRequest::helpful("m-1");
        assert!(backend.rate_message(&request).await.is_ok());
        // Second call should fail (no more responses)
        assert!(backend.rate_message(&request).await.is_err());
        assert_eq!(backend.recorded_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_rate_up_success() {
        let (backend, mut workflow, mut store) = setup();
        backend.queue_rating(Ok(Ack::ok()));

        let notes = workflow
            .rate(&mut store, MessageRef::ById("m-0".into()), Verdict::Up)
            .await
            .unwrap();

        assert_eq!(message(&store, "c-1", 0).rating, Some(Rating::Helpful));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Success);
        assert_eq!(notes[0].text, "Response rated as helpful!");
        assert_eq!(workflow.state(), &FeedbackState::Idle);
        assert_eq!(
            backend.recorded_calls(),
            vec![RecordedCall::Rate(RateRequest::helpful("m-0"))]
        );
    }

    #[tokio::test]
    async fn test_rate_up_survives_backend_failure() {
        let (backend, mut workflow, mut store) = setup();
        backend.queue_rating(Err(BackendError::server_error("HTTP 503: down")));

        let notes = workflow
            .rate(&mut store, MessageRef::ById("m-0".into()), Verdict::Up)
            .await
            .unwrap();

        assert_eq!(message(&store, "c-1", 0).rating, Some(Rating::Helpful));
        assert_eq!(notes[0].level, NotificationLevel::Success);
        assert_eq!(notes[0].text, "Response rated as helpful (saved locally)");
        assert_eq!(workflow.state(), &FeedbackState::Idle);
    }

    #[tokio::test]
    async fn test_feedback_flow_reaches_decision() {
        let (backend, mut workflow, mut store) = setup();

        workflow
            .rate(&mut store, MessageRef::ById("m-0".into()), Verdict::Down)
            .await
            .unwrap();
        assert!(matches!(workflow.state(), FeedbackState::AwaitingFeedbackText { .. }));
        assert!(message(&store, "c-1", 0).rating.is_none());

        // Empty text leaves everything as it was
        let err = workflow.submit_feedback(&mut store, "").await.unwrap_err();
        assert!(matches!(err, TransitionError::Validation(_)));
        assert!(matches!(workflow.state(), FeedbackState::AwaitingFeedbackText { .. }));
        assert!(message(&store, "c-1", 0).rating.is_none());
        assert!(backend.recorded_calls().is_empty());

        backend.queue_rating(Ok(Ack::ok()));
        backend.queue_improvement("Hello", "Hello! What can I help you with today?");
        let notes = workflow.submit_feedback(&mut store, "too slow").await.unwrap();

        let rated = message(&store, "c-1", 0);
        assert_eq!(rated.rating, Some(Rating::Unhelpful));
        assert_eq!(rated.feedback.as_deref(), Some("too slow"));
        assert_eq!(notes.len(), 1);
        assert_eq!(
            workflow.state().proposal(),
            Some(&Proposal {
                original: "Hello".into(),
                improved: "Hello! What can I help you with today?".into(),
            })
        );
        assert_eq!(
            backend.recorded_calls(),
            vec![
                RecordedCall::Rate(RateRequest::unhelpful("m-0", "too slow")),
                RecordedCall::Improve(ImproveRequest {
                    conversation_id: "c-1".into(),
                    message_id: "m-0".into(),
                    feedback: "too slow".into(),
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_feedback_persist_failure_still_requests_improvement() {
        let (backend, mut workflow, mut store) = setup();
        backend.queue_rating(Err(BackendError::network("connection refused")));
        backend.queue_improvement("Hello", "Hi there!");

        workflow
            .rate(&mut store, MessageRef::ById("m-0".into()), Verdict::Down)
            .await
            .unwrap();
        let notes = workflow.submit_feedback(&mut store, "rude").await.unwrap();

        assert_eq!(notes[0].text, "Feedback saved locally");
        assert!(matches!(workflow.state(), FeedbackState::AwaitingDecision { .. }));
    }

    #[tokio::test]
    async fn test_improvement_failure_keeps_down_rating() {
        let (backend, mut workflow, mut store) = setup();
        backend.queue_rating(Ok(Ack::ok()));
        backend.queue_improvement_error(BackendError::not_found("HTTP 404: Message not found"));

        workflow.rate(&mut store, positional(2), Verdict::Down).await.unwrap();
        let notes = workflow.submit_feedback(&mut store, "wrong").await.unwrap();

        assert_eq!(workflow.state(), &FeedbackState::Idle);
        assert!(notes.iter().any(|n| n.is_error()
            && n.text.contains("Failed to generate an improved response")));
        let rated = message(&store, "c-1", 2);
        assert_eq!(rated.rating, Some(Rating::Unhelpful));
        assert_eq!(rated.content, "Use tables");
    }

    #[tokio::test]
    async fn test_accept_replaces_message() {
        let (backend, mut workflow, mut store) = setup();
        reach_decision(&backend, &mut workflow, &mut store).await;
        backend.queue_decision(Ok(Ack::ok()));

        let notes = workflow.resolve_improvement(&mut store, true).await.unwrap();

        let improved = message(&store, "c-1", 2);
        assert_eq!(improved.content, "Use flexbox: display: flex; justify-content: center;");
        assert_eq!(improved.rating, Some(Rating::Helpful));
        assert!(improved.is_improved);
        assert!(!store.get("c-1").unwrap().is_negative);
        assert_eq!(notes[0].text, "Response updated successfully!");
        assert_eq!(workflow.state(), &FeedbackState::Idle);
        assert!(matches!(
            backend.recorded_calls().last(),
            Some(RecordedCall::Decide(UpdateResponseRequest { accept: true, message_id, .. }))
                if message_id == "temp-c-1-2"
        ));
    }

    #[tokio::test]
    async fn test_reject_excludes_conversation() {
        let (backend, mut workflow, mut store) = setup();
        reach_decision(&backend, &mut workflow, &mut store).await;
        backend.queue_decision(Ok(Ack::ok()));

        workflow.resolve_improvement(&mut store, false).await.unwrap();

        assert!(store.get("c-1").unwrap().is_negative);
        assert_eq!(message(&store, "c-1", 2).content, "Use tables");
        let exported = export::filter(store.conversations());
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].id, "c-2");

        // Rating is disabled once the conversation is excluded
        let err = workflow
            .rate(&mut store, MessageRef::ById("m-0".into()), Verdict::Up)
            .await
            .unwrap_err();
        assert_eq!(err, TransitionError::ConversationExcluded("c-1".into()));
    }

    #[tokio::test]
    async fn test_decision_failure_is_surfaced_and_retryable() {
        let (backend, mut workflow, mut store) = setup();
        reach_decision(&backend, &mut workflow, &mut store).await;
        let before = store.get("c-1").unwrap();
        backend.queue_decision(Err(BackendError::from_status(400, r#"{"detail":"Failed to update message"}"#)));

        let notes = workflow.resolve_improvement(&mut store, true).await.unwrap();

        assert!(notes[0].is_error());
        assert!(notes[0].text.contains("Failed to update message"));
        assert!(matches!(workflow.state(), FeedbackState::AwaitingDecision { .. }));
        assert!(Arc::ptr_eq(&before, &store.get("c-1").unwrap()));

        // Retry from the same proposal
        backend.queue_decision(Ok(Ack::ok()));
        workflow.resolve_improvement(&mut store, true).await.unwrap();
        assert_eq!(workflow.state(), &FeedbackState::Idle);
        assert!(message(&store, "c-1", 2).is_improved);
    }

    #[tokio::test]
    async fn test_dismiss_keeps_unhelpful_rating() {
        let (backend, mut workflow, mut store) = setup();
        reach_decision(&backend, &mut workflow, &mut store).await;

        workflow.dismiss_improvement(&mut store).await.unwrap();

        assert_eq!(workflow.state(), &FeedbackState::Idle);
        assert_eq!(message(&store, "c-1", 2).rating, Some(Rating::Unhelpful));
        assert!(!store.get("c-1").unwrap().is_negative);
    }

    #[tokio::test]
    async fn test_id_target_survives_reordering() {
        let (backend, mut workflow, mut store) = setup();
        backend.queue_rating(Ok(Ack::ok()));
        backend.queue_improvement("Hello", "Hi!");

        workflow
            .rate(&mut store, MessageRef::ById("m-0".into()), Verdict::Down)
            .await
            .unwrap();

        // A refresh reorders the messages while the operator is typing
        store.load(vec![
            conversation(
                "c-1",
                vec![user("How do I center a div?"), bot(None, "Use tables"), bot(Some("m-0"), "Hello")],
            ),
            conversation("c-2", vec![bot(Some("m-9"), "Welcome")]),
        ]);
        workflow.submit_feedback(&mut store, "too terse").await.unwrap();

        assert_eq!(message(&store, "c-1", 2).rating, Some(Rating::Unhelpful));
        assert!(message(&store, "c-1", 1).rating.is_none());
    }

    #[tokio::test]
    async fn test_reload_that_drops_target_blocks_feedback() {
        let (backend, mut workflow, mut store) = setup();
        workflow.rate(&mut store, positional(2), Verdict::Down).await.unwrap();

        // A refresh shortens c-1 while the operator is typing
        store.load(vec![conversation("c-1", vec![bot(Some("m-0"), "Hello")])]);

        let err = workflow.submit_feedback(&mut store, "outdated").await.unwrap_err();

        assert_eq!(err, TransitionError::MessageNotFound(positional(2)));
        assert!(matches!(workflow.state(), FeedbackState::AwaitingFeedbackText { .. }));
        assert!(backend.recorded_calls().is_empty());
        assert_eq!(store.get("c-1").unwrap().messages.len(), 1);

        workflow.cancel_feedback(&mut store).await.unwrap();
        assert_eq!(workflow.state(), &FeedbackState::Idle);
    }

    #[tokio::test]
    async fn test_reload_that_drops_target_blocks_decision() {
        let (backend, mut workflow, mut store) = setup();
        reach_decision(&backend, &mut workflow, &mut store).await;
        let calls = backend.recorded_calls().len();

        store.load(vec![conversation("c-1", vec![bot(Some("m-0"), "Hello")])]);

        let err = workflow.resolve_improvement(&mut store, true).await.unwrap_err();

        assert_eq!(err, TransitionError::MessageNotFound(positional(2)));
        assert_eq!(backend.recorded_calls().len(), calls);
        assert!(matches!(workflow.state(), FeedbackState::AwaitingDecision { .. }));
        workflow.dismiss_improvement(&mut store).await.unwrap();
        assert_eq!(workflow.state(), &FeedbackState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_feedback() {
        let (backend, mut workflow, mut store) = setup();
        workflow
            .rate(&mut store, MessageRef::ById("m-9".into()), Verdict::Down)
            .await
            .unwrap();
        workflow.cancel_feedback(&mut store).await.unwrap();

        assert_eq!(workflow.state(), &FeedbackState::Idle);
        assert!(message(&store, "c-2", 0).rating.is_none());
        assert!(backend.recorded_calls().is_empty());
    }
}
