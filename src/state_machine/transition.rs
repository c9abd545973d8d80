//! Pure state transition function

use super::state::{Proposal, Target};
use super::{Effect, Event, FeedbackState, Verdict};
use crate::client::{ImproveRequest, RateRequest, UpdateResponseRequest};
use crate::model::{MessagePatch, MessageRef};
use crate::store::ConversationStore;
use thiserror::Error;

const RATED_HELPFUL: &str = "Response rated as helpful!";
const RATED_HELPFUL_LOCAL: &str = "Response rated as helpful (saved locally)";
const FEEDBACK_SAVED: &str = "Feedback submitted";
const FEEDBACK_SAVED_LOCAL: &str = "Feedback saved locally";
const FEEDBACK_REQUIRED: &str = "Please provide feedback on why the response wasn't helpful.";
const RESPONSE_UPDATED: &str = "Response updated successfully!";
const CONVERSATION_EXCLUDED: &str = "Conversation marked for exclusion from exports";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: FeedbackState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: FeedbackState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A request is already in flight, wait for it to finish")]
    Busy,
    #[error("{0}")]
    Validation(String),
    #[error("Conversation {0} is excluded from export and can no longer be rated")]
    ConversationExcluded(String),
    #[error("Only bot messages can be rated")]
    NotRateable,
    #[error("Message is already rated")]
    AlreadyRated,
    #[error("Message not found: {0}")]
    MessageNotFound(MessageRef),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
///
/// Given the same state, store contents and event it always produces the
/// same result; all I/O is described by the returned effects.
pub fn transition(
    state: &FeedbackState,
    store: &ConversationStore,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    if state.is_in_flight() && event.is_operator_event() {
        return Err(TransitionError::Busy);
    }

    match (state, event) {
        // ============================================================
        // Rating
        // ============================================================

        // Idle + Rate(up) -> RatingUp, rating applied locally right away
        (FeedbackState::Idle, Event::Rate { message, verdict: Verdict::Up }) => {
            let target = rateable_target(store, &message)?;
            Ok(TransitionResult::new(FeedbackState::RatingUp {
                target: target.clone(),
            })
            .with_effect(Effect::mutate(
                &target.conversation_id,
                &target.message,
                MessagePatch::rated_helpful(),
            ))
            .with_effect(Effect::persist_rating(RateRequest::helpful(target.wire_id()))))
        }

        // Idle + Rate(down) -> AwaitingFeedbackText, nothing applied yet
        (FeedbackState::Idle, Event::Rate { message, verdict: Verdict::Down }) => {
            let target = rateable_target(store, &message)?;
            Ok(TransitionResult::new(FeedbackState::AwaitingFeedbackText { target }))
        }

        (FeedbackState::RatingUp { .. }, Event::RatingPersisted { degraded }) => {
            let text = if degraded { RATED_HELPFUL_LOCAL } else { RATED_HELPFUL };
            Ok(TransitionResult::new(FeedbackState::Idle).with_effect(Effect::notify_success(text)))
        }

        // ============================================================
        // Feedback
        // ============================================================

        (FeedbackState::AwaitingFeedbackText { target }, Event::SubmitFeedback { text }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::Validation(FEEDBACK_REQUIRED.to_string()));
            }
            ensure_target(store, target)?;
            Ok(TransitionResult::new(FeedbackState::SubmittingFeedback {
                target: target.clone(),
                feedback: text.clone(),
            })
            .with_effect(Effect::mutate(
                &target.conversation_id,
                &target.message,
                MessagePatch::rated_unhelpful(text.clone()),
            ))
            .with_effect(Effect::persist_rating(RateRequest::unhelpful(
                target.wire_id(),
                text,
            ))))
        }

        (FeedbackState::AwaitingFeedbackText { .. }, Event::CancelFeedback) => {
            Ok(TransitionResult::new(FeedbackState::Idle))
        }

        // Down-rating stored (or absorbed) -> ask for an improved reply
        (FeedbackState::SubmittingFeedback { target, feedback }, Event::RatingPersisted { degraded }) => {
            let text = if degraded { FEEDBACK_SAVED_LOCAL } else { FEEDBACK_SAVED };
            Ok(TransitionResult::new(FeedbackState::RequestingImprovement {
                target: target.clone(),
                feedback: feedback.clone(),
            })
            .with_effect(Effect::notify_success(text))
            .with_effect(Effect::request_improvement(ImproveRequest {
                conversation_id: target.conversation_id.clone(),
                message_id: target.wire_id(),
                feedback: feedback.clone(),
            })))
        }

        // ============================================================
        // Improvement
        // ============================================================

        (FeedbackState::RequestingImprovement { target, .. }, Event::ImprovementReady { original, improved }) => {
            if improved.trim().is_empty() {
                return Ok(TransitionResult::new(FeedbackState::Idle).with_effect(
                    Effect::notify_error("Failed to generate an improved response: empty reply"),
                ));
            }
            Ok(TransitionResult::new(FeedbackState::AwaitingDecision {
                target: target.clone(),
                proposal: Proposal { original, improved },
            }))
        }

        // Abort the sub-flow; the unhelpful rating stays applied
        (FeedbackState::RequestingImprovement { .. }, Event::ImprovementFailed { message }) => {
            Ok(TransitionResult::new(FeedbackState::Idle).with_effect(Effect::notify_error(
                format!("Failed to generate an improved response: {message}"),
            )))
        }

        // ============================================================
        // Decision
        // ============================================================

        (FeedbackState::AwaitingDecision { target, proposal }, Event::Resolve { accept }) => {
            ensure_target(store, target)?;
            Ok(TransitionResult::new(FeedbackState::ResolvingImprovement {
                target: target.clone(),
                proposal: proposal.clone(),
                accept,
            })
            .with_effect(Effect::persist_decision(UpdateResponseRequest {
                conversation_id: target.conversation_id.clone(),
                message_id: target.wire_id(),
                accept,
                improved_response: proposal.improved.clone(),
            })))
        }

        (FeedbackState::AwaitingDecision { .. }, Event::DismissImprovement) => {
            Ok(TransitionResult::new(FeedbackState::Idle))
        }

        // Accepted -> replace content, flip rating to helpful
        (
            FeedbackState::ResolvingImprovement { target, proposal, accept: true },
            Event::DecisionPersisted,
        ) => Ok(TransitionResult::new(FeedbackState::Idle)
            .with_effect(Effect::mutate(
                &target.conversation_id,
                &target.message,
                MessagePatch::improved(proposal.improved.clone()),
            ))
            .with_effect(Effect::notify_success(RESPONSE_UPDATED))),

        // Rejected -> the whole conversation is excluded from export
        (
            FeedbackState::ResolvingImprovement { target, accept: false, .. },
            Event::DecisionPersisted,
        ) => Ok(TransitionResult::new(FeedbackState::Idle)
            .with_effect(Effect::MarkNegative {
                conversation_id: target.conversation_id.clone(),
            })
            .with_effect(Effect::notify_success(CONVERSATION_EXCLUDED))),

        // Nothing applied; back to the decision so it can be retried
        (FeedbackState::ResolvingImprovement { target, proposal, .. }, Event::DecisionFailed { message }) => {
            Ok(TransitionResult::new(FeedbackState::AwaitingDecision {
                target: target.clone(),
                proposal: proposal.clone(),
            })
            .with_effect(Effect::notify_error(format!("Failed to update response: {message}"))))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with event {:?}",
            state.name(),
            event
        ))),
    }
}

/// A recorded target must still resolve inside its conversation; a reload
/// may have dropped or shortened it while the operator was deciding.
fn ensure_target(store: &ConversationStore, target: &Target) -> Result<(), TransitionError> {
    match store.resolve(&target.message) {
        Some(found) if found.conversation.id == target.conversation_id => Ok(()),
        _ => Err(TransitionError::MessageNotFound(target.message.clone())),
    }
}

/// Resolve and validate the message an operator wants to rate. The target
/// keeps the message's id whenever it has one.
fn rateable_target(
    store: &ConversationStore,
    message: &MessageRef,
) -> Result<Target, TransitionError> {
    let resolved = store
        .resolve(message)
        .ok_or_else(|| TransitionError::MessageNotFound(message.clone()))?;
    let conversation = resolved.conversation;
    let found = resolved.message();

    if conversation.is_negative {
        return Err(TransitionError::ConversationExcluded(conversation.id.clone()));
    }
    if !found.is_bot() {
        return Err(TransitionError::NotRateable);
    }
    if found.rating.is_some() {
        return Err(TransitionError::AlreadyRated);
    }

    Ok(Target {
        conversation_id: conversation.id.clone(),
        message: MessageRef::for_message(&conversation.id, resolved.index, found.id.as_deref()),
    })
}
