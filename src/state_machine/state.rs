//! Feedback workflow state types

use crate::model::MessageRef;

/// The bot message a workflow run is acting on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub conversation_id: String,
    pub message: MessageRef,
}

impl Target {
    /// Id sent to the backend for this message
    pub fn wire_id(&self) -> String {
        self.message.wire_id(&self.conversation_id)
    }
}

/// Original and regenerated bot reply awaiting an operator decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub original: String,
    pub improved: String,
}

/// Feedback workflow state.
///
/// ```text
/// Idle -> RatingUp -> Idle
/// Idle -> AwaitingFeedbackText -> SubmittingFeedback -> RequestingImprovement
///      -> AwaitingDecision -> ResolvingImprovement -> Idle
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedbackState {
    #[default]
    Idle,

    /// Helpful rating applied locally, waiting for the backend ack
    RatingUp { target: Target },

    /// Down-rating chosen, waiting for the operator's explanation
    AwaitingFeedbackText { target: Target },

    /// Unhelpful rating applied locally, waiting for the backend ack
    SubmittingFeedback { target: Target, feedback: String },

    /// Waiting for the backend to regenerate the reply
    RequestingImprovement { target: Target, feedback: String },

    /// Improved reply shown, waiting for accept or reject
    AwaitingDecision { target: Target, proposal: Proposal },

    /// Decision sent, waiting for the backend to persist it
    ResolvingImprovement {
        target: Target,
        proposal: Proposal,
        accept: bool,
    },
}

impl FeedbackState {
    /// A backend request is outstanding; operator actions are rejected
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            FeedbackState::RatingUp { .. }
                | FeedbackState::SubmittingFeedback { .. }
                | FeedbackState::RequestingImprovement { .. }
                | FeedbackState::ResolvingImprovement { .. }
        )
    }

    #[allow(dead_code)] // Used in tests
    pub fn target(&self) -> Option<&Target> {
        match self {
            FeedbackState::Idle => None,
            FeedbackState::RatingUp { target }
            | FeedbackState::AwaitingFeedbackText { target }
            | FeedbackState::SubmittingFeedback { target, .. }
            | FeedbackState::RequestingImprovement { target, .. }
            | FeedbackState::AwaitingDecision { target, .. }
            | FeedbackState::ResolvingImprovement { target, .. } => Some(target),
        }
    }

    pub fn proposal(&self) -> Option<&Proposal> {
        match self {
            FeedbackState::AwaitingDecision { proposal, .. }
            | FeedbackState::ResolvingImprovement { proposal, .. } => Some(proposal),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeedbackState::Idle => "idle",
            FeedbackState::RatingUp { .. } => "rating_up",
            FeedbackState::AwaitingFeedbackText { .. } => "awaiting_feedback_text",
            FeedbackState::SubmittingFeedback { .. } => "submitting_feedback",
            FeedbackState::RequestingImprovement { .. } => "requesting_improvement",
            FeedbackState::AwaitingDecision { .. } => "awaiting_decision",
            FeedbackState::ResolvingImprovement { .. } => "resolving_improvement",
        }
    }
}
