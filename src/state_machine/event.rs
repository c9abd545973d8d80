//! Events that drive the feedback workflow

use crate::model::MessageRef;

/// Operator verdict on a bot message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Up,
    Down,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Operator events
    Rate {
        message: MessageRef,
        verdict: Verdict,
    },
    SubmitFeedback {
        text: String,
    },
    CancelFeedback,
    Resolve {
        accept: bool,
    },
    DismissImprovement,

    // Backend completions
    RatingPersisted {
        /// Backend failed and the failure was absorbed
        degraded: bool,
    },
    ImprovementReady {
        original: String,
        improved: String,
    },
    ImprovementFailed {
        message: String,
    },
    DecisionPersisted,
    DecisionFailed {
        message: String,
    },
}

impl Event {
    /// Raised by the operator rather than by a backend completion
    pub fn is_operator_event(&self) -> bool {
        matches!(
            self,
            Event::Rate { .. }
                | Event::SubmitFeedback { .. }
                | Event::CancelFeedback
                | Event::Resolve { .. }
                | Event::DismissImprovement
        )
    }
}
