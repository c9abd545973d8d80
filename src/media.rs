//! Media attachments inferred from bot replies
//!
//! Presentation-only: nothing in the feedback workflow consults these.

use crate::model::Message;

/// A video or other media item to show next to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub title: String,
    pub duration: String,
    pub thumbnail_url: String,
}

/// Decides whether a message should be rendered with an attachment
pub trait MediaDetector: Send + Sync {
    fn detect(&self, message: &Message) -> Option<MediaAttachment>;
}

/// Bot replies mentioning both "CSS" and "video" get the tutorial video card.
///
/// Matching is case-sensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssVideoDetector;

impl MediaDetector for CssVideoDetector {
    fn detect(&self, message: &Message) -> Option<MediaAttachment> {
        if !message.is_bot() {
            return None;
        }
        if !(message.content.contains("CSS") && message.content.contains("video")) {
            return None;
        }
        Some(MediaAttachment {
            title: "CSS Tutorial Video".to_string(),
            duration: "1:23:13".to_string(),
            thumbnail_url: "https://via.placeholder.com/400x200/1a1a1a/0088cc?text=CSS+Tutorial+Video"
                .to_string(),
        })
    }
}
