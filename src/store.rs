//! In-memory conversation store
//!
//! Conversations are held behind `Arc` and never edited in place: every
//! mutation builds a new conversation and swaps the handle, so observers
//! holding an older `Arc` can detect changes with `Arc::ptr_eq`.

use crate::model::{Conversation, Message, MessagePatch, MessageRef};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
    #[error("Message not found: {0}")]
    MessageNotFound(MessageRef),
}

/// A message located by [`ConversationStore::resolve`]
#[derive(Debug, Clone)]
pub struct ResolvedMessage<'a> {
    pub conversation: &'a Arc<Conversation>,
    pub index: usize,
}

impl ResolvedMessage<'_> {
    pub fn message(&self) -> &Message {
        &self.conversation.messages[self.index]
    }
}

#[derive(Debug, Default, Clone)]
pub struct ConversationStore {
    conversations: Vec<Arc<Conversation>>,
    /// Advisory UI selection
    selected: Option<String>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list, keeping local feedback the fetched copies
    /// lack (see [`merge`]). The selection survives if its conversation is
    /// still present.
    pub fn load(&mut self, conversations: Vec<Conversation>) {
        let previous = std::mem::take(&mut self.conversations);
        self.conversations = conversations
            .into_iter()
            .map(|incoming| match previous.iter().find(|c| c.id == incoming.id) {
                Some(local) => Arc::new(merge(local, incoming)),
                None => Arc::new(incoming),
            })
            .collect();
        if let Some(id) = &self.selected {
            if self.position(id).is_none() {
                self.selected = None;
            }
        }
    }

    /// Replace a conversation with a freshly fetched copy, or append it
    pub fn upsert(&mut self, conversation: Conversation) {
        match self.position(&conversation.id) {
            Some(pos) => {
                let merged = merge(&self.conversations[pos], conversation);
                self.conversations[pos] = Arc::new(merged);
            }
            None => self.conversations.push(Arc::new(conversation)),
        }
    }

    /// Select a conversation. Unknown ids leave the selection unchanged.
    pub fn select(&mut self, id: &str) -> Option<Arc<Conversation>> {
        if self.position(id).is_some() {
            self.selected = Some(id.to_string());
        } else {
            tracing::debug!(conv_id = %id, "Ignoring selection of unknown conversation");
        }
        self.selected()
    }

    pub fn selected(&self) -> Option<Arc<Conversation>> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &str) -> Option<Arc<Conversation>> {
        self.position(id).map(|pos| Arc::clone(&self.conversations[pos]))
    }

    pub fn conversations(&self) -> &[Arc<Conversation>] {
        &self.conversations
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Find a message: by id across all conversations, or by position
    /// within the named conversation. Never both.
    pub fn resolve(&self, message: &MessageRef) -> Option<ResolvedMessage<'_>> {
        match message {
            MessageRef::ById(id) => self.conversations.iter().find_map(|conv| {
                conv.messages
                    .iter()
                    .position(|m| m.id.as_deref() == Some(id.as_str()))
                    .map(|index| ResolvedMessage {
                        conversation: conv,
                        index,
                    })
            }),
            MessageRef::ByPosition {
                conversation_id,
                index,
            } => {
                let conv = &self.conversations[self.position(conversation_id)?];
                (*index < conv.messages.len()).then_some(ResolvedMessage {
                    conversation: conv,
                    index: *index,
                })
            }
        }
    }

    /// Apply `patch` to one message of `conversation_id`, returning the
    /// index of the message that changed.
    pub fn apply_message_mutation(
        &mut self,
        conversation_id: &str,
        message: &MessageRef,
        patch: &MessagePatch,
    ) -> Result<usize, StoreError> {
        let pos = self
            .position(conversation_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;
        let current = &self.conversations[pos];

        let index = match message {
            MessageRef::ById(id) => current
                .messages
                .iter()
                .position(|m| m.id.as_deref() == Some(id.as_str())),
            MessageRef::ByPosition {
                conversation_id: owner,
                index,
            } => (owner == conversation_id && *index < current.messages.len()).then_some(*index),
        }
        .ok_or_else(|| StoreError::MessageNotFound(message.clone()))?;

        let mut updated = Conversation::clone(current);
        updated.messages[index] = patch.apply(&current.messages[index]);
        self.conversations[pos] = Arc::new(updated);
        Ok(index)
    }

    /// Flag a conversation for exclusion from export. Monotonic: a
    /// conversation that is already negative is left untouched.
    pub fn mark_negative(&mut self, conversation_id: &str) -> Result<(), StoreError> {
        let pos = self
            .position(conversation_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;
        if !self.conversations[pos].is_negative {
            let mut updated = Conversation::clone(&self.conversations[pos]);
            updated.is_negative = true;
            self.conversations[pos] = Arc::new(updated);
        }
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }
}

/// Fold local state into a fetched copy of the same conversation.
///
/// Ratings never revert to absent and exclusion never clears, even when the
/// backend missed the write. A bot message with no rating in `incoming`
/// takes the local rating, feedback and accepted improvement. Messages pair
/// by id, or by position when neither side has one.
fn merge(local: &Conversation, mut incoming: Conversation) -> Conversation {
    incoming.is_negative |= local.is_negative;
    for (index, message) in incoming.messages.iter_mut().enumerate() {
        if message.rating.is_some() || !message.is_bot() {
            continue;
        }
        let counterpart = match &message.id {
            Some(id) => local
                .messages
                .iter()
                .find(|m| m.id.as_deref() == Some(id.as_str())),
            None => local.messages.get(index).filter(|m| m.id.is_none()),
        };
        let Some(rated) = counterpart.filter(|m| m.is_bot() && m.rating.is_some()) else {
            continue;
        };
        tracing::debug!(conv_id = %incoming.id, index, "Keeping local rating over fetched copy");
        message.rating = rated.rating;
        message.feedback.clone_from(&rated.feedback);
        if rated.is_improved {
            message.content.clone_from(&rated.content);
            message.is_improved = true;
        }
    }
    incoming
}
