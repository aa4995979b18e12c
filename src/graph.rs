//! Memory graph: extraction, merge, conversation threading, and reference
//! resolution.
//!
//! The graph owns conversation threading exclusively. It keeps no entity
//! state of its own: every operation reads through the store adapters and
//! lets them own durability.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::errors::Result;
use crate::extractor::EntityExtractor;
use crate::rag::RetrievalEngine;
use crate::store::{ConversationStore, EntityStore, merge_upsert};
use crate::types::{Conversation, Entity, EntityType, Message, MessageRole};

/// Conversations consulted when assembling relevant context.
const CONTEXT_CONVERSATIONS: usize = 3;

/// Flattened history messages handed to the retrieval engine.
const CONTEXT_HISTORY_MESSAGES: usize = 10;

/// Topics surfaced in a generated conversation summary.
const SUMMARY_TOPIC_COUNT: usize = 5;

/// Conversations scanned by [`MemoryGraph::analyze_conversations`].
const ANALYSIS_HISTORY_LIMIT: usize = 50;

/// Topics reported by conversation analysis, ranked by frequency.
const TOP_TOPICS_LIMIT: usize = 10;

/// Aggregate statistics over a user's recent conversation history.
#[derive(Debug, serde::Serialize)]
pub struct ConversationAnalysis {
    pub period_days: u32,
    pub total_conversations: usize,
    pub total_messages: usize,
    pub unique_entities: usize,
    /// Topics ranked by how many conversations mention them.
    pub top_topics: Vec<String>,
    pub average_messages_per_conversation: f64,
}

/// Result of processing one message through the graph.
#[derive(Debug)]
pub struct ProcessedMessage {
    /// Store-resolved entities mentioned by the message.
    pub entities: Vec<Entity>,
    pub message_id: Uuid,
}

/// Plausible entity types for a pronoun or demonstrative phrase.
///
/// Data-driven rule table rather than scattered conditionals; extend by
/// adding rows.
fn reference_types(reference: &str) -> Option<&'static [EntityType]> {
    match reference {
        "he" | "she" => Some(&[EntityType::Person]),
        "it" => Some(&[EntityType::Tool, EntityType::Concept, EntityType::Project]),
        "they" => Some(&[EntityType::Company, EntityType::Person]),
        "this company" | "the company" => Some(&[EntityType::Company]),
        "that project" | "the project" => Some(&[EntityType::Project]),
        _ => None,
    }
}

pub struct MemoryGraph {
    entities: Arc<dyn EntityStore>,
    conversations: Arc<dyn ConversationStore>,
    rag: Arc<RetrievalEngine>,
    extractor: EntityExtractor,
}

impl MemoryGraph {
    pub fn new(
        entities: Arc<dyn EntityStore>,
        conversations: Arc<dyn ConversationStore>,
        rag: Arc<RetrievalEngine>,
        extractor: EntityExtractor,
    ) -> Self {
        Self {
            entities,
            conversations,
            rag,
            extractor,
        }
    }

    /// Extract entities from `content`, merge them into the store, compute
    /// their embeddings, and thread the message into the user's current-day
    /// conversation.
    pub async fn process_message(
        &self,
        content: &str,
        role: MessageRole,
        user_id: &str,
        tools_used: Vec<String>,
    ) -> Result<ProcessedMessage> {
        let extracted = self.extractor.extract(content, &format!("message:{role}"));
        debug!(count = extracted.len(), user_id, "extracted entities");

        let mut entities = Vec::with_capacity(extracted.len());
        let mut entity_ids = Vec::with_capacity(extracted.len());
        for candidate in extracted {
            let merged = merge_upsert(self.entities.as_ref(), candidate).await?;
            let stored = self.rag.add_entity(merged).await?;
            entity_ids.push(stored.id);
            entities.push(stored);
        }

        let message = Message {
            id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            tools_used,
            entities_mentioned: entity_ids,
            timestamp: chrono::Utc::now(),
        };
        let message_id = message.id;

        self.thread_message(message, user_id).await?;

        Ok(ProcessedMessage {
            entities,
            message_id,
        })
    }

    /// Fetch the most recent conversations for `user_id`, flatten their
    /// messages chronologically, and hand the tail to the retrieval engine
    /// together with `query`.
    pub async fn get_relevant_context(&self, query: &str, user_id: &str) -> Result<String> {
        let recent = self
            .conversations
            .get_history(user_id, CONTEXT_CONVERSATIONS)
            .await?;

        // History arrives newest-first; flatten oldest-first so the tail is
        // the most recent messages in chronological order.
        let mut history: Vec<Message> = recent
            .into_iter()
            .rev()
            .flat_map(|c| c.messages)
            .collect();
        let tail_start = history.len().saturating_sub(CONTEXT_HISTORY_MESSAGES);
        history.drain(..tail_start);

        self.rag.find_relevant_context(query, &history).await
    }

    /// Resolve a free-text reference ("he", "it", "this company") against
    /// recent context strings.
    ///
    /// Pronoun references scan the context newest-first and return the
    /// store-resolved entity for the first extracted candidate of an allowed
    /// type. Unknown references fall back to a direct `concept` lookup.
    /// `None` is a normal outcome, not an error.
    pub async fn resolve_entity_reference(
        &self,
        reference: &str,
        context: &[String],
    ) -> Result<Option<Entity>> {
        let normalized = reference.trim().to_lowercase();

        if let Some(allowed) = reference_types(&normalized) {
            for text in context.iter().rev() {
                let candidates = self.extractor.extract(text, "context");
                if let Some(candidate) = candidates
                    .iter()
                    .find(|e| allowed.contains(&e.entity_type))
                {
                    return self
                        .entities
                        .find_by_name(&candidate.name, candidate.entity_type)
                        .await;
                }
            }
            return Ok(None);
        }

        self.entities
            .find_by_name(reference, EntityType::Concept)
            .await
    }

    /// Aggregate a user's recent conversations into summary statistics:
    /// message and entity totals plus topics ranked by conversation count.
    /// An empty history yields zeroed stats, not an error.
    pub async fn analyze_conversations(
        &self,
        user_id: &str,
        period_days: u32,
    ) -> Result<ConversationAnalysis> {
        let conversations = self
            .conversations
            .get_history(user_id, ANALYSIS_HISTORY_LIMIT)
            .await?;

        let total_messages: usize = conversations.iter().map(|c| c.messages.len()).sum();
        let unique_entities = conversations
            .iter()
            .flat_map(|c| c.messages.iter())
            .flat_map(|m| m.entities_mentioned.iter())
            .collect::<std::collections::HashSet<_>>()
            .len();

        let mut topic_counts: std::collections::HashMap<&str, usize> =
            std::collections::HashMap::new();
        for conversation in &conversations {
            for topic in &conversation.topics {
                *topic_counts.entry(topic.as_str()).or_default() += 1;
            }
        }
        let mut ranked: Vec<(&str, usize)> = topic_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let top_topics = ranked
            .into_iter()
            .take(TOP_TOPICS_LIMIT)
            .map(|(topic, _)| topic.to_string())
            .collect();

        let average = if conversations.is_empty() {
            0.0
        } else {
            total_messages as f64 / conversations.len() as f64
        };

        Ok(ConversationAnalysis {
            period_days,
            total_conversations: conversations.len(),
            total_messages,
            unique_entities,
            top_topics,
            average_messages_per_conversation: average,
        })
    }

    /// Append the message to the user's current-day conversation, creating a
    /// new conversation at the first message after a UTC day boundary.
    async fn thread_message(&self, message: Message, user_id: &str) -> Result<()> {
        let today = chrono::Utc::now().date_naive();
        let current = self
            .conversations
            .get_history(user_id, 1)
            .await?
            .into_iter()
            .find(|c| c.timestamp.date_naive() == today);

        match current {
            Some(mut conversation) => {
                conversation.metadata.tool_calls_count += message.tools_used.len();
                conversation.messages.push(message);
                self.refresh_summary(&mut conversation);
                self.conversations.append_or_create(&conversation).await
            }
            None => {
                let mut conversation = Conversation::start(user_id, message);
                self.refresh_summary(&mut conversation);
                self.conversations.append_or_create(&conversation).await
            }
        }
    }

    /// Recompute `topics` and the one-line `context_summary` from the full
    /// message list.
    fn refresh_summary(&self, conversation: &mut Conversation) {
        let all_text = conversation
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mentioned = self.extractor.extract(&all_text, "conversation");
        let mut topics: Vec<String> = Vec::new();
        for entity in &mentioned {
            if !topics.contains(&entity.name) {
                topics.push(entity.name.clone());
            }
        }
        conversation.topics = topics;

        let message_count = conversation.messages.len();
        let entity_count = conversation
            .messages
            .iter()
            .flat_map(|m| m.entities_mentioned.iter())
            .collect::<std::collections::HashSet<_>>()
            .len();

        conversation.context_summary = format!(
            "Conversation with {message_count} messages discussing {entity_count} entities including: {}",
            conversation
                .topics
                .iter()
                .take(SUMMARY_TOPIC_COUNT)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}
