//! Core data model: entities, observations, conversations, and messages.
//!
//! Everything here is serde-serializable; the store adapters persist these
//! records as documents without interpreting them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Closed set of entity categories tracked by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Person,
    Company,
    Project,
    Concept,
    Tool,
    Location,
    Event,
}

impl EntityType {
    /// All known types, used when a lookup is not scoped to one type.
    pub const ALL: [EntityType; 7] = [
        EntityType::Person,
        EntityType::Company,
        EntityType::Project,
        EntityType::Concept,
        EntityType::Tool,
        EntityType::Location,
        EntityType::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Company => "company",
            Self::Project => "project",
            Self::Concept => "concept",
            Self::Tool => "tool",
            Self::Location => "location",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped piece of textual evidence supporting an entity.
///
/// Observation lists are append-only; merges concatenate, never replace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub confidence: f32,
    pub tags: Vec<String>,
}

/// Descriptive attributes attached to an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityAttributes {
    pub description: String,
    /// Extraction confidence in [0, 1].
    pub confidence: f32,
    pub source: String,
    pub verified: bool,
}

/// A named real-world or conceptual thing tracked across conversations.
///
/// Uniqueness key is `(type, lowercase name-or-alias)`: two extractions
/// matching the same key merge into one persisted entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Assigned on first persistence, stable thereafter.
    pub id: Uuid,

    /// Canonical display string.
    pub name: String,

    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// Alternate names considered equivalent for lookup.
    pub aliases: Vec<String>,

    pub attributes: EntityAttributes,

    /// Append-only evidence trail, in discovery order.
    pub observations: Vec<Observation>,

    /// Fixed-length vector, present once the retrieval engine computed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    pub last_mentioned: DateTime<Utc>,

    /// Immutable after first write.
    pub created_at: DateTime<Utc>,

    /// Advances on every merge.
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Case-insensitive match against the canonical name or any alias.
    pub fn matches_name(&self, name: &str) -> bool {
        let needle = name.to_lowercase();
        self.name.to_lowercase() == needle
            || self.aliases.iter().any(|a| a.to_lowercase() == needle)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// One turn inside a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub tools_used: Vec<String>,
    /// Ids of entities extracted from this message.
    pub entities_mentioned: Vec<Uuid>,
    pub timestamp: DateTime<Utc>,
}

/// Bookkeeping counters carried on a conversation record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationMetadata {
    pub duration_minutes: u32,
    pub tool_calls_count: usize,
    pub entities_created: usize,
}

/// Ordered set of messages for one user within one calendar day.
///
/// At most one conversation per `(user_id, day)` is treated as current and
/// receives appends; the day bucket comes from `timestamp` truncated to the
/// UTC date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    /// Creation time; its UTC date is the day-bucket key.
    pub timestamp: DateTime<Utc>,
    pub messages: Vec<Message>,
    /// Derived one-line summary, recomputed on append.
    pub context_summary: String,
    /// Deduplicated entity names mentioned in this conversation.
    pub topics: Vec<String>,
    pub sentiment: String,
    pub metadata: ConversationMetadata,
}

impl Conversation {
    /// Start a new conversation for `user_id` with a single message.
    pub fn start(user_id: &str, message: Message) -> Self {
        let metadata = ConversationMetadata {
            duration_minutes: 0,
            tool_calls_count: message.tools_used.len(),
            entities_created: message.entities_mentioned.len(),
        };
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            messages: vec![message],
            context_summary: String::new(),
            topics: Vec::new(),
            sentiment: "neutral".to_string(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entity(name: &str, aliases: &[&str]) -> Entity {
        let now = Utc::now();
        Entity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            entity_type: EntityType::Company,
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            attributes: EntityAttributes {
                description: String::new(),
                confidence: 1.0,
                source: "test".to_string(),
                verified: false,
            },
            observations: Vec::new(),
            embedding: None,
            last_mentioned: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_entity_type_serde_is_lowercase() {
        let json = serde_json::to_string(&EntityType::Company).unwrap();
        assert_eq!(json, "\"company\"");

        let parsed: EntityType = serde_json::from_str("\"tool\"").unwrap();
        assert_eq!(parsed, EntityType::Tool);
    }

    #[test]
    fn test_matches_name_is_case_insensitive() {
        let e = entity("Anthropic", &["anthropic.com"]);
        assert!(e.matches_name("ANTHROPIC"));
        assert!(e.matches_name("Anthropic.Com"));
        assert!(!e.matches_name("OpenAI"));
    }

    #[test]
    fn test_conversation_start_counts_metadata() {
        let message = Message {
            id: Uuid::new_v4(),
            role: MessageRole::User,
            content: "hello".to_string(),
            tools_used: vec!["web_search".to_string()],
            entities_mentioned: vec![Uuid::new_v4(), Uuid::new_v4()],
            timestamp: Utc::now(),
        };
        let conv = Conversation::start("alice", message);
        assert_eq!(conv.metadata.tool_calls_count, 1);
        assert_eq!(conv.metadata.entities_created, 2);
        assert_eq!(conv.sentiment, "neutral");
        assert_eq!(conv.messages.len(), 1);
    }
}
