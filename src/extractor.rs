//! Rule-based entity extraction.
//!
//! Two passes over the text, most specific first:
//! 1. An ordered table of type-specific pattern rules (multi-word project
//!    names before generic capitalized patterns before organization suffixes
//!    before person names). Pattern matches win key collisions.
//! 2. A heuristic tagger that recovers people, organizations, and places the
//!    patterns missed: capitalized-word sequences, title indicators (Dr.,
//!    Prof.), organization suffixes (Inc, Ltd), and a location keyword list.
//!
//! Candidates sharing `(type, lowercase name)` merge their observations in
//! discovery order. Extraction is a pure function of the text: no store or
//! network access, deterministic output in insertion order.

use chrono::Utc;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::config::ExtractionConfig;
use crate::types::{Entity, EntityAttributes, EntityType, Observation};

/// Confidence assigned to auto-extracted entities and their observations.
const AUTO_EXTRACT_CONFIDENCE: f32 = 0.8;

/// Observation context: characters kept on each side of the matched name.
const CONTEXT_WINDOW_CHARS: usize = 100;

/// Minimum entity name length; shorter candidates are noise.
const MIN_NAME_CHARS: usize = 3;

/// One type-specific extraction rule.
struct PatternRule {
    entity_type: EntityType,
    regex: &'static Regex,
}

static PROJECT_MCP: OnceLock<Regex> = OnceLock::new();
static PROJECT_SERVER: OnceLock<Regex> = OnceLock::new();
static PROJECT_SUFFIX: OnceLock<Regex> = OnceLock::new();
static TOOL_KNOWN: OnceLock<Regex> = OnceLock::new();
static COMPANY_SUFFIX: OnceLock<Regex> = OnceLock::new();
static COMPANY_KNOWN: OnceLock<Regex> = OnceLock::new();
static PERSON_FULL_NAME: OnceLock<Regex> = OnceLock::new();
static PERSON_TITLED: OnceLock<Regex> = OnceLock::new();

/// Ordered rule table; earlier rules claim the dedup key first.
fn pattern_rules() -> Vec<PatternRule> {
    vec![
        PatternRule {
            entity_type: EntityType::Project,
            regex: PROJECT_MCP.get_or_init(|| Regex::new(r"\bMCP [A-Za-z]+ Server\b").unwrap()),
        },
        PatternRule {
            entity_type: EntityType::Project,
            regex: PROJECT_SERVER
                .get_or_init(|| Regex::new(r"\b[A-Z][a-zA-Z]+ Server\b").unwrap()),
        },
        PatternRule {
            entity_type: EntityType::Project,
            regex: PROJECT_SUFFIX.get_or_init(|| {
                Regex::new(r"\b[A-Z][a-zA-Z]+ (?:Project|System|Platform|Framework)\b").unwrap()
            }),
        },
        PatternRule {
            entity_type: EntityType::Tool,
            regex: TOOL_KNOWN.get_or_init(|| {
                Regex::new(
                    r"\b(?:Claude|ChatGPT|VS Code|Docker|Kubernetes|React|TypeScript|Python|Rust)\b",
                )
                .unwrap()
            }),
        },
        PatternRule {
            entity_type: EntityType::Company,
            regex: COMPANY_SUFFIX
                .get_or_init(|| Regex::new(r"\b[A-Z][a-zA-Z]+ (?:Inc|Corp|Ltd|LLC|Co)\b").unwrap()),
        },
        PatternRule {
            entity_type: EntityType::Company,
            regex: COMPANY_KNOWN.get_or_init(|| {
                Regex::new(r"\b(?:Apple|Google|Microsoft|Amazon|Meta|Anthropic|OpenAI)\b").unwrap()
            }),
        },
        PatternRule {
            entity_type: EntityType::Person,
            regex: PERSON_FULL_NAME
                .get_or_init(|| Regex::new(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b").unwrap()),
        },
        PatternRule {
            entity_type: EntityType::Person,
            regex: PERSON_TITLED
                .get_or_init(|| Regex::new(r"\b(?:Mr|Mrs|Dr|Prof)\.? [A-Z][a-z]+").unwrap()),
        },
    ]
}

/// Rule-based entity extractor.
///
/// `extract(text, source)` is pure and deterministic given the text; every
/// produced entity carries exactly one synthesized observation.
pub struct EntityExtractor {
    stoplist: HashSet<String>,
    title_indicators: HashSet<String>,
    org_suffixes: HashSet<String>,
    location_keywords: HashSet<String>,
}

impl EntityExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        let stoplist = config.stoplist.iter().map(|w| w.to_lowercase()).collect();

        let title_indicators = ["mr", "mrs", "ms", "dr", "prof", "sir", "madam"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let org_suffixes = [
            "inc",
            "corp",
            "ltd",
            "llc",
            "co",
            "company",
            "corporation",
            "university",
            "institute",
            "foundation",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let location_keywords = [
            "paris",
            "london",
            "berlin",
            "madrid",
            "rome",
            "amsterdam",
            "zurich",
            "tokyo",
            "singapore",
            "sydney",
            "toronto",
            "new york",
            "san francisco",
            "seattle",
            "boston",
            "austin",
            "chicago",
            "bangalore",
            "mumbai",
            "delhi",
            "france",
            "germany",
            "japan",
            "india",
            "canada",
            "australia",
            "europe",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self {
            stoplist,
            title_indicators,
            org_suffixes,
            location_keywords,
        }
    }

    /// Extract candidate entities from `text`, tagging observations with
    /// `source` (e.g. `message:user`, `conversation`, `context`).
    pub fn extract(&self, text: &str, source: &str) -> Vec<Entity> {
        let mut entities: Vec<Entity> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        // Pass 1: type-specific pattern rules, most specific first.
        for rule in pattern_rules() {
            for m in rule.regex.find_iter(text) {
                let name = m.as_str().trim();
                let key = name.to_lowercase();
                if !seen.contains(&key) && self.is_valid_candidate(name) {
                    entities.push(self.build_entity(name, rule.entity_type, text, source));
                    seen.insert(key);
                }
            }
        }

        // Pass 2: heuristic tagger for people, organizations, and places.
        for (name, entity_type) in self.tag_text(text) {
            let key = name.to_lowercase();
            if !seen.contains(&key) && self.is_valid_candidate(&name) {
                entities.push(self.build_entity(&name, entity_type, text, source));
                seen.insert(key);
            }
        }

        dedup_entities(entities)
    }

    /// Heuristic linguistic tagging: capitalized sequences, title and
    /// organization-suffix indicators, location keywords.
    fn tag_text(&self, text: &str) -> Vec<(String, EntityType)> {
        let mut tagged = Vec::new();
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut skip_until = 0;

        for (i, word) in words.iter().enumerate() {
            if i < skip_until {
                continue;
            }

            let clean = word.trim_matches(|c: char| !c.is_alphanumeric());
            if clean.is_empty() {
                continue;
            }

            let lower = clean.to_lowercase();
            if self.stoplist.contains(&lower) {
                continue;
            }

            // Titles tag the name that follows, not themselves
            if self.title_indicators.contains(&lower) {
                continue;
            }

            // Known location keyword, single word
            if self.location_keywords.contains(&lower) {
                tagged.push((clean.to_string(), EntityType::Location));
                continue;
            }

            if !starts_uppercase(clean) {
                continue;
            }

            // Extend over the following capitalized words
            let mut name = clean.to_string();
            let mut j = i + 1;
            while j < words.len() && starts_uppercase(words[j]) {
                let next = words[j].trim_matches(|c: char| !c.is_alphanumeric());
                if !next.is_empty() && !self.stoplist.contains(&next.to_lowercase()) {
                    name.push(' ');
                    name.push_str(next);
                }
                j += 1;
            }
            if j > i + 1 {
                // Skip sub-spans of the multi-word name on later iterations
                skip_until = j;
            }

            let name_lower = name.to_lowercase();

            // Two-word location names ("New York")
            if self.location_keywords.contains(&name_lower) {
                tagged.push((name, EntityType::Location));
                continue;
            }

            // Organization suffix anywhere in the span ("Acme Corp")
            if name
                .split_whitespace()
                .any(|w| self.org_suffixes.contains(&w.to_lowercase()))
            {
                tagged.push((name, EntityType::Company));
                continue;
            }

            // Title indicator right before ("Dr. Chen")
            let preceded_by_title = i > 0
                && self.title_indicators.contains(
                    words[i - 1]
                        .trim_matches(|c: char| !c.is_alphanumeric())
                        .to_lowercase()
                        .as_str(),
                );

            if preceded_by_title || name.contains(' ') {
                // Multi-word capitalized sequences are likely proper names.
                // Single unknown capitalized words are usually sentence-start
                // noise, so they need a title indicator to qualify.
                tagged.push((name, EntityType::Person));
            }
        }

        tagged
    }

    /// Validity filter: minimum length and stoplist rejection.
    fn is_valid_candidate(&self, name: &str) -> bool {
        name.chars().count() >= MIN_NAME_CHARS && !self.stoplist.contains(&name.to_lowercase())
    }

    fn build_entity(
        &self,
        name: &str,
        entity_type: EntityType,
        full_text: &str,
        source: &str,
    ) -> Entity {
        let now = Utc::now();
        let observation = Observation {
            id: Uuid::new_v4(),
            content: context_window(full_text, name),
            timestamp: now,
            source: source.to_string(),
            confidence: AUTO_EXTRACT_CONFIDENCE,
            tags: vec!["auto-extracted".to_string()],
        };

        Entity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            entity_type,
            aliases: Vec::new(),
            attributes: EntityAttributes {
                description: format!("Auto-extracted {entity_type}"),
                confidence: AUTO_EXTRACT_CONFIDENCE,
                source: source.to_string(),
                verified: false,
            },
            observations: vec![observation],
            embedding: None,
            last_mentioned: now,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

fn starts_uppercase(word: &str) -> bool {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false)
}

/// Text window of ±100 characters around the first (case-insensitive)
/// occurrence of `name`, clipped to the text bounds. Char-indexed so
/// multi-byte text never splits a code point.
fn context_window(text: &str, name: &str) -> String {
    let lower_text = text.to_lowercase();
    let lower_name = name.to_lowercase();

    let Some(byte_idx) = lower_text.find(&lower_name) else {
        return text.chars().take(2 * CONTEXT_WINDOW_CHARS).collect();
    };

    let chars: Vec<char> = text.chars().collect();
    let char_idx = lower_text[..byte_idx].chars().count().min(chars.len());
    let name_chars = lower_name.chars().count();

    let start = char_idx.saturating_sub(CONTEXT_WINDOW_CHARS);
    let end = (char_idx + name_chars + CONTEXT_WINDOW_CHARS).min(chars.len());

    chars[start..end].iter().collect::<String>().trim().to_string()
}

/// Final global dedup: group survivors by `(type, lowercase name)` and merge
/// observation lists in discovery order.
fn dedup_entities(entities: Vec<Entity>) -> Vec<Entity> {
    let mut merged: Vec<Entity> = Vec::new();
    let mut index: HashMap<(EntityType, String), usize> = HashMap::new();

    for entity in entities {
        let key = (entity.entity_type, entity.name.to_lowercase());
        match index.get(&key) {
            Some(&i) => merged[i].observations.extend(entity.observations),
            None => {
                index.insert(key, merged.len());
                merged.push(entity);
            }
        }
    }

    merged
}
