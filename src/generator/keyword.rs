//! Lexical tag generator, the default backend.
//!
//! Derives SmartTagX-style tags from surface features alone: frequent
//! keywords become `::Topic/` tags, a small lexicon yields `//` emotion
//! tags, shape heuristics pick one `*` content-type tag and
//! call-to-action words map to `@@` tags. Entity tags (`::Person/`,
//! `::Company/`, `::Location/`) need a richer NLP backend than this one.

use super::{GeneratorError, TagGenerator};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;

/// Words too common to carry topical signal.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "that", "this", "with", "you", "your", "our", "are", "was", "were",
    "been", "have", "has", "had", "not", "but", "can", "could", "will", "would", "should",
    "there", "their", "they", "them", "then", "than", "what", "when", "where", "which", "who",
    "why", "how", "all", "any", "its", "his", "her", "she", "him", "out", "about", "into",
    "over", "more", "most", "some", "such", "only", "just", "very", "also", "from", "because",
    "while", "each", "other", "these", "those", "does", "did", "doing", "being", "here",
];

/// Emotion lexicon: trigger word to tag stem.
const EMOTIONS: &[(&str, &str)] = &[
    ("amazing", "Excited"),
    ("excited", "Excited"),
    ("exciting", "Excited"),
    ("awesome", "Excited"),
    ("incredible", "Excited"),
    ("love", "Positive"),
    ("great", "Positive"),
    ("happy", "Positive"),
    ("wonderful", "Positive"),
    ("best", "Positive"),
    ("sad", "Sad"),
    ("unfortunately", "Sad"),
    ("terrible", "Negative"),
    ("awful", "Negative"),
    ("worst", "Negative"),
    ("hate", "Negative"),
    ("angry", "Angry"),
    ("furious", "Angry"),
    ("curious", "Curious"),
    ("interesting", "Curious"),
];

/// Call-to-action triggers to tag stem.
const CALLS_TO_ACTION: &[(&str, &str)] = &[
    ("subscribe", "Subscribe"),
    ("follow", "Follow"),
    ("buy", "Shop"),
    ("shop", "Shop"),
    ("order", "Shop"),
    ("download", "Download"),
    ("register", "Signup"),
    ("signup", "Signup"),
    ("join", "Join"),
    ("share", "Share"),
    ("comment", "Comment"),
    ("like", "Like"),
];

const MAX_TOPIC_TAGS: usize = 5;

/// Words at or past this count read as long-form writing.
const ARTICLE_WORD_COUNT: usize = 120;

/// Frequency-based keyword tagger. Deterministic: the same text always
/// produces the same tags in the same order.
pub struct KeywordTagGenerator {
    word_pattern: Regex,
}

impl KeywordTagGenerator {
    /// Compile the tokenizer. On failure the caller starts the service
    /// degraded, with no generator wired in.
    pub fn load() -> Result<Self, GeneratorError> {
        let word_pattern = Regex::new(r"[A-Za-z][A-Za-z0-9'-]+")
            .map_err(|e| GeneratorError::new(format!("failed to compile tokenizer: {e}")))?;
        Ok(Self { word_pattern })
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        self.word_pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    /// Most frequent non-stopword keywords, ties broken alphabetically.
    fn topics(&self, words: &[String]) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in words {
            if word.len() < 3 || STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            *counts.entry(word.as_str()).or_insert(0) += 1;
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(MAX_TOPIC_TAGS)
            .map(|(word, _)| format!("::Topic/{}", capitalize(word)))
            .collect()
    }

    fn emotions(&self, words: &[String]) -> Vec<String> {
        let mut stems: Vec<&str> = Vec::new();
        for &(trigger, stem) in EMOTIONS {
            if words.iter().any(|w| w.as_str() == trigger) && !stems.contains(&stem) {
                stems.push(stem);
            }
        }
        stems.into_iter().map(|stem| format!("//{stem}")).collect()
    }

    fn content_type(&self, text: &str, word_count: usize) -> String {
        let lowered = text.to_lowercase();
        let tag = if lowered.contains("how to") || lowered.contains("guide") || lowered.contains("tutorial") {
            "*Guide"
        } else if text.trim_end().ends_with('?')
            || lowered.contains("what is")
            || lowered.contains("how do")
        {
            "*Question"
        } else if word_count >= ARTICLE_WORD_COUNT {
            "*Article"
        } else {
            "*Note"
        };
        tag.to_string()
    }

    fn calls_to_action(&self, words: &[String]) -> Vec<String> {
        let mut stems: Vec<&str> = Vec::new();
        for &(trigger, stem) in CALLS_TO_ACTION {
            if words.iter().any(|w| w.as_str() == trigger) && !stems.contains(&stem) {
                stems.push(stem);
            }
        }
        stems.into_iter().map(|stem| format!("@@{stem}")).collect()
    }
}

#[async_trait]
impl TagGenerator for KeywordTagGenerator {
    async fn generate_tags(&self, text: &str) -> Result<Vec<String>, GeneratorError> {
        let words = self.tokenize(text);

        let mut tags = self.topics(&words);
        tags.extend(self.emotions(&words));
        tags.push(self.content_type(text, words.len()));
        tags.extend(self.calls_to_action(&words));
        Ok(tags)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> KeywordTagGenerator {
        KeywordTagGenerator::load().unwrap()
    }

    #[tokio::test]
    async fn test_repeated_keywords_become_topic_tags() {
        let tags = generator()
            .generate_tags("Rust makes systems programming fun. Rust is fast, and Rust is safe.")
            .await
            .unwrap();
        assert!(tags.contains(&"::Topic/Rust".to_string()), "tags: {tags:?}");
    }

    #[tokio::test]
    async fn test_stopwords_are_never_topics() {
        let tags = generator()
            .generate_tags("the the the cat cat")
            .await
            .unwrap();
        assert!(!tags.iter().any(|t| t == "::Topic/The"), "tags: {tags:?}");
        assert!(tags.contains(&"::Topic/Cat".to_string()));
    }

    #[tokio::test]
    async fn test_emotion_and_cta_lexicons() {
        let tags = generator()
            .generate_tags("This amazing library is the best. Subscribe for updates and share it!")
            .await
            .unwrap();
        assert!(tags.contains(&"//Excited".to_string()), "tags: {tags:?}");
        assert!(tags.contains(&"//Positive".to_string()));
        assert!(tags.contains(&"@@Subscribe".to_string()));
        assert!(tags.contains(&"@@Share".to_string()));
    }

    #[tokio::test]
    async fn test_questions_get_the_question_type() {
        let tags = generator()
            .generate_tags("What is the fastest sorting algorithm?")
            .await
            .unwrap();
        assert!(tags.contains(&"*Question".to_string()), "tags: {tags:?}");
    }

    #[tokio::test]
    async fn test_short_prose_is_a_note() {
        let tags = generator().generate_tags("hello world").await.unwrap();
        assert!(tags.contains(&"*Note".to_string()), "tags: {tags:?}");
    }

    #[tokio::test]
    async fn test_always_yields_at_least_one_tag() {
        // Even signal-free input gets a content-type tag.
        let tags = generator().generate_tags("!!! ???").await.unwrap();
        assert!(!tags.is_empty());
    }

    #[tokio::test]
    async fn test_output_is_deterministic() {
        let text = "Great tutorial about async Rust. Download the examples and join the community.";
        let first = generator().generate_tags(text).await.unwrap();
        let second = generator().generate_tags(text).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_topic_count_is_capped() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let tags = generator().generate_tags(text).await.unwrap();
        let topics = tags.iter().filter(|t| t.starts_with("::Topic/")).count();
        assert_eq!(topics, MAX_TOPIC_TAGS);
    }
}
