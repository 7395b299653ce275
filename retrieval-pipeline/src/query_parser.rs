use std::{fs, path::Path};

use common::error::AppError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

const STOP_WORDS: [&str; 25] = [
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "were", "will", "with",
];

const CONTRACTIONS: [(&str, &str); 11] = [
    (r"\bcan't\b", "cannot"),
    (r"\bwon't\b", "will not"),
    (r"\bit's\b", "it is"),
    (r"\bi'm\b", "i am"),
    (r"\byou're\b", "you are"),
    (r"\bthey're\b", "they are"),
    (r"\bhe's\b", "he is"),
    (r"\bshe's\b", "she is"),
    (r"\bwe're\b", "we are"),
    (r"\bdoesn't\b", "does not"),
    (r"\bisn't\b", "is not"),
];

/// Structured form of a raw query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub original: String,
    pub cleaned: String,
    /// Quoted segments, case-folded, in order of appearance.
    pub exact_phrases: Vec<String>,
    /// Remaining words minus stop words; order and duplicates kept.
    pub keywords: Vec<String>,
    /// Dictionary phrases found in the cleaned text, longest first.
    pub detected_phrases: Vec<String>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.cleaned.is_empty()
    }
}

/// Normalizes query text and splits it into phrases and keywords.
///
/// The key-phrase dictionary is loaded once; the parser is then immutable and
/// can be shared between requests.
#[derive(Debug, Clone)]
pub struct QueryParser {
    contractions: Vec<(Regex, &'static str)>,
    disallowed_chars: Regex,
    whitespace: Regex,
    exact_phrase: Regex,
    key_phrases: Vec<String>,
}

impl QueryParser {
    /// Builds a parser with the dictionary stored at `key_phrases_path`. A missing
    /// or malformed dictionary leaves phrase detection disabled.
    pub fn new(key_phrases_path: impl AsRef<Path>) -> Result<Self, AppError> {
        Self::from_phrases(load_key_phrases(key_phrases_path.as_ref()))
    }

    pub fn from_phrases<I, S>(phrases: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|err| {
                AppError::InternalError(format!("invalid query pattern '{pattern}': {err}"))
            })
        };

        let contractions = CONTRACTIONS
            .iter()
            .map(|(pattern, replacement)| Ok((compile(pattern)?, *replacement)))
            .collect::<Result<Vec<_>, AppError>>()?;

        let mut key_phrases: Vec<String> = phrases
            .into_iter()
            .map(|phrase| phrase.as_ref().trim().to_lowercase())
            .filter(|phrase| !phrase.is_empty())
            .collect();
        // Stable, so equal-length phrases keep dictionary order.
        key_phrases.sort_by_key(|phrase| std::cmp::Reverse(phrase.chars().count()));

        Ok(Self {
            contractions,
            disallowed_chars: compile(r#"[^\w\s":,.!?]"#)?,
            whitespace: compile(r"\s+")?,
            exact_phrase: compile(r#""([^"]*)""#)?,
            key_phrases,
        })
    }

    pub fn key_phrase_count(&self) -> usize {
        self.key_phrases.len()
    }

    pub fn parse(&self, query: &str) -> ParsedQuery {
        if query.is_empty() {
            warn!("Received empty query");
            return ParsedQuery::default();
        }

        let cleaned = self.clean(query);
        let (exact_phrases, remainder) = self.extract_exact_phrases(&cleaned);
        let keywords = extract_keywords(&remainder);
        let detected_phrases = self.detect_phrases(&cleaned);

        debug!(
            original = query,
            cleaned = %cleaned,
            ?exact_phrases,
            ?keywords,
            ?detected_phrases,
            "Parsed query"
        );

        ParsedQuery {
            original: query.to_string(),
            cleaned,
            exact_phrases,
            keywords,
            detected_phrases,
        }
    }

    /// Lowercase, strip diacritics, expand contractions, blank out symbols and
    /// collapse whitespace.
    pub fn clean(&self, text: &str) -> String {
        let mut cleaned: String = text
            .to_lowercase()
            .nfkd()
            .filter(|c| !is_combining_mark(*c))
            .collect();

        for (pattern, replacement) in &self.contractions {
            cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
        }

        let cleaned = self.disallowed_chars.replace_all(&cleaned, " ");
        self.whitespace.replace_all(&cleaned, " ").trim().to_string()
    }

    fn extract_exact_phrases(&self, text: &str) -> (Vec<String>, String) {
        let phrases = self
            .exact_phrase
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .map(|segment| segment.as_str().trim().to_lowercase())
            .filter(|phrase| !phrase.is_empty())
            .collect();
        let remainder = self.exact_phrase.replace_all(text, "").into_owned();

        (phrases, remainder)
    }

    fn detect_phrases(&self, text: &str) -> Vec<String> {
        let mut buffer = text.to_lowercase();
        let mut detected = Vec::new();

        for phrase in &self.key_phrases {
            if let Some(position) = buffer.find(phrase.as_str()) {
                buffer.replace_range(position..position.saturating_add(phrase.len()), "");
                detected.push(phrase.clone());
            }
        }

        detected
    }
}

fn extract_keywords(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .map(ToString::to_string)
        .collect()
}

fn load_key_phrases(path: &Path) -> Vec<String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Key phrases file unavailable, phrase detection disabled");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(phrases) => phrases,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to parse key phrases, phrase detection disabled");
            Vec::new()
        }
    }
}
