use serde::{Deserialize, Serialize};

use super::document::Document;

/// A document returned by the store together with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
    pub score: f32,
    pub document: Document,
}

/// A scored hit as exposed to the query path and serialized in responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub body: String,
    pub score: f32,
    /// Name of the engine that produced the hit.
    pub source: String,
}

impl SearchHit {
    pub fn from_store_hit(hit: StoreHit, source: &str) -> Self {
        let StoreHit { score, document } = hit;
        Self {
            id: document.id,
            title: document.title,
            body: document.body,
            score,
            source: source.to_string(),
        }
    }
}
