use std::fmt;

use common::utils::config::AppConfig;
use serde::{Deserialize, Serialize};

/// Retrieval mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    #[default]
    Hybrid,
    Text,
    Semantic,
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "hybrid" => Ok(Self::Hybrid),
            "text" => Ok(Self::Text),
            "semantic" => Ok(Self::Semantic),
            other => Err(format!("unknown search type '{other}'")),
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchType::Hybrid => "hybrid",
            SearchType::Text => "text",
            SearchType::Semantic => "semantic",
        };
        f.write_str(label)
    }
}

/// Tunable parameters of the retrieval stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalTuning {
    pub index_name: String,
    /// Maximum hits fetched from the store per query.
    pub result_limit: usize,
    pub title_boost: f32,
    pub query_boost: f32,
}

impl Default for RetrievalTuning {
    fn default() -> Self {
        Self {
            index_name: "msmarco-docs".to_string(),
            result_limit: 100,
            title_boost: 2.0,
            query_boost: 2.0,
        }
    }
}

impl RetrievalTuning {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            index_name: config.index_name.clone(),
            result_limit: config.search_result_limit,
            ..Self::default()
        }
    }
}
