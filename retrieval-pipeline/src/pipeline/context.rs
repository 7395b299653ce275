use std::time::Duration;

use common::storage::types::search_hit::SearchHit;

use crate::query_parser::ParsedQuery;

use super::{PipelineStageTimings, StageKind};

/// Per-request state threaded through the stages. Each execution owns its own
/// context; stages receive it by value and hand it back.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    pub original_query: String,
    pub parsed_query: Option<ParsedQuery>,
    pub text_results: Option<Vec<SearchHit>>,
    pub semantic_results: Option<Vec<SearchHit>>,
    pub final_results: Option<Vec<SearchHit>>,
    stage_timings: PipelineStageTimings,
}

impl SearchContext {
    pub fn new(original_query: impl Into<String>) -> Self {
        Self {
            original_query: original_query.into(),
            ..Self::default()
        }
    }

    /// Text the retrieval stages should send to the store.
    pub fn query_text(&self) -> &str {
        self.parsed_query
            .as_ref()
            .map_or_else(|| self.original_query.trim(), |parsed| parsed.cleaned.as_str())
    }

    pub fn record_stage_duration(&mut self, kind: StageKind, duration: Duration) {
        self.stage_timings.record(kind, duration);
    }

    pub fn stage_timings(&self) -> &PipelineStageTimings {
        &self.stage_timings
    }

    pub fn take_final_results(&mut self) -> Vec<SearchHit> {
        self.final_results.take().unwrap_or_default()
    }
}
