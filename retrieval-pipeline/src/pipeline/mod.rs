mod config;
mod context;
mod stages;
mod strategies;

pub use config::{RetrievalTuning, SearchType};
pub use context::SearchContext;
pub use stages::{build_text_query, QueryParserStage, TextSearchStage};
pub use strategies::SearchStrategyDriver;

use async_trait::async_trait;
use common::error::AppError;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

// Stage type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Parse,
    TextSearch,
}

/// One step of the query path. A stage takes the context by value and returns
/// it, possibly after store I/O; an error aborts the remaining stages.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn kind(&self) -> StageKind;
    async fn process(&self, ctx: SearchContext) -> Result<SearchContext, AppError>;
}

// Type alias for boxed stages
pub type BoxedStage = Box<dyn PipelineStage>;

// Pipeline stage timings tracker
#[derive(Debug, Default, Clone)]
pub struct PipelineStageTimings {
    timings: Vec<(StageKind, Duration)>,
}

impl PipelineStageTimings {
    pub fn record(&mut self, kind: StageKind, duration: Duration) {
        self.timings.push((kind, duration));
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.timings.iter().map(|(kind, _)| *kind).collect()
    }

    fn get_stage_ms(&self, kind: StageKind) -> u128 {
        self.timings
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, d)| d.as_millis())
    }

    pub fn parse_ms(&self) -> u128 {
        self.get_stage_ms(StageKind::Parse)
    }

    pub fn text_search_ms(&self) -> u128 {
        self.get_stage_ms(StageKind::TextSearch)
    }

    pub fn total(&self) -> Duration {
        self.timings.iter().map(|(_, d)| *d).sum()
    }
}

/// Ordered list of stages run strictly in sequence.
pub struct SearchPipeline {
    stages: Vec<BoxedStage>,
}

impl SearchPipeline {
    pub fn new(stages: Vec<BoxedStage>) -> Self {
        Self { stages }
    }

    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|stage| stage.kind()).collect()
    }

    #[instrument(skip_all, fields(stages = self.stages.len()))]
    pub async fn execute(&self, query: &str) -> Result<SearchContext, AppError> {
        let mut ctx = SearchContext::new(query);

        for stage in &self.stages {
            let kind = stage.kind();
            let start = Instant::now();
            ctx = stage.process(ctx).await?;
            let elapsed = start.elapsed();
            debug!(stage = ?kind, elapsed_ms = elapsed.as_millis(), "Stage finished");
            ctx.record_stage_duration(kind, elapsed);
        }

        info!(
            query_chars = query.chars().count(),
            results = ctx.final_results.as_ref().map_or(0, Vec::len),
            parse_ms = ctx.stage_timings().parse_ms(),
            text_search_ms = ctx.stage_timings().text_search_ms(),
            total_ms = ctx.stage_timings().total().as_millis(),
            "Search pipeline completed"
        );

        Ok(ctx)
    }
}
