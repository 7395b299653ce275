use common::utils::config::AppConfig;
use retrieval_pipeline::SearchService;

#[derive(Clone)]
pub struct ApiState {
    pub search: SearchService,
    /// Page size used by `GET /search` when the caller gives none.
    pub default_page_size: usize,
}

impl ApiState {
    pub fn new(search: SearchService, config: &AppConfig) -> Self {
        Self {
            search,
            default_page_size: config.page_size,
        }
    }
}
