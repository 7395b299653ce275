use common::{error::AppError, storage::types::search_hit::SearchHit};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::SearchType;

pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 10;

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub search_type: SearchType,
    /// Accepted for forward compatibility; no stage applies filters yet.
    #[serde(default)]
    pub filters: Option<Value>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: default_page(),
            page_size: default_page_size(),
            search_type: SearchType::default(),
            filters: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.query.trim().is_empty() {
            return Err(AppError::Validation("query must not be empty".to_string()));
        }
        if self.page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(AppError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

/// A page of results together with the full ranked list it was cut from.
/// This is the cached representation of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub results: Vec<SearchHit>,
    pub full_results: Vec<SearchHit>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl SearchPage {
    pub fn paginate(full_results: Vec<SearchHit>, page: usize, page_size: usize) -> Self {
        let start = page.saturating_sub(1).saturating_mul(page_size);
        let results = full_results
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        Self {
            results,
            total: full_results.len(),
            full_results,
            page,
            page_size,
        }
    }

    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }

    pub fn find(&self, doc_id: &str) -> Option<&SearchHit> {
        self.full_results.iter().find(|hit| hit.id == doc_id)
    }
}

/// Public response shape of the search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl From<SearchPage> for SearchResponse {
    fn from(page: SearchPage) -> Self {
        Self {
            results: page.results,
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn hits(count: usize) -> Vec<SearchHit> {
        (1..=count)
            .map(|i| SearchHit {
                id: format!("D{i}"),
                title: String::new(),
                body: String::new(),
                score: 1.0,
                source: "memory".to_string(),
            })
            .collect()
    }

    #[test]
    fn request_defaults_apply() {
        let request: SearchRequest =
            serde_json::from_value(json!({"query": "rust"})).expect("request");
        assert_eq!(request, SearchRequest::new("rust"));
        assert_eq!(request.search_type, SearchType::Hybrid);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn invalid_requests_are_rejected() {
        for request in [
            SearchRequest::new(""),
            SearchRequest::new("   "),
            SearchRequest::new("rust").with_page(0),
            SearchRequest::new("rust").with_page_size(0),
            SearchRequest::new("rust").with_page_size(101),
        ] {
            assert!(
                matches!(request.validate(), Err(AppError::Validation(_))),
                "{request:?}"
            );
        }
    }

    #[test]
    fn unknown_search_type_fails_to_deserialize() {
        let result: Result<SearchRequest, _> =
            serde_json::from_value(json!({"query": "rust", "search_type": "vector"}));
        assert!(result.is_err());
    }

    #[test]
    fn paginate_slices_full_results() {
        let page = SearchPage::paginate(hits(25), 3, 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
        let ids: Vec<&str> = page.results.iter().map(|hit| hit.id.as_str()).collect();
        assert_eq!(ids, vec!["D21", "D22", "D23", "D24", "D25"]);
        assert!(page.find("D2").is_some());
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = SearchPage::paginate(hits(5), 4, 10);
        assert!(page.results.is_empty());
        assert_eq!(page.total, 5);
    }

    #[test]
    fn response_drops_full_results() {
        let response = SearchResponse::from(SearchPage::paginate(hits(3), 1, 2));
        let value = serde_json::to_value(&response).expect("serialize");
        assert!(value.get("full_results").is_none());
        assert_eq!(value["total"], 3);
        assert_eq!(value["results"].as_array().map(Vec::len), Some(2));
    }
}
