use common::{
    cache::ResultCache,
    error::AppError,
    storage::{
        adapter::DocumentStoreAdapter,
        types::{document::Document, search_hit::SearchHit},
    },
};
use tracing::{info, instrument};

use crate::{
    models::{SearchPage, SearchRequest},
    pipeline::SearchStrategyDriver,
};

/// Query path entry point: validation, cache lookup, pipeline run, pagination.
#[derive(Clone)]
pub struct SearchService {
    driver: SearchStrategyDriver,
    cache: ResultCache,
    store: DocumentStoreAdapter,
    index_name: String,
}

impl SearchService {
    pub fn new(
        driver: SearchStrategyDriver,
        cache: ResultCache,
        store: DocumentStoreAdapter,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            cache,
            store,
            index_name: index_name.into(),
        }
    }

    /// Runs `request` for `route`, serving repeated requests from the cache.
    #[instrument(skip_all, fields(route = route, page = request.page, search_type = %request.search_type))]
    pub async fn search(&self, route: &str, request: &SearchRequest) -> Result<SearchPage, AppError> {
        request.validate()?;
        let key = ResultCache::fingerprint(route, &request.query, request.page);

        if let Some(cached) = self.cache.get::<SearchPage>(&key).await {
            info!(key = %key, "Serving search from cache");
            return Ok(SearchPage::paginate(
                cached.full_results,
                request.page,
                request.page_size,
            ));
        }

        let mut ctx = self
            .driver
            .pipeline(request.search_type)
            .execute(&request.query)
            .await?;
        let page = SearchPage::paginate(ctx.take_final_results(), request.page, request.page_size);

        self.cache.set(&key, &page, None).await;
        Ok(page)
    }

    /// Locates `doc_id` in the full result list behind the requested page.
    pub async fn find_document(
        &self,
        route: &str,
        request: &SearchRequest,
        doc_id: &str,
    ) -> Result<(SearchPage, SearchHit), AppError> {
        let page = self.search(route, request).await?;
        let hit = page
            .find(doc_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("document {doc_id} not in results")))?;
        info!(doc_id, "Found document in search results");
        Ok((page, hit))
    }

    pub async fn get_document(&self, id: &str) -> Result<Document, AppError> {
        self.store
            .get_document(&self.index_name, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("document {id}")))
    }

    pub async fn recent_queries(&self) -> Vec<String> {
        self.cache.recent_keys().await
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use common::{
        cache::{memory::MemoryCacheStore, store::CacheStore},
        storage::{document_store::DocumentStore, memory::MemoryDocumentStore},
        utils::retry::RetryPolicy,
    };

    use super::*;
    use crate::{pipeline::RetrievalTuning, query_parser::QueryParser};

    struct Fixture {
        store: Arc<MemoryDocumentStore>,
        service: SearchService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryDocumentStore::new());
        for i in 1..=15 {
            store.insert(
                "msmarco-docs",
                Document::new(format!("D{i:02}"), format!("rust article {i}"), "body"),
            );
        }
        store.insert("msmarco-docs", Document::new("X1", "cooking", "pasta"));

        let adapter = DocumentStoreAdapter::new(
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            RetryPolicy::new(1, Duration::ZERO),
        );
        let driver = SearchStrategyDriver::new(
            Arc::new(QueryParser::from_phrases(Vec::<String>::new()).expect("parser")),
            adapter.clone(),
            RetrievalTuning::default(),
        );
        let cache = ResultCache::new(
            Arc::new(MemoryCacheStore::new()) as Arc<dyn CacheStore>,
            60,
            5,
        );

        Fixture {
            store: Arc::clone(&store),
            service: SearchService::new(driver, cache, adapter, "msmarco-docs"),
        }
    }

    #[tokio::test]
    async fn paginates_pipeline_results() {
        let fx = fixture();
        let page = fx
            .service
            .search("api", &SearchRequest::new("Rust").with_page(2))
            .await
            .expect("search");

        assert_eq!(page.total, 15);
        assert_eq!(page.full_results.len(), 15);
        assert_eq!(page.results.len(), 5);
        assert_eq!(page.page, 2);
    }

    #[tokio::test]
    async fn repeated_search_is_served_from_cache() {
        let fx = fixture();
        let request = SearchRequest::new("rust");

        let first = fx.service.search("api", &request).await.expect("first");
        let second = fx
            .service
            .search("api", &SearchRequest::new("  RUST "))
            .await
            .expect("second");

        assert_eq!(first, second);
        assert_eq!(fx.store.search_calls(), 1);
        assert_eq!(fx.service.recent_queries().await, vec!["search:api:1:rust"]);
    }

    #[tokio::test]
    async fn cached_page_honours_requested_page_size() {
        let fx = fixture();
        fx.service
            .search("api", &SearchRequest::new("rust"))
            .await
            .expect("warm cache");

        let page = fx
            .service
            .search("api", &SearchRequest::new("rust").with_page_size(3))
            .await
            .expect("cached");
        assert_eq!(page.results.len(), 3);
        assert_eq!(page.page_size, 3);
        assert_eq!(fx.store.search_calls(), 1);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_store() {
        let fx = fixture();
        let err = fx
            .service
            .search("api", &SearchRequest::new("rust").with_page_size(500))
            .await
            .expect_err("invalid");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(fx.store.search_calls(), 0);
    }

    #[tokio::test]
    async fn finds_document_in_full_results() {
        let fx = fixture();
        let request = SearchRequest::new("rust");

        let (_, hit) = fx
            .service
            .find_document("web", &request, "D15")
            .await
            .expect("found");
        assert_eq!(hit.id, "D15");

        let err = fx
            .service
            .find_document("web", &request, "X1")
            .await
            .expect_err("not in results");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn point_lookup_goes_to_store() {
        let fx = fixture();
        let doc = fx.service.get_document("X1").await.expect("document");
        assert_eq!(doc.title, "cooking");
        assert!(matches!(
            fx.service.get_document("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
