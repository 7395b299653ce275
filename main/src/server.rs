use std::sync::Arc;

use api_router::{api_routes, api_state::ApiState};
use common::{
    cache::{redis::RedisCacheStore, store::CacheStore, ResultCache},
    storage::{
        adapter::DocumentStoreAdapter, document_store::DocumentStore,
        elasticsearch::ElasticsearchClient,
    },
    utils::config::get_config,
};
use retrieval_pipeline::{QueryParser, RetrievalTuning, SearchService, SearchStrategyDriver};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let store = DocumentStoreAdapter::new(
        Arc::new(ElasticsearchClient::from_config(&config)?) as Arc<dyn DocumentStore>,
        config.store_retry_policy(),
    );
    let cache_store = Arc::new(RedisCacheStore::connect(&config.redis_url).await?);
    let cache = ResultCache::from_config(cache_store as Arc<dyn CacheStore>, &config);

    let parser = Arc::new(QueryParser::new(&config.key_phrases_path)?);
    info!(
        key_phrases = parser.key_phrase_count(),
        "Query parser initialized"
    );

    let driver = SearchStrategyDriver::new(
        parser,
        store.clone(),
        RetrievalTuning::from_config(&config),
    );
    let search = SearchService::new(driver, cache, store, config.index_name.clone());
    let api_state = ApiState::new(search, &config);

    let app = api_routes::<ApiState>().with_state(api_state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
