pub mod adapter;
pub mod document_store;
pub mod elasticsearch;
pub mod indexes;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod types;
