pub mod cache;
pub mod document;
pub mod liveness;
pub mod search;
