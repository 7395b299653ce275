pub mod bulk;
pub mod document;
pub mod search_hit;
