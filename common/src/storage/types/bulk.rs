/// Result of creating an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreation {
    Created,
    AlreadyExists,
    /// The store answered but did not acknowledge the creation.
    NotAcknowledged,
}

/// Per-document outcome of a bulk write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemResult {
    pub id: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub items: Vec<BulkItemResult>,
}

impl BulkReport {
    pub fn success_count(&self) -> usize {
        self.items.iter().filter(|item| item.error.is_none()).count()
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|item| item.error.is_some()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|item| item.error.is_some())
    }
}
