use serde::Serialize;

/// Running counts of an ingestion job. `success + errors` never exceeds `processed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionTally {
    pub processed: usize,
    pub success: usize,
    pub errors: usize,
}

impl IngestionTally {
    /// Outcome of a unit whose write never happened or was abandoned:
    /// every record is counted as an error.
    pub fn failed(processed: usize) -> Self {
        Self {
            processed,
            success: 0,
            errors: processed,
        }
    }

    pub fn absorb(&mut self, other: Self) {
        self.processed = self.processed.saturating_add(other.processed);
        self.success = self.success.saturating_add(other.success);
        self.errors = self.errors.saturating_add(other.errors);
    }

    pub fn is_consistent(&self) -> bool {
        self.success.saturating_add(self.errors) <= self.processed
    }
}
