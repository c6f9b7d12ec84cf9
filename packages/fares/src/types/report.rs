//! End-of-run reporting types.

/// Outcome of one query pipeline.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// The search URL that was processed
    pub url: String,

    /// Snapshot key the merged set was persisted under, if anything was saved
    pub output_key: Option<String>,

    /// Validated flight records persisted for this query
    pub flights_saved: usize,

    /// Alerts successfully dispatched
    pub alerts_sent: usize,
}

/// Process-wide counters, updated under the run lock and reported once
/// at the end of a batch.
#[derive(Debug, Clone, Default)]
pub struct RunTotals {
    /// URLs handed to workers
    pub urls_processed: usize,

    /// Queries that failed outright (unreachable page, persistence failure)
    pub queries_failed: usize,

    /// Flight records persisted across all queries
    pub flights_saved: usize,

    /// Alerts dispatched across all queries
    pub alerts_sent: usize,
}

impl RunTotals {
    /// Create zeroed totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one query outcome into the totals.
    pub fn record_outcome(&mut self, outcome: &QueryOutcome) {
        self.urls_processed += 1;
        self.flights_saved += outcome.flights_saved;
        self.alerts_sent += outcome.alerts_sent;
    }

    /// Count a failed query.
    pub fn record_failure(&mut self) {
        self.urls_processed += 1;
        self.queries_failed += 1;
    }

    /// True when every query in the batch succeeded.
    pub fn is_success(&self) -> bool {
        self.queries_failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_fold() {
        let mut totals = RunTotals::new();
        totals.record_outcome(&QueryOutcome {
            url: "https://example.com".to_string(),
            output_key: Some("key".to_string()),
            flights_saved: 6,
            alerts_sent: 1,
        });
        totals.record_failure();

        assert_eq!(totals.urls_processed, 2);
        assert_eq!(totals.flights_saved, 6);
        assert_eq!(totals.alerts_sent, 1);
        assert_eq!(totals.queries_failed, 1);
        assert!(!totals.is_success());
    }
}
