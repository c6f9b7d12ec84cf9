//! Engine configuration with deployment-constant defaults.

use std::time::Duration;

/// Configuration for one scraping run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Search URLs must reference this domain; anything else is rejected
    /// before any network access.
    pub provider_domain: String,

    /// Text landmark used by the fallback locator tier.
    pub landmark_text: String,

    /// Upper bound on containers extracted per view.
    pub extraction_cap: usize,

    /// Maximum scroll-to-load iterations per view.
    pub max_scrolls: usize,

    /// Pause between scroll iterations.
    pub scroll_pause: Duration,

    /// Bounded wait for the cookie-consent button.
    pub consent_timeout: Duration,

    /// Bounded wait for the best-price region marker.
    pub price_region_timeout: Duration,

    /// Bounded wait for the first flight items.
    pub flight_items_timeout: Duration,

    /// Bounded wait for the cheapest-sort toggle.
    pub cheapest_toggle_timeout: Duration,

    /// Settle time after switching sort order.
    pub view_switch_pause: Duration,

    /// Fractional price-drop threshold that triggers an alert.
    pub alert_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider_domain: "google.com".to_string(),
            landmark_text: "Top flights".to_string(),
            extraction_cap: 15,
            max_scrolls: 3,
            scroll_pause: Duration::from_millis(500),
            consent_timeout: Duration::from_secs(10),
            price_region_timeout: Duration::from_secs(2),
            flight_items_timeout: Duration::from_secs(1),
            cheapest_toggle_timeout: Duration::from_secs(10),
            view_switch_pause: Duration::from_secs(2),
            alert_threshold: 0.01,
        }
    }
}

impl EngineConfig {
    /// Create a config with default deployment constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the accepted provider domain.
    pub fn with_provider_domain(mut self, domain: impl Into<String>) -> Self {
        self.provider_domain = domain.into();
        self
    }

    /// Set the fallback locator landmark text.
    pub fn with_landmark_text(mut self, text: impl Into<String>) -> Self {
        self.landmark_text = text.into();
        self
    }

    /// Set the per-view extraction cap.
    pub fn with_extraction_cap(mut self, cap: usize) -> Self {
        self.extraction_cap = cap;
        self
    }

    /// Set the alert threshold (fraction of the previous price).
    pub fn with_alert_threshold(mut self, threshold: f64) -> Self {
        self.alert_threshold = threshold;
        self
    }

    /// Set the scroll bounds.
    pub fn with_scroll(mut self, max_scrolls: usize, pause: Duration) -> Self {
        self.max_scrolls = max_scrolls;
        self.scroll_pause = pause;
        self
    }
}
