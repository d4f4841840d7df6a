//! Prometheus metrics for the search pipeline.
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    searches: IntCounterVec,
    failures: IntCounterVec,
    latency: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let searches = IntCounterVec::new(
            Opts::new("jql_searches_total", "Searches served, by detected intent."),
            &["intent"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new("jql_pipeline_failures_total", "Failed searches, by error class."),
            &["class"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new("jql_pipeline_seconds", "Search pipeline latency.")
                .buckets(exponential_buckets(0.05, 2.0, 10)?),
            &["outcome"],
        )?;
        registry.register(Box::new(searches.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(latency.clone()))?;
        Ok(Self {
            registry,
            searches,
            failures,
            latency,
        })
    }

    pub fn searched(&self, intents: &[&str], seconds: f64) {
        for intent in intents {
            self.searches.with_label_values(&[intent]).inc();
        }
        self.latency.with_label_values(&["ok"]).observe(seconds);
    }

    pub fn failed(&self, class: &str, seconds: f64) {
        self.failures.with_label_values(&[class]).inc();
        self.latency.with_label_values(&["error"]).observe(seconds);
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_encoded() {
        let metrics = Metrics::new().unwrap();
        metrics.searched(&["bug", "sprint"], 0.2);
        metrics.failed("external_service", 1.0);
        let text = metrics.encode().unwrap();
        assert!(text.contains("jql_searches_total{intent=\"bug\"} 1"));
        assert!(text.contains("jql_pipeline_failures_total{class=\"external_service\"} 1"));
        assert!(text.contains("jql_pipeline_seconds_count{outcome=\"ok\"} 1"));
    }
}
