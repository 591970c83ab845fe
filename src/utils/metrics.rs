use lazy_static::lazy_static;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub const SCHEDULE_CACHE_HITS: &str = "schedule_cache_hits_total";
pub const SCHEDULE_CACHE_MISSES: &str = "schedule_cache_misses_total";
pub const CONSENSUS_INFO_RECORDS: &str = "consensus_info_range_records_total";
pub const CONSENSUS_INFO_RANGE_LENGTH: &str = "consensus_info_range_last_length";

/// Metrics registry (simple, Prometheus-style)
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    counters: Arc<Mutex<HashMap<String, u64>>>,
    gauges: Arc<Mutex<HashMap<String, f64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_counter(&self, name: &str) {
        self.inc_counter_by(name, 1);
    }

    pub fn inc_counter_by(&self, name: &str, by: u64) {
        let mut counters = self.counters.lock();
        *counters.entry(name.to_string()).or_insert(0) += by;
    }

    pub fn set_gauge(&self, name: &str, val: f64) {
        self.gauges.lock().insert(name.to_string(), val);
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> (HashMap<String, u64>, HashMap<String, f64>) {
        (self.counters.lock().clone(), self.gauges.lock().clone())
    }

    /// Render in the Prometheus text exposition format, sorted by name.
    pub fn render(&self) -> String {
        let (counters, gauges) = self.snapshot();
        let mut lines: Vec<String> = counters
            .into_iter()
            .map(|(k, v)| format!("{} {}", k, v))
            .chain(gauges.into_iter().map(|(k, v)| format!("{} {}", k, v)))
            .collect();
        lines.sort();
        lines.join("\n")
    }
}

lazy_static! {
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}
