use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    turns_total: AtomicU64,
    turns_failed_total: AtomicU64,
    provider_calls_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub turns_total: u64,
    pub turns_failed_total: u64,
    pub provider_calls_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_turn(&self) {
        self.turns_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed_turn(&self) {
        self.turns_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_provider_calls(&self, calls: usize) {
        self.provider_calls_total
            .fetch_add(calls as u64, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let turns = self.turns_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            turns_total: turns,
            turns_failed_total: self.turns_failed_total.load(Ordering::Relaxed),
            provider_calls_total: self.provider_calls_total.load(Ordering::Relaxed),
            avg_latency_millis: if turns == 0 {
                0.0
            } else {
                latency as f64 / turns as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,scout_api=info,scout_agents=info,scout_providers=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency_over_turns() {
        let metrics = AppMetrics::default();
        metrics.inc_turn();
        metrics.inc_turn();
        metrics.add_provider_calls(3);
        metrics.observe_latency(Duration::from_millis(10));
        metrics.observe_latency(Duration::from_millis(30));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.turns_total, 2);
        assert_eq!(snapshot.provider_calls_total, 3);
        assert!((snapshot.avg_latency_millis - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_metrics_have_zero_average() {
        assert_eq!(AppMetrics::default().snapshot().avg_latency_millis, 0.0);
    }
}
