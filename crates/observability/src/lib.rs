use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AssistantMetrics {
    requests_total: AtomicU64,
    fallback_total: AtomicU64,
    link_replies_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub fallback_total: u64,
    pub link_replies_total: u64,
    pub avg_latency_micros: f64,
}

impl AssistantMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Counts one reply. `intent` is the rule key, or `"fallback"`.
    pub fn record_reply(&self, intent: &'static str, has_link: bool, latency: Duration) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if intent == "fallback" {
            self.fallback_total.fetch_add(1, Ordering::Relaxed);
        }
        if has_link {
            self.link_replies_total.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_micros
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);

        metrics::counter!("folio_replies_total", "intent" => intent).increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            link_replies_total: self.link_replies_total.load(Ordering::Relaxed),
            avg_latency_micros: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,folio_api=info,folio_agents=info",
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
