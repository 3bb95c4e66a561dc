// src/metrics/collector.rs
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Probe metrics
    pub probes_total: IntCounterVec,
    pub probe_duration_seconds: HistogramVec,

    // Report metrics
    pub reports_total: IntCounterVec,
    pub unhealthy_groups: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probes_total = IntCounterVec::new(
            Opts::new("vitals_probe_total", "Probe runs by outcome"),
            &["group", "probe", "outcome"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_duration_seconds = HistogramVec::new(
            HistogramOpts::new("vitals_probe_duration_seconds", "Probe duration in seconds")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["group", "probe"],
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let reports_total = IntCounterVec::new(
            Opts::new("vitals_reports_total", "Health reports served"),
            &["profile"],
        )?;
        registry.register(Box::new(reports_total.clone()))?;

        let unhealthy_groups = IntGauge::new(
            "vitals_unhealthy_groups",
            "Groups with at least one failing vital in the last report",
        )?;
        registry.register(Box::new(unhealthy_groups.clone()))?;

        Ok(Self {
            probes_total,
            probe_duration_seconds,
            reports_total,
            unhealthy_groups,
        })
    }

    pub fn record_probe(&self, group: &str, probe: &str, success: bool, duration: Duration) {
        let outcome = if success { "success" } else { "failure" };
        self.probes_total
            .with_label_values(&[group, probe, outcome])
            .inc();
        self.probe_duration_seconds
            .with_label_values(&[group, probe])
            .observe(duration.as_secs_f64());
    }

    pub fn record_report(&self, profile: &str, unhealthy_groups: usize) {
        self.reports_total.with_label_values(&[profile]).inc();
        self.unhealthy_groups.set(unhealthy_groups as i64);
    }
}
