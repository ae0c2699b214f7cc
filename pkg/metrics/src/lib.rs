use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

pub mod context;

pub use context::MetricContext;

/// Label pairs attached to a single series, e.g. `[("resource", "secret")]`.
pub type Labels<'a> = &'a [(&'a str, &'a str)];

/// A lightweight, thread-safe metrics registry that renders in Prometheus text exposition format.
/// Every metric is a family of series keyed by their label set.
pub struct MetricsRegistry {
    counters: RwLock<BTreeMap<String, Family<Counter>>>,
    gauges: RwLock<BTreeMap<String, Family<Gauge>>>,
}

struct Family<V> {
    help: String,
    series: BTreeMap<String, V>,
}

/// Monotonically increasing counter. Stores `f64` bits so durations can be summed.
#[derive(Default)]
struct Counter {
    bits: AtomicU64,
}

/// Value that can go up or down.
#[derive(Default)]
struct Gauge {
    value: AtomicI64,
}

impl Counter {
    fn add(&self, val: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + val).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(BTreeMap::new()),
            gauges: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a counter family. If it already exists, this is a no-op.
    pub fn register_counter(&self, name: &str, help: &str) {
        let mut counters = self.counters.write().unwrap();
        counters.entry(name.to_string()).or_insert_with(|| Family {
            help: help.to_string(),
            series: BTreeMap::new(),
        });
    }

    /// Register a gauge family. If it already exists, this is a no-op.
    pub fn register_gauge(&self, name: &str, help: &str) {
        let mut gauges = self.gauges.write().unwrap();
        gauges.entry(name.to_string()).or_insert_with(|| Family {
            help: help.to_string(),
            series: BTreeMap::new(),
        });
    }

    /// Increment a counter series by 1.
    pub fn counter_inc(&self, name: &str, labels: Labels<'_>) {
        self.counter_add(name, labels, 1.0);
    }

    /// Increment a counter series by a given amount. Unregistered families are ignored.
    pub fn counter_add(&self, name: &str, labels: Labels<'_>, val: f64) {
        let key = render_labels(labels);
        {
            let counters = self.counters.read().unwrap();
            match counters.get(name) {
                Some(family) => {
                    if let Some(c) = family.series.get(&key) {
                        c.add(val);
                        return;
                    }
                }
                None => return,
            }
        }
        let mut counters = self.counters.write().unwrap();
        if let Some(family) = counters.get_mut(name) {
            family.series.entry(key).or_default().add(val);
        }
    }

    /// Increment a gauge series by 1.
    pub fn gauge_inc(&self, name: &str, labels: Labels<'_>) {
        self.gauge_add(name, labels, 1);
    }

    /// Decrement a gauge series by 1.
    pub fn gauge_dec(&self, name: &str, labels: Labels<'_>) {
        self.gauge_add(name, labels, -1);
    }

    fn gauge_add(&self, name: &str, labels: Labels<'_>, delta: i64) {
        let key = render_labels(labels);
        {
            let gauges = self.gauges.read().unwrap();
            match gauges.get(name) {
                Some(family) => {
                    if let Some(g) = family.series.get(&key) {
                        g.value.fetch_add(delta, Ordering::Relaxed);
                        return;
                    }
                }
                None => return,
            }
        }
        let mut gauges = self.gauges.write().unwrap();
        if let Some(family) = gauges.get_mut(name) {
            family
                .series
                .entry(key)
                .or_default()
                .value
                .fetch_add(delta, Ordering::Relaxed);
        }
    }

    /// Current value of a counter series, if it has been touched.
    pub fn counter_value(&self, name: &str, labels: Labels<'_>) -> Option<f64> {
        let counters = self.counters.read().unwrap();
        counters
            .get(name)
            .and_then(|f| f.series.get(&render_labels(labels)))
            .map(Counter::get)
    }

    /// Current value of a gauge series, if it has been touched.
    pub fn gauge_value(&self, name: &str, labels: Labels<'_>) -> Option<i64> {
        let gauges = self.gauges.read().unwrap();
        gauges
            .get(name)
            .and_then(|f| f.series.get(&render_labels(labels)))
            .map(|g| g.value.load(Ordering::Relaxed))
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut output = String::new();

        // Counters
        let counters = self.counters.read().unwrap();
        for (name, family) in counters.iter() {
            output.push_str(&format!("# HELP {} {}\n", name, family.help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            for (labels, counter) in family.series.iter() {
                output.push_str(&format!("{}{} {}\n", name, labels, counter.get()));
            }
        }

        // Gauges
        let gauges = self.gauges.read().unwrap();
        for (name, family) in gauges.iter() {
            output.push_str(&format!("# HELP {} {}\n", name, family.help));
            output.push_str(&format!("# TYPE {} gauge\n", name));
            for (labels, gauge) in family.series.iter() {
                output.push_str(&format!(
                    "{}{} {}\n",
                    name,
                    labels,
                    gauge.value.load(Ordering::Relaxed)
                ));
            }
        }

        output
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `{k="v",k2="v2"}`, or an empty string for an unlabelled series.
fn render_labels(labels: Labels<'_>) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = labels
        .iter()
        .map(|(k, v)| {
            let escaped = v
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");
            format!("{}=\"{}\"", k, escaped)
        })
        .collect();
    format!("{{{}}}", pairs.join(","))
}
