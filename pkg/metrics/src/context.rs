use std::time::Instant;

use pkg_constants::metrics::{
    API_REQUEST_DURATION_SECONDS_SUM, API_REQUEST_ERRORS_TOTAL, API_REQUESTS_IN_FLIGHT,
    API_REQUESTS_TOTAL,
};
use tracing::debug;

use crate::MetricsRegistry;

impl MetricsRegistry {
    /// Register the families recorded by [`MetricContext`]. Safe to call repeatedly.
    pub fn register_api_metrics(&self) {
        self.register_counter(API_REQUESTS_TOTAL, "Number of OpenStack API requests.");
        self.register_counter(
            API_REQUEST_ERRORS_TOTAL,
            "Number of OpenStack API requests that failed.",
        );
        self.register_counter(
            API_REQUEST_DURATION_SECONDS_SUM,
            "Cumulative latency of OpenStack API requests in seconds.",
        );
        self.register_gauge(
            API_REQUESTS_IN_FLIGHT,
            "OpenStack API requests currently in flight.",
        );
    }
}

/// Measurement scope around a single remote call.
///
/// Entering the scope bumps the in-flight gauge. The outcome is recorded when
/// the scope is dropped, so early returns and cancelled futures are counted
/// too. A scope dropped without [`MetricContext::observe`] counts as a failure.
pub struct MetricContext<'a> {
    registry: &'a MetricsRegistry,
    resource: &'static str,
    operation: &'static str,
    start: Instant,
    succeeded: Option<bool>,
}

impl<'a> MetricContext<'a> {
    pub fn new(registry: &'a MetricsRegistry, resource: &'static str, operation: &'static str) -> Self {
        registry.gauge_inc(
            API_REQUESTS_IN_FLIGHT,
            &[("resource", resource), ("operation", operation)],
        );
        Self {
            registry,
            resource,
            operation,
            start: Instant::now(),
            succeeded: None,
        }
    }

    /// Record the outcome of the call and hand the result back unchanged.
    pub fn observe<T, E>(mut self, result: Result<T, E>) -> Result<T, E> {
        self.succeeded = Some(result.is_ok());
        result
    }
}

impl Drop for MetricContext<'_> {
    fn drop(&mut self) {
        let labels = [("resource", self.resource), ("operation", self.operation)];
        let elapsed = self.start.elapsed().as_secs_f64();

        if self.succeeded.is_none() {
            debug!(
                "{}/{} request abandoned before completion",
                self.resource, self.operation
            );
        }

        self.registry.counter_inc(API_REQUESTS_TOTAL, &labels);
        if !self.succeeded.unwrap_or(false) {
            self.registry.counter_inc(API_REQUEST_ERRORS_TOTAL, &labels);
        }
        self.registry
            .counter_add(API_REQUEST_DURATION_SECONDS_SUM, &labels, elapsed);
        self.registry.gauge_dec(API_REQUESTS_IN_FLIGHT, &labels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: [(&str, &str); 2] = [("resource", "secret"), ("operation", "list")];

    fn registry() -> MetricsRegistry {
        let registry = MetricsRegistry::new();
        registry.register_api_metrics();
        registry
    }

    #[test]
    fn success_is_counted_without_error() {
        let registry = registry();
        let res: Result<u32, ()> = MetricContext::new(&registry, "secret", "list").observe(Ok(7));
        assert_eq!(res, Ok(7));

        assert_eq!(registry.counter_value(API_REQUESTS_TOTAL, &LIST), Some(1.0));
        assert_eq!(registry.counter_value(API_REQUEST_ERRORS_TOTAL, &LIST), None);
        assert_eq!(registry.gauge_value(API_REQUESTS_IN_FLIGHT, &LIST), Some(0));
    }

    #[test]
    fn failure_is_counted_as_error() {
        let registry = registry();
        let res: Result<(), &str> = MetricContext::new(&registry, "secret", "list").observe(Err("boom"));
        assert!(res.is_err());

        assert_eq!(registry.counter_value(API_REQUESTS_TOTAL, &LIST), Some(1.0));
        assert_eq!(registry.counter_value(API_REQUEST_ERRORS_TOTAL, &LIST), Some(1.0));
    }

    #[test]
    fn in_flight_gauge_tracks_open_scopes() {
        let registry = registry();
        let mc = MetricContext::new(&registry, "secret", "list");
        assert_eq!(registry.gauge_value(API_REQUESTS_IN_FLIGHT, &LIST), Some(1));
        drop(mc);
        assert_eq!(registry.gauge_value(API_REQUESTS_IN_FLIGHT, &LIST), Some(0));
    }

    #[test]
    fn abandoned_scope_counts_as_failure() {
        let registry = registry();
        {
            let _mc = MetricContext::new(&registry, "secret", "delete");
        }
        let labels = [("resource", "secret"), ("operation", "delete")];
        assert_eq!(registry.counter_value(API_REQUEST_ERRORS_TOTAL, &labels), Some(1.0));
        assert!(registry.counter_value(API_REQUEST_DURATION_SECONDS_SUM, &labels).is_some());
    }
}
