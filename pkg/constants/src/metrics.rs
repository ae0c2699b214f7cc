//! Metric names and label values for remote key-manager calls.

/// Total number of API requests, labelled by resource and operation.
pub const API_REQUESTS_TOTAL: &str = "openstack_api_requests_total";

/// Number of failed API requests, labelled by resource and operation.
pub const API_REQUEST_ERRORS_TOTAL: &str = "openstack_api_request_errors_total";

/// Cumulative request latency in seconds.
pub const API_REQUEST_DURATION_SECONDS_SUM: &str = "openstack_api_request_duration_seconds_sum";

/// Requests currently on the wire.
pub const API_REQUESTS_IN_FLIGHT: &str = "openstack_api_requests_in_flight";

// ─── Label values ─────────────────────────────────────────────────────────

pub const RESOURCE_SECRET: &str = "secret";

pub const OP_LIST: &str = "list";
pub const OP_CREATE: &str = "create";
pub const OP_DELETE: &str = "delete";
