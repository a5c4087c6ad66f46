//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// API group shared by every custom resource this controller owns
pub const API_GROUP: &str = "mailcow.octopilot.io";

/// Finalizer placed on every object whose mailcow counterpart may exist
pub const FINALIZER: &str = "mailcow.octopilot.io/finalizer";

/// Field manager name used for status and metadata patches
pub const FIELD_MANAGER: &str = "mailcow-controller";

/// Header carrying the mailcow API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Path prefix of the mailcow REST API
pub const API_PATH_PREFIX: &str = "/api/v1";

/// Prefix of the ConfigMap that publishes a domain's DKIM key
pub const DKIM_CONFIGMAP_PREFIX: &str = "dkim-";

/// DKIM key size requested when a domain has no key yet
pub const DKIM_KEY_SIZE: f32 = 2048.0;

/// DKIM selector requested when a domain has no key yet
pub const DKIM_SELECTOR: &str = "dkim";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default periodic resync interval for converged objects (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default timeout applied to every mailcow API request (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default maximum number of concurrent reconciliations per kind
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Default minimum error backoff (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;

/// Default maximum error backoff (minutes)
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;
