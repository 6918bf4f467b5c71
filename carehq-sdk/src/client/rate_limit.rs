//! Rate-limit telemetry reported by the API on every response.

use reqwest::header::HeaderMap;
use tracing::warn;

/// Maximum number of requests per second allowed for the API key.
pub const RATE_LIMIT_LIMIT_HEADER: &str = "X-CareHQ-RateLimit-Limit";

/// Time at which the current limit resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "X-CareHQ-RateLimit-Reset";

/// Requests left before the next reset.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "X-CareHQ-RateLimit-Remaining";

/// The latest rate-limit values received by a client.
///
/// Every field is `None` until a response has carried the matching header.
/// Fields are updated independently and the last value received wins.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateLimit {
    pub limit: Option<f64>,
    pub reset: Option<f64>,
    pub remaining: Option<f64>,
}

impl RateLimit {
    /// Overwrite each field whose header is present and numeric.
    pub(crate) fn update(&mut self, headers: &HeaderMap) {
        update_field(&mut self.limit, headers, RATE_LIMIT_LIMIT_HEADER);
        update_field(&mut self.reset, headers, RATE_LIMIT_RESET_HEADER);
        update_field(&mut self.remaining, headers, RATE_LIMIT_REMAINING_HEADER);
    }
}

fn update_field(field: &mut Option<f64>, headers: &HeaderMap, name: &'static str) {
    let Some(value) = headers.get(name) else {
        return;
    };
    match value.to_str().ok().and_then(|s| s.trim().parse::<f64>().ok()) {
        Some(parsed) => *field = Some(parsed),
        None => warn!(header = name, ?value, "ignoring unparsable rate limit header"),
    }
}
