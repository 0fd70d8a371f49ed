pub mod rate_limit;
pub mod tracing_middleware;

pub use rate_limit::{RateLimit, RateLimiters};
pub use tracing_middleware::TracingMiddleware;
