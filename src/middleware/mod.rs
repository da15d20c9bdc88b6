pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{AuthRateLimiter, RateLimitConfig, RateLimitMiddleware};
pub use request_id::{RequestIdExt, RequestIdMiddleware};
