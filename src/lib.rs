pub mod config;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod middleware;
pub mod rate_limiter;
pub mod response;
pub mod server;
pub mod service;
pub mod stats;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use rate_limiter::{LimiterPolicy, SlidingWindowLimiter};
pub use server::create_app;
pub use service::TagService;
