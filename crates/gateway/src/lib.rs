// crates/gateway/src/lib.rs
//! Calling layer composing the resilience components around an upstream
//!
//! A [`ResilientClient`] checks the endpoint's rate limit and circuit
//! breaker before each upstream request, retries classified failures with
//! backoff and caches successful responses with their dependencies.
//!
//! # Example
//!
//! ```rust,no_run
//! use contentguard_config::Config;
//! use contentguard_gateway::{FetchOptions, HttpUpstream, ResilientClient};
//!
//! # async fn run() -> contentguard_gateway::GatewayResult<()> {
//! let config = Config::default();
//! let upstream = HttpUpstream::new(&config.upstream)?;
//! let client = ResilientClient::from_config(upstream, &config);
//!
//! let posts = client
//!     .get("/posts?category=rust", FetchOptions::new().depends_on("category:rust"))
//!     .await?;
//! println!("{}", posts);
//!
//! client.invalidate("category:rust");
//! println!("{}", client.cache_stats_display());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod factory;
pub mod settings;
mod upstream;

pub use client::{endpoint_of, FetchOptions, ResilientClient, WarmReport};
pub use error::{GatewayError, GatewayResult};
pub use factory::GuardFactory;
pub use upstream::{HttpUpstream, Upstream};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let factory = GuardFactory::default();
        let client = ResilientClient::new(
            HttpUpstream::new(&contentguard_config::UpstreamSettings::default())
                .expect("Failed to create upstream"),
            factory,
        );
        let _: WarmReport = WarmReport::default();
        assert!(client.breaker_states().is_empty());
    }
}
