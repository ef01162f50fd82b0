// crates/resilience/examples/resilience_demo.rs
//! Demonstration of resilience patterns

use contentguard_resilience::{
    CircuitBreaker, CircuitBreakerConfig, ErrorKind, RateLimiter, RetryConfig, RetryStrategy,
};
use contentguard_telemetry::{Emitter, LogSink};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Resilience Patterns Demo");
    println!("========================\n");

    demo_retry().await;
    println!();
    demo_circuit_breaker();
    println!();
    demo_rate_limiter();
}

async fn demo_retry() {
    println!("1. Retry Strategy");
    println!("-----------------");

    let strategy = RetryStrategy::new(
        RetryConfig::new(3)
            .with_initial_delay(Duration::from_millis(100))
            .with_multiplier(2.0),
    )
    .with_telemetry(Emitter::new(Arc::new(LogSink::default())));

    let attempt = AtomicU32::new(0);

    let result = strategy
        .execute(|| async {
            let count = attempt.fetch_add(1, Ordering::SeqCst) + 1;
            println!("  Attempt {}", count);

            if count < 3 {
                Err(ErrorKind::Server)
            } else {
                Ok(42)
            }
        })
        .await;

    match result {
        Ok(value) => println!("✓ Success after retries: {}", value),
        Err(e) => println!("✗ Failed: {}", e),
    }

    let client_error: Result<(), ErrorKind> = strategy.execute(|| async { Err(ErrorKind::Client) }).await;
    println!("  Client errors are not retried: {:?}", client_error);
}

fn demo_circuit_breaker() {
    println!("2. Circuit Breaker");
    println!("------------------");

    let config = CircuitBreakerConfig::new(3, Duration::from_millis(100)).with_success_threshold(1);
    let cb = CircuitBreaker::named("demo", config);
    cb.on_state_change(|t| println!("  [{}] {} -> {}", t.name, t.from, t.to));

    for i in 1..=5 {
        let result = cb.call(|| {
            if i <= 3 {
                Err::<i32, _>(ErrorKind::Server)
            } else {
                Ok(42)
            }
        });

        match result {
            Ok(_) => println!("  Request {}: ✓ Success", i),
            Err(e) => println!("  Request {}: ✗ {}", i, e),
        }
    }

    std::thread::sleep(Duration::from_millis(150));
    println!("  Waited for recovery timeout...");

    match cb.call(|| Ok::<_, ErrorKind>(42)) {
        Ok(_) => println!("  Trial: ✓ Request succeeded"),
        Err(e) => println!("  Trial: ✗ {}", e),
    }

    println!("  Circuit state: {}", cb.state());
}

fn demo_rate_limiter() {
    println!("3. Rate Limiter");
    println!("---------------");

    let limiter = RateLimiter::new(5, Duration::from_secs(1));

    println!("  Limit: {} requests per second", limiter.max_requests());

    for i in 1..=7 {
        match limiter.check_limit("posts") {
            Ok(()) => println!("  Request {}: ✓ Allowed", i),
            Err(e) => println!("  Request {}: ✗ {}", i, e),
        }
    }

    println!("  Other keys are unaffected: {:?}", limiter.check_limit("categories"));
}
