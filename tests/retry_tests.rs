use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use spark_gateway::config::RetryPolicy;
use spark_gateway::error::GatewayError;
use spark_gateway::submit::run_with_retry;

fn always_fail(
    calls: &AtomicU32,
) -> impl FnMut(u32) -> std::future::Ready<Result<(), String>> + '_ {
    move |attempt| {
        calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Err(format!("attempt {} failed", attempt)))
    }
}

/// The paused clock jumps straight to timer deadlines, give or take a tick.
fn assert_elapsed(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "elapsed {:?}, expected {:?}",
        elapsed,
        expected
    );
}

#[tokio::test(start_paused = true)]
async fn test_capped_delays_between_attempts() {
    let policy = RetryPolicy::new(4, Duration::from_secs(1), 2, Duration::from_secs(3));
    let calls = AtomicU32::new(0);

    let start = Instant::now();
    let err = run_with_retry(policy, always_fail(&calls)).await.unwrap_err();

    // 1s + 2s + 3s (capped), nothing after the last attempt
    assert_elapsed(start, Duration::from_secs(6));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(matches!(err, GatewayError::RetriesExceeded { attempts: 4 }));
}

#[tokio::test(start_paused = true)]
async fn test_default_policy_schedule() {
    let calls = AtomicU32::new(0);

    let start = Instant::now();
    let result = run_with_retry(RetryPolicy::default(), always_fail(&calls)).await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 10);
    // 1 + 2 + 4 + ... + 256 seconds, all below the 300s cap
    assert_elapsed(start, Duration::from_secs(511));
}

#[tokio::test(start_paused = true)]
async fn test_success_stops_waiting() {
    let policy = RetryPolicy::new(10, Duration::from_secs(1), 3, Duration::from_secs(60));
    let calls = AtomicU32::new(0);

    let start = Instant::now();
    run_with_retry(policy, |attempt| {
        calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(if attempt < 3 { Err("not yet") } else { Ok(()) })
    })
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_elapsed(start, Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_never_sleeps() {
    let policy = RetryPolicy::new(1, Duration::from_secs(30), 2, Duration::from_secs(60));
    let calls = AtomicU32::new(0);

    let start = Instant::now();
    let err = run_with_retry(policy, always_fail(&calls)).await.unwrap_err();

    assert_elapsed(start, Duration::ZERO);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(err, GatewayError::RetriesExceeded { attempts: 1 }));
}

#[tokio::test(start_paused = true)]
async fn test_slow_attempts_add_to_delay() {
    let policy = RetryPolicy::new(3, Duration::from_secs(1), 2, Duration::from_secs(60));

    let start = Instant::now();
    let result = run_with_retry(policy, |_| async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Err::<(), _>("timed out")
    })
    .await;

    assert!(result.is_err());
    // 3 x 10s of work plus 1s + 2s of backoff
    assert_elapsed(start, Duration::from_secs(33));
}
