//! Exponential backoff for reconnection loops.

use std::time::Duration;

use backon::BackoffBuilder;

/// First reconnection delay.
pub const MIN_DELAY: Duration = Duration::from_secs(5);
/// Longest delay between attempts.
pub const MAX_DELAY: Duration = Duration::from_secs(5 * 60);
const FACTOR: f32 = 1.1;

/// Create an exponential backoff iterator for reconnection.
/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
pub fn reconnect_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(MIN_DELAY)
        .with_max_delay(MAX_DELAY)
        .with_factor(FACTOR)
        .with_jitter()
        .without_max_times()
        .build()
}

/// Next delay, falling back to the maximum if the iterator ends.
pub fn next_delay(backoff: &mut impl Iterator<Item = Duration>) -> Duration {
    backoff.next().unwrap_or(MAX_DELAY)
}
