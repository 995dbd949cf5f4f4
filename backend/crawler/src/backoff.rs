use rand::Rng;
use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 5;
const BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Exponential backoff with full jitter: `random(0, min(max_delay, base * 2^attempt))`.
pub fn full_jitter_delay(attempt: u32) -> Duration {
    let exp = BASE_DELAY.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    let capped = exp.min(MAX_DELAY);
    let jittered_millis = rand::thread_rng().gen_range(0..=capped.as_millis().max(1) as u64);
    Duration::from_millis(jittered_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_never_exceeds_cap() {
        for attempt in 0..10 {
            assert!(full_jitter_delay(attempt) <= MAX_DELAY);
        }
    }
}
