/*
 * Responsibility
 * - プロセス全体で 1 つの token bucket による admission control
 * - 容量 burst、rate_per_sec で連続的に補充、1 request = 1 token
 * - 補充と消費は同じ Mutex の critical section 内で行う
 *   (並行 allow() が実在する token 数以上を通さない)
 */
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmissionPolicy {
    /// Steady refill rate (tokens per second).
    pub rate_per_sec: f64,
    /// Bucket capacity (maximum burst).
    pub burst: u32,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            rate_per_sec: 1.0,
            burst: 5,
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct AdmissionController {
    policy: AdmissionPolicy,
    bucket: Mutex<Bucket>,
}

impl AdmissionController {
    /// Creates a full bucket.
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self::starting_at(policy, Instant::now())
    }

    pub fn starting_at(policy: AdmissionPolicy, now: Instant) -> Self {
        Self {
            policy,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(policy.burst),
                last_refill: now,
            }),
        }
    }

    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    /// Admit one request at clock value `now`.
    ///
    /// `now` earlier than the last refill adds nothing; the bucket never runs
    /// backwards.
    pub fn allow_at(&self, now: Instant) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        if !elapsed.is_zero() {
            let capacity = f64::from(self.policy.burst);
            bucket.tokens =
                (bucket.tokens + elapsed.as_secs_f64() * self.policy.rate_per_sec).min(capacity);
            bucket.last_refill = now;
        }

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
