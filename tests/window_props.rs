//! Property tests for sliding-window admission.

#![allow(clippy::unwrap_used)]

use fare_compare::application::services::{RateLimitConfig, RateLimiter};
use fare_compare::domain::value_objects::{ClientIdentity, Timestamp};
use fare_compare::infrastructure::window::{InMemoryTokenWindow, TokenWindow};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const WINDOW_MS: i64 = 1_000;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    /// For any request schedule, no window of `WINDOW_MS` ever contains more
    /// than `capacity` admitted requests.
    #[test]
    fn admitted_never_exceed_capacity(
        capacity in 1u32..8,
        gaps in proptest::collection::vec(0i64..400, 1..60),
    ) {
        let admitted = runtime().block_on(async {
            let store = InMemoryTokenWindow::new();
            let window = Duration::from_millis(WINDOW_MS as u64);
            let mut now = 1_000_000i64;
            let mut admitted = Vec::new();
            for gap in gaps {
                now += gap;
                let outcome = store.try_acquire("k", now, window, capacity).await.unwrap();
                if outcome.admitted {
                    admitted.push(now);
                }
            }
            admitted
        });

        for (i, start) in admitted.iter().enumerate() {
            let in_window = admitted
                .iter()
                .skip(i)
                .take_while(|t| **t < start + WINDOW_MS)
                .count();
            prop_assert!(in_window <= capacity as usize);
        }
    }

    /// Rejected attempts leave the stored count untouched.
    #[test]
    fn rejections_do_not_mutate(capacity in 1u32..6, extra in 1usize..10) {
        runtime().block_on(async {
            let store = InMemoryTokenWindow::new();
            let window = Duration::from_millis(WINDOW_MS as u64);
            for _ in 0..capacity {
                store.try_acquire("k", 5_000, window, capacity).await.unwrap();
            }
            for _ in 0..extra {
                let outcome = store.try_acquire("k", 5_000, window, capacity).await.unwrap();
                assert!(!outcome.admitted);
                assert_eq!(outcome.count, capacity);
            }
            assert_eq!(store.count("k", 5_000, window).await.unwrap(), capacity);
        });
    }

    /// Remaining plus used always equals the limit while admitting.
    #[test]
    fn remaining_counts_down(capacity in 1u32..20) {
        runtime().block_on(async {
            let limiter = RateLimiter::new(
                Arc::new(InMemoryTokenWindow::new()),
                RateLimitConfig::new(capacity, Duration::from_secs(60)),
            );
            let client = ClientIdentity::new("1.2.3.4");
            let start = Timestamp::from_millis(1_700_000_000_000).unwrap();
            for used in 1..=capacity {
                let admission = limiter
                    .admit_at(&client, start.add_millis(i64::from(used)))
                    .await
                    .unwrap();
                assert!(admission.allowed);
                assert_eq!(admission.remaining, capacity - used);
            }
            let rejected = limiter
                .admit_at(&client, start.add_millis(i64::from(capacity) + 1))
                .await
                .unwrap();
            assert!(!rejected.allowed);
            assert!(rejected.retry_after.unwrap() > Duration::ZERO);
        });
    }
}
