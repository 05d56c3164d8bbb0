//! Progress estimation for transfers the backend reports only at the end.
//!
//! Every tick, each `Pending`/`Active` task creeps forward by a small random
//! step, ten times slower past 95 %, and never reaches the completion
//! ceiling. The registry enforces the ceiling and ignores writes to tasks
//! that have since turned terminal.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::RwLock;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use telecool_core::{TaskId, TransferEvent, TransferEventEmitterPort, TransferStatus};

use crate::registry::{ProgressOutcome, TaskRegistry};
use crate::throttle::RateCapControl;

/// Per-tick progress step, in percentage points.
const STEP: Range<f64> = 0.05..0.15;

/// Past this fraction the step is divided by `SLOWDOWN`.
const SLOWDOWN_THRESHOLD: f64 = 95.0;
const SLOWDOWN: f64 = 10.0;

/// Synthetic display rate, bytes per second (1 MiB/s to 6 MiB/s).
const SYNTHETIC_RATE: Range<f64> = 1_048_576.0..6_291_456.0;

/// One applied estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatedProgress {
    pub id: TaskId,
    pub fraction: f64,
    pub rate_bytes_per_second: f64,
}

/// Advances displayed progress while the authoritative transfer runs.
pub struct ProgressEstimator {
    rng: StdRng,
    rate_cap: RateCapControl,
    tick_interval: Duration,
}

impl ProgressEstimator {
    /// Create an estimator with an entropy-seeded RNG.
    pub fn new(rate_cap: RateCapControl, tick_interval: Duration) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            rate_cap,
            tick_interval,
        }
    }

    /// Use a deterministic RNG.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Apply one estimation step to every in-flight task.
    ///
    /// `Pending` tasks are promoted to `Active` first. Returns the estimates
    /// the registry accepted.
    pub fn tick(&mut self, registry: &mut TaskRegistry) -> Vec<EstimatedProgress> {
        let cap = self.rate_cap.current();
        let mut applied = Vec::new();

        for id in registry.in_flight_ids() {
            let Some(current) = registry.get(&id).map(|t| (t.status, t.transferred_fraction))
            else {
                continue;
            };

            if current.0 == TransferStatus::Pending {
                if let Err(e) = registry.set_status(&id, TransferStatus::Active) {
                    tracing::debug!(id = %id, error = %e, "Estimator could not activate task");
                    continue;
                }
            }

            let fraction = current.1;
            if fraction >= 100.0 {
                continue;
            }

            let base = self.rng.gen_range(STEP);
            let step = if fraction > SLOWDOWN_THRESHOLD {
                base / SLOWDOWN
            } else {
                base
            };
            let rate = cap.clamp_rate(self.rng.gen_range(SYNTHETIC_RATE));

            if let ProgressOutcome::Applied { fraction } =
                registry.set_progress(&id, fraction + step, rate)
            {
                applied.push(EstimatedProgress {
                    id,
                    fraction,
                    rate_bytes_per_second: rate,
                });
            }
        }

        applied
    }

    /// Tick on an interval until `cancel` fires.
    ///
    /// Each tick takes the registry write lock once. Accepted estimates are
    /// published as `TaskProgress` events.
    pub async fn run(
        mut self,
        registry: Arc<RwLock<TaskRegistry>>,
        emitter: Arc<dyn TransferEventEmitterPort>,
        cancel: CancellationToken,
    ) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; skip it so new tasks start at 0.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::debug!(target: "telecool.transfer", "Progress estimator stopped");
                    break;
                }

                _ = ticker.tick() => {
                    let applied = {
                        let mut registry = registry.write().await;
                        self.tick(&mut registry)
                    };
                    for estimate in applied {
                        emitter.emit(TransferEvent::TaskProgress {
                            id: estimate.id,
                            fraction: estimate.fraction,
                            rate_bytes_per_second: estimate.rate_bytes_per_second,
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use telecool_core::{ESTIMATE_CEILING, RateCap, SourceRef, TransferTask};

    fn registry_with_task() -> (TaskRegistry, TaskId) {
        let mut registry = TaskRegistry::new();
        let id = registry
            .create(TransferTask::new(
                "a.bin",
                1 << 20,
                SourceRef::new("chat", 1),
                PathBuf::from("/tmp/a.bin"),
            ))
            .unwrap();
        (registry, id)
    }

    fn estimator(cap: RateCap) -> ProgressEstimator {
        ProgressEstimator::new(RateCapControl::new(cap), Duration::from_secs(1)).with_seed(7)
    }

    #[test]
    fn test_first_tick_activates_and_advances() {
        let (mut registry, id) = registry_with_task();
        let mut est = estimator(RateCap::Unlimited);

        let applied = est.tick(&mut registry);
        let task = registry.get(&id).unwrap();

        assert_eq!(task.status, TransferStatus::Active);
        assert_eq!(applied.len(), 1);
        assert!(STEP.contains(&task.transferred_fraction));
        assert!(SYNTHETIC_RATE.contains(&task.rate_bytes_per_second));
    }

    #[test]
    fn test_never_reaches_ceiling() {
        let (mut registry, id) = registry_with_task();
        let mut est = estimator(RateCap::Unlimited);

        let mut last = 0.0;
        for _ in 0..5000 {
            est.tick(&mut registry);
            let fraction = registry.get(&id).unwrap().transferred_fraction;
            assert!(fraction >= last);
            assert!(fraction < ESTIMATE_CEILING);
            last = fraction;
        }
    }

    #[test]
    fn test_slows_down_past_threshold() {
        let (mut registry, id) = registry_with_task();
        registry.set_progress(&id, 96.0, 0.0);
        let mut est = estimator(RateCap::Unlimited);

        est.tick(&mut registry);
        let fraction = registry.get(&id).unwrap().transferred_fraction;
        assert!(fraction > 96.0);
        assert!(fraction - 96.0 < STEP.end / SLOWDOWN);
    }

    #[test]
    fn test_rate_clamped_to_cap() {
        let (mut registry, id) = registry_with_task();
        let mut est = estimator(RateCap::from_bytes_per_second(1000));

        est.tick(&mut registry);
        let rate = registry.get(&id).unwrap().rate_bytes_per_second;
        assert!((rate - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_skips_paused_and_terminal() {
        let (mut registry, paused) = registry_with_task();
        registry.set_status(&paused, TransferStatus::Active).unwrap();
        registry.set_status(&paused, TransferStatus::Paused).unwrap();

        let done = registry
            .create(TransferTask::new("b", 1, SourceRef::new("c", 2), "/tmp/b"))
            .unwrap();
        registry.complete(&done).unwrap();

        let mut est = estimator(RateCap::Unlimited);
        assert!(est.tick(&mut registry).is_empty());
        assert!(registry.get(&paused).unwrap().transferred_fraction.abs() < f64::EPSILON);
        assert!((registry.get(&done).unwrap().transferred_fraction - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_same_seed_same_estimates() {
        let (mut a, id_a) = registry_with_task();
        let (mut b, id_b) = registry_with_task();
        let mut est_a = estimator(RateCap::Unlimited);
        let mut est_b = estimator(RateCap::Unlimited);

        for _ in 0..10 {
            est_a.tick(&mut a);
            est_b.tick(&mut b);
        }
        let fa = a.get(&id_a).unwrap().transferred_fraction;
        let fb = b.get(&id_b).unwrap().transferred_fraction;
        assert!((fa - fb).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let (registry, id) = registry_with_task();
        let registry = Arc::new(RwLock::new(registry));
        let cancel = CancellationToken::new();
        let est = estimator(RateCap::Unlimited);

        let handle = tokio::spawn(est.run(
            Arc::clone(&registry),
            Arc::new(telecool_core::NoopTransferEmitter::new()),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        cancel.cancel();
        handle.await.unwrap();

        let fraction = registry.read().await.get(&id).unwrap().transferred_fraction;
        assert!(fraction > 0.0);
        assert!(fraction < 3.0 * STEP.end + f64::EPSILON);
    }
}
