//! Batch execution: one routine, one transaction, retry while locked.
//!
//! Maintenance routines run unattended next to interactive writers, so
//! the store being locked is an ordinary condition, not a failure. The
//! runner probes before starting and waits out contention under a
//! [`RetryPolicy`]; once the store is free, the whole routine runs inside
//! a single transaction that either commits or disappears.

use crate::{EngineError, Result};
use herdbook_store::LedgerWrite;
use std::fmt;
use std::time::Duration;
use tracing::{error, warn};

/// How long and how often to wait for a locked store.
///
/// The sleeper is injectable so tests retry instantly; the default sleeps
/// on the current thread.
pub struct RetryPolicy {
    /// Probe attempts before giving up.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub interval: Duration,
    sleeper: Box<dyn FnMut(Duration) + Send>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(3),
            sleeper: Box::new(std::thread::sleep),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// A policy with the given budget and the default thread sleeper.
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            ..Self::default()
        }
    }

    /// Replaces the sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl FnMut(Duration) + Send + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }
}

/// Probes the store until it is free or the retry budget runs out.
///
/// Only [`herdbook_store::StoreError::Busy`] is retried; any other store
/// failure propagates immediately. There is no sleep after the final
/// failed attempt.
pub fn wait_until_free<S>(store: &mut S, policy: &mut RetryPolicy) -> Result<()>
where
    S: LedgerWrite + ?Sized,
{
    if policy.max_attempts == 0 {
        return Err(EngineError::Invalid(
            "retry policy needs at least one attempt".into(),
        ));
    }
    for attempt in 1..=policy.max_attempts {
        match store.probe() {
            Ok(()) => return Ok(()),
            Err(err) if err.is_busy() => {
                if attempt < policy.max_attempts {
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        interval = ?policy.interval,
                        "store busy, will retry"
                    );
                    (policy.sleeper)(policy.interval);
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(EngineError::StoreBusy {
        attempts: policy.max_attempts,
    })
}

/// Runs a routine as one transaction, waiting out a busy store first.
///
/// The closure's error aborts the batch: the transaction is rolled back
/// and the error returned as-is. A failing rollback is logged but never
/// masks the original error.
pub fn run_batch<S, T, F>(store: &mut S, policy: &mut RetryPolicy, f: F) -> Result<T>
where
    S: LedgerWrite + ?Sized,
    F: FnOnce(&mut S) -> Result<T>,
{
    wait_until_free(store, policy)?;
    store.begin()?;
    match f(store) {
        Ok(value) => match store.commit() {
            Ok(()) => Ok(value),
            Err(err) => {
                if let Err(rollback_err) = store.rollback() {
                    error!(error = %rollback_err, "rollback after failed commit also failed");
                }
                Err(err.into())
            }
        },
        Err(err) => {
            if let Err(rollback_err) = store.rollback() {
                error!(error = %rollback_err, "rollback after batch error failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use herdbook_core::{Category, Movement, MovementKind, Property, Sex};
    use herdbook_store::{LedgerRead, MemoryStore};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instant_policy(max_attempts: u32) -> (RetryPolicy, Arc<AtomicU32>) {
        let sleeps = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&sleeps);
        let policy = RetryPolicy::new(max_attempts, Duration::from_millis(1))
            .with_sleeper(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        (policy, sleeps)
    }

    #[test]
    fn waits_through_a_busy_spell() {
        let mut store = MemoryStore::new();
        store.fail_next_probes(3);
        let (mut policy, sleeps) = instant_policy(5);

        wait_until_free(&mut store, &mut policy).unwrap();
        assert_eq!(sleeps.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_the_budget_without_a_trailing_sleep() {
        let mut store = MemoryStore::new();
        store.fail_next_probes(10);
        let (mut policy, sleeps) = instant_policy(4);

        let err = wait_until_free(&mut store, &mut policy).unwrap_err();
        assert!(matches!(err, EngineError::StoreBusy { attempts: 4 }));
        assert_eq!(sleeps.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn commits_the_closure_work() {
        let mut store = MemoryStore::new();
        let property = store
            .insert_property(&Property::new("Fazenda Girassol"))
            .unwrap();
        let category = store
            .insert_category(&Category::new("Garrote", Sex::Male))
            .unwrap();
        let (mut policy, _) = instant_policy(1);

        let id = run_batch(&mut store, &mut policy, |s| {
            Ok(s.insert_movement(&Movement::new(
                property,
                category,
                MovementKind::Birth,
                date(2024, 3, 1),
                40,
            ))?)
        })
        .unwrap();

        let rows = store
            .movements_in(property, category, None, date(2024, 12, 31))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
    }

    #[test]
    fn a_failing_batch_leaves_no_trace() {
        let mut store = MemoryStore::new();
        let property = store
            .insert_property(&Property::new("Fazenda Girassol"))
            .unwrap();
        let category = store
            .insert_category(&Category::new("Garrote", Sex::Male))
            .unwrap();
        let (mut policy, _) = instant_policy(1);

        let err = run_batch(&mut store, &mut policy, |s| {
            s.insert_movement(&Movement::new(
                property,
                category,
                MovementKind::Birth,
                date(2024, 3, 1),
                40,
            ))?;
            Err::<(), _>(EngineError::Invalid("forced failure".into()))
        })
        .unwrap_err();

        assert!(matches!(err, EngineError::Invalid(_)));
        assert!(store
            .movements_in(property, category, None, date(2024, 12, 31))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn busy_budget_exhaustion_never_opens_a_transaction() {
        let mut store = MemoryStore::new();
        store.fail_next_probes(10);
        let (mut policy, _) = instant_policy(2);

        let err = run_batch(&mut store, &mut policy, |_| Ok(())).unwrap_err();
        assert!(matches!(err, EngineError::StoreBusy { attempts: 2 }));
        // A fresh begin must succeed: nothing was left open.
        store.begin().unwrap();
        store.rollback().unwrap();
    }
}
