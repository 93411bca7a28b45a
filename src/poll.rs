//! Fixed-interval polling of remote state
//!
//! Neither remote service pushes completion events, so both the call-status
//! loop and the uploaded-file loop are built on [`poll_until`]: probe, sleep
//! one interval, probe again, until the probe reports a final value, a fatal
//! error, or the wait budget is spent.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Cadence and budget for a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between probes
    pub interval: Duration,

    /// Total sleep allowed before giving up (`None` = wait forever)
    pub max_wait: Option<Duration>,
}

impl PollPolicy {
    pub fn bounded(interval: Duration, max_wait: Duration) -> Self {
        Self {
            interval,
            max_wait: Some(max_wait),
        }
    }

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_wait: None,
        }
    }
}

/// Result of a single probe
#[derive(Debug)]
pub enum Probe<T, E> {
    /// Remote state reached a value the caller was waiting for
    Ready(T),
    /// Not there yet
    Pending,
    /// Probe failed but the loop should keep going
    Transient(E),
    /// Probe failed and further polling is pointless
    Fatal(E),
}

/// Tagged result of a whole polling loop
#[derive(Debug)]
pub enum PollOutcome<T, E> {
    Ready { value: T, waited: Duration },
    TimedOut { waited: Duration },
    Faulted { error: E, waited: Duration },
}

/// Poll `probe` under `policy`.
///
/// `waited` only counts the sleeps actually taken, so a loop that finishes on
/// its third probe reports two intervals. A failed probe consumes its interval
/// like any other. The final sleep is shortened so `waited` never exceeds
/// `max_wait`.
pub async fn poll_until<T, E, F, Fut>(policy: PollPolicy, mut probe: F) -> PollOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Probe<T, E>>,
    E: Display,
{
    let mut waited = Duration::ZERO;
    let mut attempt: u32 = 0;

    loop {
        if let Some(max_wait) = policy.max_wait {
            if waited >= max_wait {
                return PollOutcome::TimedOut { waited };
            }
        }

        attempt += 1;
        match probe().await {
            Probe::Ready(value) => return PollOutcome::Ready { value, waited },
            Probe::Pending => {
                debug!(attempt, waited_secs = waited.as_secs(), "Remote state not ready yet");
            }
            Probe::Transient(e) => {
                warn!(attempt, "Poll attempt failed, will retry: {}", e);
            }
            Probe::Fatal(error) => return PollOutcome::Faulted { error, waited },
        }

        let step = match policy.max_wait {
            Some(max_wait) => policy.interval.min(max_wait - waited),
            None => policy.interval,
        };
        tokio::time::sleep(step).await;
        waited += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn scripted(steps: Vec<Probe<u32, String>>) -> Mutex<VecDeque<Probe<u32, String>>> {
        Mutex::new(steps.into())
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_pending_counts_intervals() {
        let script = scripted(vec![Probe::Pending, Probe::Pending, Probe::Ready(7)]);
        let policy = PollPolicy::bounded(Duration::from_secs(5), Duration::from_secs(60));

        let start = tokio::time::Instant::now();
        let outcome = poll_until(policy, || {
            let next = script.lock().unwrap().pop_front().unwrap_or(Probe::Pending);
            async move { next }
        })
        .await;

        match outcome {
            PollOutcome::Ready { value, waited } => {
                assert_eq!(value, 7);
                assert_eq!(waited, Duration::from_secs(10));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_sleep_is_clipped_to_budget() {
        let policy = PollPolicy::bounded(Duration::from_secs(5), Duration::from_secs(12));
        let outcome: PollOutcome<(), String> =
            poll_until(policy, || async { Probe::Pending }).await;

        match outcome {
            PollOutcome::TimedOut { waited } => assert_eq!(waited, Duration::from_secs(12)),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_keep_polling_fatal_stops() {
        let script = scripted(vec![
            Probe::Transient("503".into()),
            Probe::Pending,
            Probe::Fatal("401".into()),
        ]);
        let policy = PollPolicy::unbounded(Duration::from_secs(1));

        let outcome = poll_until(policy, || {
            let next = script.lock().unwrap().pop_front().unwrap_or(Probe::Pending);
            async move { next }
        })
        .await;

        match outcome {
            PollOutcome::Faulted { error, waited } => {
                assert_eq!(error, "401");
                assert_eq!(waited, Duration::from_secs(2));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_times_out_without_probing() {
        let probes = Mutex::new(0u32);
        let policy = PollPolicy::bounded(Duration::from_secs(5), Duration::ZERO);
        let outcome: PollOutcome<(), String> = poll_until(policy, || {
            *probes.lock().unwrap() += 1;
            async { Probe::Pending }
        })
        .await;

        assert!(matches!(outcome, PollOutcome::TimedOut { .. }));
        assert_eq!(*probes.lock().unwrap(), 0);
    }
}
