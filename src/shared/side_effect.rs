//! Best-effort side effects
//!
//! Email delivery and plate recognition may fail without failing the
//! operation that triggered them. [`best_effort`] bounds such a call with a
//! timeout, logs the failure and hands back a [`SideEffectReport`] that the
//! caller carries next to its core result.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::shared::errors::DomainError;

/// How a best-effort call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffectStatus {
    Completed,
    Failed,
    TimedOut,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SideEffectReport {
    pub effect: &'static str,
    pub status: SideEffectStatus,
}

impl SideEffectReport {
    pub fn skipped(effect: &'static str) -> Self {
        Self {
            effect,
            status: SideEffectStatus::Skipped,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SideEffectStatus::Completed
    }
}

/// A core result plus the reports of the side effects it triggered.
#[derive(Debug, Clone)]
pub struct WithSideEffects<T> {
    pub value: T,
    pub effects: Vec<SideEffectReport>,
}

impl<T> WithSideEffects<T> {
    pub fn new(value: T, effects: Vec<SideEffectReport>) -> Self {
        Self { value, effects }
    }

    pub fn effect(&self, name: &str) -> Option<&SideEffectReport> {
        self.effects.iter().find(|e| e.effect == name)
    }

    pub fn all_completed(&self) -> bool {
        self.effects
            .iter()
            .all(|e| matches!(e.status, SideEffectStatus::Completed | SideEffectStatus::Skipped))
    }
}

/// The error a failed side effect is logged as. It never reaches the caller.
fn unavailable(effect: &str, detail: impl Display) -> DomainError {
    DomainError::DependencyUnavailable(format!("{}: {}", effect, detail))
}

/// Await `fut` for at most `timeout`. Errors and timeouts are logged and
/// reported, never propagated.
pub async fn best_effort<T, E, Fut>(
    effect: &'static str,
    timeout: Duration,
    fut: Fut,
) -> (Option<T>, SideEffectReport)
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let status = match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => {
            debug!(effect, "Side effect completed");
            return (
                Some(value),
                SideEffectReport {
                    effect,
                    status: SideEffectStatus::Completed,
                },
            );
        }
        Ok(Err(e)) => {
            let err = unavailable(effect, e);
            warn!(effect, error = %err, "Side effect failed");
            SideEffectStatus::Failed
        }
        Err(_) => {
            let err = unavailable(effect, format_args!("timed out after {}ms", timeout.as_millis()));
            warn!(effect, error = %err, "Side effect timed out");
            SideEffectStatus::TimedOut
        }
    };

    metrics::counter!("side_effect_failures_total", "effect" => effect).increment(1);

    (None, SideEffectReport { effect, status })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completed_call_returns_value() {
        let (value, report) =
            best_effort("email", Duration::from_secs(1), async { Ok::<_, String>(7) }).await;
        assert_eq!(value, Some(7));
        assert!(report.is_completed());
    }

    #[tokio::test]
    async fn failure_is_swallowed() {
        let (value, report) = best_effort("email", Duration::from_secs(1), async {
            Err::<u8, _>("smtp down")
        })
        .await;
        assert_eq!(value, None);
        assert_eq!(report.status, SideEffectStatus::Failed);
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let (value, report) = best_effort("email", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, String>(())
        })
        .await;
        assert_eq!(value, None);
        assert_eq!(report.status, SideEffectStatus::TimedOut);
    }

    #[test]
    fn failures_are_logged_as_unavailable_dependencies() {
        let err = unavailable("recognition", "connection refused");
        assert!(matches!(err, DomainError::DependencyUnavailable(_)));
        assert!(err.is_internal());
        assert_eq!(err.to_string(), "Dependency unavailable: recognition: connection refused");
    }

    #[test]
    fn skipped_counts_as_settled() {
        let outcome = WithSideEffects::new((), vec![SideEffectReport::skipped("recognition")]);
        assert!(outcome.all_completed());
        assert!(outcome.effect("recognition").is_some());
        assert!(outcome.effect("email").is_none());
    }
}
