//! Bounded fan-out
//!
//! Runs one async lookup per item with at most `limit` in flight and
//! waits for exactly one outcome per item. Completion order is arbitrary;
//! callers re-sort.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{FlowdeckError, Result};

/// Outcomes of one fan-out, `results.len() + errors.len()` equals the item count
#[derive(Debug)]
pub struct FanOutReport<T> {
    pub results: Vec<T>,
    pub errors: Vec<FlowdeckError>,
}

impl<T> FanOutReport<T> {
    pub fn outcomes(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// All-or-nothing: any error discards the partial results.
    /// Cancellation wins over other errors so it stays silent upstream.
    pub fn into_all(mut self) -> Result<Vec<T>> {
        if self.errors.is_empty() {
            return Ok(self.results);
        }
        if let Some(pos) = self.errors.iter().position(FlowdeckError::is_cancelled) {
            return Err(self.errors.swap_remove(pos));
        }
        tracing::warn!(
            failed = self.errors.len(),
            succeeded = self.results.len(),
            "Fan-out had failures, dropping partial results"
        );
        Err(self.errors.swap_remove(0))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    limit: usize,
}

impl FanOut {
    /// `limit` is clamped to at least 1
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `work` over `items`, returning once every item has an outcome.
    ///
    /// Items waiting for a permit or still running when `cancel` fires
    /// finish as [`FlowdeckError::Cancelled`]. A panicking worker counts as
    /// [`FlowdeckError::WorkerFailed`]. Dropping the returned future aborts
    /// all workers.
    pub async fn run<I, T, F, Fut>(
        &self,
        items: Vec<I>,
        cancel: &CancellationToken,
        work: F,
    ) -> FanOutReport<T>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let total = items.len();
        let permits = Arc::new(Semaphore::new(self.limit));
        let mut workers = JoinSet::new();

        for item in items {
            let permits = Arc::clone(&permits);
            let token = cancel.clone();
            let job = work(item);
            workers.spawn(async move {
                let _permit = tokio::select! {
                    permit = permits.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return Err(FlowdeckError::Cancelled),
                    },
                    _ = token.cancelled() => return Err(FlowdeckError::Cancelled),
                };
                tokio::select! {
                    outcome = job => outcome,
                    _ = token.cancelled() => Err(FlowdeckError::Cancelled),
                }
            });
        }

        let mut report = FanOutReport {
            results: Vec::with_capacity(total),
            errors: Vec::new(),
        };
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(value)) => report.results.push(value),
                Ok(Err(e)) => report.errors.push(e),
                Err(join_error) => report.errors.push(FlowdeckError::WorkerFailed {
                    reason: join_error.to_string(),
                }),
            }
        }

        if !report.errors.is_empty() {
            tracing::debug!(
                total,
                failed = report.errors.len(),
                "Fan-out finished with errors"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_every_item_yields_one_outcome() {
        let fan = FanOut::new(3);
        let token = CancellationToken::new();
        let report = fan
            .run((0..10).collect(), &token, |n: u32| async move {
                if n % 3 == 0 {
                    Err(FlowdeckError::NotFound {
                        what: n.to_string(),
                    })
                } else {
                    Ok(n * 2)
                }
            })
            .await;
        assert_eq!(report.outcomes(), 10);
        assert_eq!(report.errors.len(), 4);
        assert!(!report.is_complete_success());
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let fan = FanOut::new(2);
        let token = CancellationToken::new();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let report = fan
            .run((0..8).collect(), &token, |n: usize| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(n)
                }
            })
            .await;

        assert_eq!(report.results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_cancel_finishes_pending_items() {
        let fan = FanOut::new(1);
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let report = fan
            .run((0..4).collect(), &token, |n: u32| async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(n)
            })
            .await;

        assert_eq!(report.outcomes(), 4);
        assert!(report.errors.iter().all(FlowdeckError::is_cancelled));
        assert!(report.into_all().unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_panicking_worker_is_counted() {
        let fan = FanOut::new(4);
        let token = CancellationToken::new();
        let report = fan
            .run(vec![1u32, 2, 3], &token, |n| async move {
                if n == 2 {
                    panic!("worker blew up");
                }
                Ok(n)
            })
            .await;
        assert_eq!(report.outcomes(), 3);
        assert_eq!(report.errors[0].code(), "FD-042");
    }

    #[tokio::test]
    async fn test_empty_input() {
        let report = FanOut::new(4)
            .run(Vec::<u32>::new(), &CancellationToken::new(), |n| async move { Ok(n) })
            .await;
        assert_eq!(report.outcomes(), 0);
        assert_eq!(report.into_all().unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_into_all_prefers_cancelled() {
        let report: FanOutReport<u32> = FanOutReport {
            results: vec![1],
            errors: vec![
                FlowdeckError::NotFound { what: "x".into() },
                FlowdeckError::Cancelled,
            ],
        };
        assert!(report.into_all().unwrap_err().is_cancelled());
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(FanOut::new(0).limit(), 1);
    }
}
