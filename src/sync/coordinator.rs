//! Per-stream fetch lifecycle
//!
//! Each stream owns a generation counter and the cancellation token of its
//! in-flight fetch. Starting a fetch cancels the previous token and bumps the
//! generation; a result is applied only if its generation is still current.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{
    Notification, NotificationSender, StreamFailure, StreamId, StreamPayload, StreamStatus,
    SyncUpdate,
};
use crate::error::{FlowdeckError, Result};

#[derive(Debug)]
struct StreamSlot {
    generation: u64,
    status: StreamStatus,
    cancel: Option<CancellationToken>,
}

impl StreamSlot {
    fn new() -> Self {
        Self {
            generation: 0,
            status: StreamStatus::Idle,
            cancel: None,
        }
    }
}

/// What [`SyncCoordinator::apply`] did with an update
#[derive(Debug, PartialEq, Eq)]
pub enum Applied {
    /// A newer generation exists; the result was dropped
    Superseded,
    /// Cancelled fetch; the stream is back to Idle
    Cancelled,
    /// Ready or Empty; the caller replaces its cache with the payload
    Data(StreamPayload),
    Failed(StreamFailure),
}

pub struct SyncCoordinator {
    streams: HashMap<StreamId, StreamSlot>,
    timeout: Duration,
    tx: NotificationSender,
}

impl SyncCoordinator {
    pub fn new(timeout: Duration, tx: NotificationSender) -> Self {
        let streams = StreamId::ALL
            .iter()
            .map(|id| (*id, StreamSlot::new()))
            .collect();
        Self {
            streams,
            timeout,
            tx,
        }
    }

    fn slot(&self, stream: StreamId) -> &StreamSlot {
        // every StreamId is inserted in new()
        &self.streams[&stream]
    }

    fn slot_mut(&mut self, stream: StreamId) -> &mut StreamSlot {
        self.streams.entry(stream).or_insert_with(StreamSlot::new)
    }

    pub fn status(&self, stream: StreamId) -> &StreamStatus {
        &self.slot(stream).status
    }

    pub fn generation(&self, stream: StreamId) -> u64 {
        self.slot(stream).generation
    }

    pub fn is_fetching(&self, stream: StreamId) -> bool {
        self.status(stream).is_fetching()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Enter `Fetching` without spawning anything. Cancels the previous
    /// scope and returns the new generation with its fresh token.
    pub fn start(&mut self, stream: StreamId) -> (u64, CancellationToken) {
        let slot = self.slot_mut(stream);
        if let Some(previous) = slot.cancel.take() {
            previous.cancel();
        }
        slot.generation += 1;
        slot.status = StreamStatus::Fetching;
        let token = CancellationToken::new();
        slot.cancel = Some(token.clone());
        tracing::debug!(stream = ?stream, generation = slot.generation, "Fetch started");
        (slot.generation, token)
    }

    /// Start a fetch for `stream`, superseding any in-flight one.
    ///
    /// `fetch` receives the fetch's cancellation token so nested work (a
    /// fan-out) can stop with it. The fetch is bounded by the coordinator
    /// timeout and its outcome is sent as [`Notification::Synced`].
    pub fn begin<F, Fut>(&mut self, stream: StreamId, fetch: F) -> u64
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<StreamPayload>> + Send + 'static,
    {
        let (generation, token) = self.start(stream);
        let work = fetch(token.clone());
        let timeout = self.timeout;
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(FlowdeckError::Cancelled),
                finished = tokio::time::timeout(timeout, work) => match finished {
                    Ok(outcome) => outcome,
                    Err(_) => Err(FlowdeckError::Timeout {
                        timeout_secs: timeout.as_secs(),
                    }),
                },
            };
            // receiver gone means the dashboard is shutting down
            let _ = tx.send(Notification::Synced(SyncUpdate {
                stream,
                generation,
                outcome,
            }));
        });
        generation
    }

    /// Poll-driven start: a no-op while the stream is already fetching
    pub fn poll<F, Fut>(&mut self, stream: StreamId, fetch: F) -> Option<u64>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<StreamPayload>> + Send + 'static,
    {
        if self.is_fetching(stream) {
            tracing::debug!(stream = ?stream, "Poll tick skipped, fetch in flight");
            return None;
        }
        Some(self.begin(stream, fetch))
    }

    /// User cancel: back to Idle. Advances the generation so a result
    /// already on its way is discarded.
    pub fn cancel(&mut self, stream: StreamId) {
        let slot = self.slot_mut(stream);
        if let Some(token) = slot.cancel.take() {
            token.cancel();
        }
        slot.generation += 1;
        slot.status = StreamStatus::Idle;
    }

    pub fn cancel_all(&mut self) {
        for stream in StreamId::ALL {
            self.cancel(stream);
        }
    }

    /// Fold a finished fetch into the stream state
    pub fn apply(&mut self, update: SyncUpdate) -> Applied {
        let SyncUpdate {
            stream,
            generation,
            outcome,
        } = update;
        let slot = self.slot_mut(stream);

        if generation != slot.generation || !slot.status.is_fetching() {
            tracing::debug!(
                stream = ?stream,
                generation,
                current = slot.generation,
                "Discarding superseded result"
            );
            return Applied::Superseded;
        }
        slot.cancel = None;

        match outcome {
            Ok(payload) => {
                slot.status = if payload.is_empty() {
                    StreamStatus::Empty
                } else {
                    StreamStatus::Ready
                };
                tracing::debug!(stream = ?stream, generation, rows = payload.len(), "Fetch applied");
                Applied::Data(payload)
            }
            Err(e) if e.is_cancelled() => {
                slot.status = StreamStatus::Idle;
                Applied::Cancelled
            }
            Err(e) => {
                tracing::warn!(stream = ?stream, generation, error = %e, "Fetch failed");
                let failure = StreamFailure::from_error(&e);
                slot.status = StreamStatus::Failed(failure.clone());
                Applied::Failed(failure)
            }
        }
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        for slot in self.streams.values_mut() {
            if let Some(token) = slot.cancel.take() {
                token.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::Branch;
    use crate::sync::{channel, FailureKind, NotificationReceiver};

    fn coordinator(timeout: Duration) -> (SyncCoordinator, NotificationReceiver) {
        let (tx, rx) = channel();
        (SyncCoordinator::new(timeout, tx), rx)
    }

    fn branches(names: &[&str]) -> StreamPayload {
        StreamPayload::Branches(
            names
                .iter()
                .map(|n| Branch {
                    name: n.to_string(),
                    protected: false,
                })
                .collect(),
        )
    }

    async fn next_update(rx: &mut NotificationReceiver) -> SyncUpdate {
        match rx.recv().await {
            Some(Notification::Synced(update)) => update,
            other => panic!("expected sync update, got {:?}", other),
        }
    }

    #[test]
    fn test_start_bumps_generation_and_cancels_previous() {
        let (mut c, _rx) = coordinator(Duration::from_secs(30));
        let (g1, t1) = c.start(StreamId::Branches);
        let (g2, t2) = c.start(StreamId::Branches);
        assert_eq!((g1, g2), (1, 2));
        assert!(t1.is_cancelled());
        assert!(!t2.is_cancelled());
        assert!(c.is_fetching(StreamId::Branches));
        assert_eq!(c.generation(StreamId::RunHistory), 0);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let (mut c, _rx) = coordinator(Duration::from_secs(30));
        let (old, _) = c.start(StreamId::Branches);
        let (new, _) = c.start(StreamId::Branches);

        let applied = c.apply(SyncUpdate {
            stream: StreamId::Branches,
            generation: new,
            outcome: Ok(branches(&["b-main"])),
        });
        assert_eq!(applied, Applied::Data(branches(&["b-main"])));

        let late = c.apply(SyncUpdate {
            stream: StreamId::Branches,
            generation: old,
            outcome: Ok(branches(&["a-main"])),
        });
        assert_eq!(late, Applied::Superseded);
        assert_eq!(c.status(StreamId::Branches), &StreamStatus::Ready);
    }

    #[test]
    fn test_same_generation_applies_once() {
        let (mut c, _rx) = coordinator(Duration::from_secs(30));
        let (g, _) = c.start(StreamId::RunHistory);
        let update = || SyncUpdate {
            stream: StreamId::RunHistory,
            generation: g,
            outcome: Ok(StreamPayload::Runs(vec![])),
        };
        assert!(matches!(c.apply(update()), Applied::Data(_)));
        assert_eq!(c.apply(update()), Applied::Superseded);
        assert_eq!(c.status(StreamId::RunHistory), &StreamStatus::Empty);
    }

    #[test]
    fn test_outcome_classification() {
        let (mut c, _rx) = coordinator(Duration::from_secs(30));

        let (g, _) = c.start(StreamId::Repositories);
        let applied = c.apply(SyncUpdate {
            stream: StreamId::Repositories,
            generation: g,
            outcome: Err(FlowdeckError::Cancelled),
        });
        assert_eq!(applied, Applied::Cancelled);
        assert_eq!(c.status(StreamId::Repositories), &StreamStatus::Idle);

        let (g, _) = c.start(StreamId::Repositories);
        c.apply(SyncUpdate {
            stream: StreamId::Repositories,
            generation: g,
            outcome: Err(FlowdeckError::Timeout { timeout_secs: 30 }),
        });
        match c.status(StreamId::Repositories) {
            StreamStatus::Failed(f) => assert_eq!(f.kind, FailureKind::Timeout),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_user_cancel_discards_in_flight_result() {
        let (mut c, _rx) = coordinator(Duration::from_secs(30));
        let (g, token) = c.start(StreamId::Branches);
        c.cancel(StreamId::Branches);
        assert!(token.is_cancelled());
        assert_eq!(c.status(StreamId::Branches), &StreamStatus::Idle);

        let applied = c.apply(SyncUpdate {
            stream: StreamId::Branches,
            generation: g,
            outcome: Ok(branches(&["main"])),
        });
        assert_eq!(applied, Applied::Superseded);
        assert_eq!(c.status(StreamId::Branches), &StreamStatus::Idle);
    }

    #[tokio::test]
    async fn test_begin_reports_through_channel() {
        let (mut c, mut rx) = coordinator(Duration::from_secs(5));
        let g = c.begin(StreamId::Branches, |_| async { Ok(branches(&["main"])) });
        let update = next_update(&mut rx).await;
        assert_eq!(update.generation, g);
        assert!(matches!(c.apply(update), Applied::Data(_)));
    }

    #[tokio::test]
    async fn test_begin_times_out() {
        let (mut c, mut rx) = coordinator(Duration::from_millis(20));
        c.begin(StreamId::RunHistory, |_| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(StreamPayload::Runs(vec![]))
        });
        let update = next_update(&mut rx).await;
        assert!(update.outcome.as_ref().unwrap_err().is_timeout());
        assert!(matches!(c.apply(update), Applied::Failed(_)));
    }

    #[tokio::test]
    async fn test_superseded_task_reports_cancelled() {
        let (mut c, mut rx) = coordinator(Duration::from_secs(5));
        c.begin(StreamId::Branches, |token| async move {
            token.cancelled().await;
            Ok(branches(&["never"]))
        });
        let g2 = c.begin(StreamId::Branches, |_| async { Ok(branches(&["b"])) });

        let mut seen = Vec::new();
        for _ in 0..2 {
            let update = next_update(&mut rx).await;
            seen.push((update.generation, c.apply(update)));
        }
        seen.sort_by_key(|(g, _)| *g);
        assert!(matches!(
            seen[0].1,
            Applied::Superseded | Applied::Cancelled
        ));
        assert_eq!(seen[1], (g2, Applied::Data(branches(&["b"]))));
        assert_eq!(c.status(StreamId::Branches), &StreamStatus::Ready);
    }

    #[tokio::test]
    async fn test_poll_is_noop_while_fetching() {
        let (mut c, _rx) = coordinator(Duration::from_secs(5));
        c.begin(StreamId::RunHistory, |token| async move {
            token.cancelled().await;
            Ok(StreamPayload::Runs(vec![]))
        });
        let before = c.generation(StreamId::RunHistory);
        let polled = c.poll(StreamId::RunHistory, |_| async { Ok(StreamPayload::Runs(vec![])) });
        assert!(polled.is_none());
        assert_eq!(c.generation(StreamId::RunHistory), before);
    }
}
