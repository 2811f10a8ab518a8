//! Polling of running actions until they reach a terminal status.
//!
//! Every waited action gets its own poller. The pollers run concurrently on the calling
//! task and share one [`CancellationToken`]. The first error from any poller ends the wait
//! and drops the remaining pollers, so no request is issued after the wait returns.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use hcloud_core::id::ActionId;
use hcloud_core::{Error, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::{Action, ActionStatus};

/// Source of fresh action snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActionFetcher: Send + Sync {
    /// Fetch the current state of an action.
    async fn fetch_action(&self, id: ActionId) -> Result<Action>;
}

/// Receivers returned by the progress watchers.
///
/// `progress` yields percentages and closes when the watch ends. `errors` yields at most one
/// error, sent after `progress` has closed, and then closes too.
pub type ProgressReceivers = (mpsc::UnboundedReceiver<u8>, mpsc::UnboundedReceiver<Error>);

/// Waits on actions by polling an [`ActionFetcher`] at a fixed interval.
#[derive(Debug, Clone)]
pub struct ActionWaiter<F> {
    fetcher: F,
    poll_interval: Duration,
}

impl<F: ActionFetcher> ActionWaiter<F> {
    /// Create a waiter polling `fetcher` every `poll_interval`.
    #[must_use]
    pub const fn new(fetcher: F, poll_interval: Duration) -> Self {
        Self {
            fetcher,
            poll_interval,
        }
    }

    /// Return the poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait until every action succeeds.
    ///
    /// `actions` is updated in place with the latest observed snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionFailed`] for the first action that finishes with status
    /// `error`, [`Error::Cancelled`] if `cancel` fires, or the first fetch error.
    pub async fn wait_for(&self, cancel: &CancellationToken, actions: &mut [Action]) -> Result<()> {
        self.wait_for_func(cancel, actions, |action| match action.error() {
            Some(err) => Err(err),
            None => Ok(()),
        })
        .await
    }

    /// Wait until a single action succeeds.
    ///
    /// # Errors
    ///
    /// Same as [`ActionWaiter::wait_for`].
    pub async fn wait_for_one(&self, cancel: &CancellationToken, action: &mut Action) -> Result<()> {
        self.wait_for(cancel, std::slice::from_mut(action)).await
    }

    /// Wait until every action reaches a terminal status, reporting changes to `handle`.
    ///
    /// `handle` runs once for every action that is already terminal, and afterwards for
    /// every poll that changes an action's status or progress. It may run concurrently for
    /// different actions. An error returned from `handle` aborts the wait with that error.
    /// Failed actions are not errors unless `handle` says so.
    ///
    /// # Errors
    ///
    /// Returns the first error from `handle` or a fetch, or [`Error::Cancelled`].
    pub async fn wait_for_func<H>(
        &self,
        cancel: &CancellationToken,
        actions: &mut [Action],
        handle: H,
    ) -> Result<()>
    where
        H: Fn(&Action) -> Result<()> + Sync,
    {
        let handle = &handle;
        let mut pollers: FuturesUnordered<_> = actions
            .iter_mut()
            .map(|action| self.poll_until_done(cancel, action, handle))
            .collect();

        while let Some(result) = pollers.next().await {
            if let Err(err) = result {
                debug!(error = %err, pending = pollers.len(), "aborting action wait");
                return Err(err);
            }
        }
        Ok(())
    }

    async fn poll_until_done<H>(
        &self,
        cancel: &CancellationToken,
        action: &mut Action,
        handle: &H,
    ) -> Result<()>
    where
        H: Fn(&Action) -> Result<()> + Sync,
    {
        if !action.is_running() {
            return handle(action);
        }

        let id = action.id;
        loop {
            let mut update = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(id)),
                update = self.fetcher.fetch_action(id) => update?,
            };
            debug!(
                action = %id,
                status = %update.status,
                progress = update.progress,
                "polled action"
            );

            if update.status == ActionStatus::Running && update.progress < action.progress {
                update.progress = action.progress;
            }
            let changed = update.status != action.status || update.progress != action.progress;
            *action = update;

            if changed {
                handle(action)?;
            }
            if !action.is_running() {
                return Ok(());
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(id)),
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

impl<F> ActionWaiter<F>
where
    F: ActionFetcher + Clone + 'static,
{
    /// Watch the progress of a single action.
    ///
    /// Yields the action's raw progress whenever it increases.
    #[must_use]
    pub fn watch_progress(&self, cancel: &CancellationToken, action: Action) -> ProgressReceivers {
        self.watch_overall_progress(cancel, vec![action])
    }

    /// Watch the combined progress of several actions.
    ///
    /// Yields the floor of the mean progress whenever it increases, counting finished
    /// actions as 100. Nothing is sent for an empty input. A failed action ends the watch
    /// and its error is delivered on the error receiver. Dropping both receivers stops
    /// the polling.
    #[must_use]
    pub fn watch_overall_progress(
        &self,
        cancel: &CancellationToken,
        actions: Vec<Action>,
    ) -> ProgressReceivers {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let waiter = self.clone();
        let cancel = cancel.clone();

        tokio::spawn(async move {
            let mut actions = actions;
            let tracker = Mutex::new(OverallProgress::new(&actions));

            let wait = waiter.wait_for_func(&cancel, &mut actions, |action| {
                if let Some(err) = action.error() {
                    return Err(err);
                }
                let value = tracker
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .update(action);
                if let Some(value) = value {
                    let _ = progress_tx.send(value);
                }
                Ok(())
            });

            let result = tokio::select! {
                result = wait => result,
                _ = async { tokio::join!(progress_tx.closed(), error_tx.closed()) } => {
                    debug!("progress receivers dropped, stopping watch");
                    return;
                }
            };

            drop(progress_tx);
            if let Err(err) = result {
                let _ = error_tx.send(err);
            }
        });

        (progress_rx, error_rx)
    }
}

fn cancelled(id: ActionId) -> Error {
    debug!(action = %id, "action wait cancelled");
    Error::Cancelled(format!("stopped waiting for action {id}"))
}

/// Running mean over the latest progress of each action.
#[derive(Debug)]
struct OverallProgress {
    progress: HashMap<ActionId, u8>,
    last_emitted: Option<u8>,
}

impl OverallProgress {
    fn new(actions: &[Action]) -> Self {
        Self {
            progress: actions
                .iter()
                .map(|action| (action.id, action.progress))
                .collect(),
            last_emitted: None,
        }
    }

    /// Record a snapshot; returns the new mean if it should be emitted.
    fn update(&mut self, action: &Action) -> Option<u8> {
        let value = match action.status {
            ActionStatus::Success => 100,
            _ => action.progress,
        };
        self.progress.insert(action.id, value);

        let count = u32::try_from(self.progress.len()).ok().filter(|&n| n > 0)?;
        let total: u32 = self.progress.values().copied().map(u32::from).sum();
        let mean = u8::try_from((total / count).min(100)).ok()?;

        match self.last_emitted {
            Some(last) if mean <= last => None,
            _ => {
                self.last_emitted = Some(mean);
                Some(mean)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    const POLL: Duration = Duration::from_millis(500);

    fn action(id: i64, status: ActionStatus, progress: u8) -> Action {
        Action {
            id: ActionId::new(id),
            status,
            command: "test".to_string(),
            progress,
            started: chrono::DateTime::default(),
            finished: None,
            error_code: String::new(),
            error_message: String::new(),
            resources: Vec::new(),
        }
    }

    fn running(id: i64, progress: u8) -> Action {
        action(id, ActionStatus::Running, progress)
    }

    fn success(id: i64) -> Action {
        action(id, ActionStatus::Success, 100)
    }

    fn failed(id: i64, code: &str, message: &str) -> Action {
        Action {
            error_code: code.to_string(),
            error_message: message.to_string(),
            ..action(id, ActionStatus::Error, 30)
        }
    }

    /// Replays a scripted sequence of snapshots per action; the last one repeats.
    #[derive(Clone, Default)]
    struct ScriptedFetcher {
        scripts: Arc<Mutex<HashMap<ActionId, VecDeque<Action>>>>,
        calls: Arc<Mutex<HashMap<ActionId, usize>>>,
    }

    impl ScriptedFetcher {
        fn script(self, snapshots: Vec<Action>) -> Self {
            {
                let mut scripts = self.scripts.lock().unwrap();
                for snapshot in snapshots {
                    scripts.entry(snapshot.id).or_default().push_back(snapshot);
                }
            }
            self
        }

        fn calls(&self, id: i64) -> usize {
            self.calls
                .lock()
                .unwrap()
                .get(&ActionId::new(id))
                .copied()
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl ActionFetcher for ScriptedFetcher {
        async fn fetch_action(&self, id: ActionId) -> Result<Action> {
            *self.calls.lock().unwrap().entry(id).or_default() += 1;
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts
                .get_mut(&id)
                .ok_or_else(|| Error::ActionsNotFound(vec![id.get()]))?;
            if script.len() > 1 {
                Ok(script.pop_front().unwrap())
            } else {
                Ok(script.front().unwrap().clone())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_success() {
        let mut fetcher = MockActionFetcher::new();
        let mut seq = mockall::Sequence::new();
        fetcher
            .expect_fetch_action()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|id| Ok(running(id.get(), 50)));
        fetcher
            .expect_fetch_action()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id| Ok(success(id.get())));

        let waiter = ActionWaiter::new(fetcher, POLL);
        let mut action = running(1, 0);
        let start = Instant::now();

        waiter
            .wait_for_one(&CancellationToken::new(), &mut action)
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1100));
        assert_eq!(action.status, ActionStatus::Success);
        assert_eq!(action.progress, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling() {
        let mut fetcher = MockActionFetcher::new();
        fetcher
            .expect_fetch_action()
            .times(1)
            .returning(|id| Ok(running(id.get(), 10)));

        let waiter = ActionWaiter::new(fetcher, POLL);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let mut action = running(1, 0);
        let err = waiter.wait_for_one(&cancel, &mut action).await.unwrap_err();

        assert!(err.is_cancelled());
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_fails_before_polling() {
        let mut fetcher = MockActionFetcher::new();
        fetcher.expect_fetch_action().never();

        let waiter = ActionWaiter::new(fetcher, POLL);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut action = running(1, 0);
        let err = waiter.wait_for_one(&cancel, &mut action).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_action_aborts_siblings() {
        let fetcher = ScriptedFetcher::default().script(vec![
            running(1, 10),
            running(1, 20),
            success(1),
            running(2, 10),
            running(2, 20),
            success(2),
            failed(3, "x", "y"),
        ]);
        let waiter = ActionWaiter::new(fetcher.clone(), POLL);
        let mut actions = vec![running(1, 0), running(2, 0), running(3, 0)];

        let err = waiter
            .wait_for(&CancellationToken::new(), &mut actions)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            Error::ActionFailed {
                id: 3,
                code: "x".to_string(),
                message: "y".to_string(),
            }
        );
        assert!(actions[0].is_running());
        assert!(actions[1].is_running());
        assert_eq!(actions[2].status, ActionStatus::Error);

        // No further polling happens once the wait has returned.
        let before = fetcher.calls(1) + fetcher.calls(2);
        tokio::time::sleep(POLL * 4).await;
        assert_eq!(fetcher.calls(1) + fetcher.calls(2), before);
        assert!(fetcher.calls(1) <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_all_actions() {
        let fetcher = ScriptedFetcher::default().script(vec![
            running(1, 50),
            success(1),
            running(2, 10),
            running(2, 60),
            success(2),
        ]);
        let waiter = ActionWaiter::new(fetcher.clone(), POLL);
        let mut actions = vec![running(1, 0), running(2, 0)];

        waiter
            .wait_for(&CancellationToken::new(), &mut actions)
            .await
            .unwrap();

        assert!(actions.iter().all(|a| a.status == ActionStatus::Success));
        assert_eq!(fetcher.calls(1), 2);
        assert_eq!(fetcher.calls(2), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_actions_are_not_polled() {
        let mut fetcher = MockActionFetcher::new();
        fetcher.expect_fetch_action().never();
        let waiter = ActionWaiter::new(fetcher, POLL);

        let seen = AtomicUsize::new(0);
        let mut actions = vec![success(1), failed(2, "x", "y")];
        waiter
            .wait_for_func(&CancellationToken::new(), &mut actions, |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn already_failed_action_fails_wait() {
        let mut fetcher = MockActionFetcher::new();
        fetcher.expect_fetch_action().never();
        let waiter = ActionWaiter::new(fetcher, POLL);

        let mut actions = vec![failed(2, "locked", "resource is locked")];
        let err = waiter
            .wait_for(&CancellationToken::new(), &mut actions)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "locked");
    }

    #[tokio::test(start_paused = true)]
    async fn handler_sees_only_changes() {
        let fetcher = ScriptedFetcher::default().script(vec![
            running(1, 0),
            running(1, 40),
            running(1, 40),
            running(1, 30),
            success(1),
        ]);
        let waiter = ActionWaiter::new(fetcher, POLL);
        let seen = Mutex::new(Vec::new());

        let mut actions = vec![running(1, 0)];
        waiter
            .wait_for_func(&CancellationToken::new(), &mut actions, |action| {
                seen.lock().unwrap().push((action.status, action.progress));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(
            seen.into_inner().unwrap(),
            vec![
                (ActionStatus::Running, 40),
                (ActionStatus::Success, 100)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn handler_error_aborts_wait() {
        let fetcher = ScriptedFetcher::default().script(vec![running(1, 20), success(1)]);
        let waiter = ActionWaiter::new(fetcher.clone(), POLL);

        let mut actions = vec![running(1, 0)];
        let err = waiter
            .wait_for_func(&CancellationToken::new(), &mut actions, |_| {
                Err(Error::InvalidRequest("stop".to_string()))
            })
            .await
            .unwrap_err();

        assert_eq!(err, Error::InvalidRequest("stop".to_string()));
        assert_eq!(fetcher.calls(1), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_func_tolerates_failed_actions() {
        let fetcher = ScriptedFetcher::default().script(vec![failed(1, "x", "y")]);
        let waiter = ActionWaiter::new(fetcher, POLL);

        let mut actions = vec![running(1, 0)];
        waiter
            .wait_for_func(&CancellationToken::new(), &mut actions, |_| Ok(()))
            .await
            .unwrap();
        assert_eq!(actions[0].error_code, "x");
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_errors_end_the_wait() {
        let fetcher = ScriptedFetcher::default();
        let waiter = ActionWaiter::new(fetcher, POLL);

        let mut actions = vec![running(9, 0)];
        let err = waiter
            .wait_for(&CancellationToken::new(), &mut actions)
            .await
            .unwrap_err();
        assert_eq!(err, Error::ActionsNotFound(vec![9]));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_completes_immediately() {
        let mut fetcher = MockActionFetcher::new();
        fetcher.expect_fetch_action().never();
        let waiter = ActionWaiter::new(fetcher, POLL);
        waiter
            .wait_for(&CancellationToken::new(), &mut [])
            .await
            .unwrap();
    }

    async fn collect(mut receivers: ProgressReceivers) -> (Vec<u8>, Option<Error>) {
        let mut values = Vec::new();
        while let Some(value) = receivers.0.recv().await {
            values.push(value);
        }
        (values, receivers.1.recv().await)
    }

    #[tokio::test(start_paused = true)]
    async fn overall_progress_is_mean_of_actions() {
        let fetcher = ScriptedFetcher::default().script(vec![
            running(1, 0),
            success(1),
            running(2, 50),
            running(2, 50),
            success(2),
        ]);
        let waiter = ActionWaiter::new(fetcher, POLL);

        let receivers = waiter.watch_overall_progress(
            &CancellationToken::new(),
            vec![running(1, 0), running(2, 0)],
        );
        let (values, error) = collect(receivers).await;

        assert_eq!(values, vec![25, 75, 100]);
        assert!(error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn overall_progress_reports_failure_after_closing() {
        let fetcher = ScriptedFetcher::default().script(vec![
            running(1, 50),
            failed(1, "x", "y"),
            running(2, 50),
        ]);
        let waiter = ActionWaiter::new(fetcher, POLL);

        let receivers = waiter.watch_overall_progress(
            &CancellationToken::new(),
            vec![running(1, 0), running(2, 0)],
        );
        let (values, error) = collect(receivers).await;

        assert_eq!(values.last(), Some(&50));
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(error.map(|e| e.error_code().to_string()), Some("x".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn overall_progress_of_nothing_closes_silently() {
        let fetcher = ScriptedFetcher::default();
        let waiter = ActionWaiter::new(fetcher, POLL);

        let receivers = waiter.watch_overall_progress(&CancellationToken::new(), Vec::new());
        let (values, error) = collect(receivers).await;
        assert!(values.is_empty());
        assert!(error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn single_progress_yields_raw_values() {
        let fetcher = ScriptedFetcher::default().script(vec![
            running(1, 10),
            running(1, 55),
            success(1),
        ]);
        let waiter = ActionWaiter::new(fetcher, POLL);

        let receivers = waiter.watch_progress(&CancellationToken::new(), running(1, 0));
        let (values, error) = collect(receivers).await;
        assert_eq!(values, vec![10, 55, 100]);
        assert!(error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn progress_watch_reports_cancellation() {
        let fetcher = ScriptedFetcher::default().script(vec![running(1, 10)]);
        let waiter = ActionWaiter::new(fetcher, POLL);
        let cancel = CancellationToken::new();

        let receivers = waiter.watch_progress(&cancel, running(1, 0));
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1200)).await;
            trigger.cancel();
        });

        let (values, error) = collect(receivers).await;
        assert_eq!(values, vec![10]);
        assert!(error.is_some_and(|e| e.is_cancelled()));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_receivers_stops_polling() {
        let fetcher = ScriptedFetcher::default().script(vec![running(1, 10)]);
        let waiter = ActionWaiter::new(fetcher.clone(), POLL);

        let receivers = waiter.watch_progress(&CancellationToken::new(), running(1, 0));
        tokio::time::sleep(Duration::from_millis(1200)).await;
        let polled = fetcher.calls(1);
        assert!(polled >= 2);

        drop(receivers);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fetcher.calls(1), polled);
    }

    #[test]
    fn overall_progress_floors_the_mean() {
        let actions = vec![running(1, 0), running(2, 0), running(3, 0)];
        let mut tracker = OverallProgress::new(&actions);
        assert_eq!(tracker.update(&running(1, 50)), Some(16));
        assert_eq!(tracker.update(&running(1, 50)), None);
        assert_eq!(tracker.update(&success(2)), Some(50));
    }
}
