//! In-memory broker adapter for deterministic lifecycle tests.

use crate::tracking::{
    domain::{LifecycleEvent, LifecycleNotification, TaskId, TaskState},
    ports::{BrokerError, BrokerResult, PendingResult, TaskBroker, TaskSpec},
    services::LifecycleDispatcher,
};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

/// In-memory broker that stands in for a queue and worker pool.
///
/// Nothing executes on its own: tests drive a task through its lifecycle
/// with [`start`](Self::start), [`report`](Self::report) and friends, and
/// every step is published into the shared [`LifecycleDispatcher`] the way
/// a real broker integration would.
pub struct InMemoryBroker<C>
where
    C: Clock + Send + Sync,
{
    dispatcher: Arc<LifecycleDispatcher>,
    clock: Arc<C>,
    state: Arc<RwLock<InMemoryBrokerState>>,
}

#[derive(Debug, Default)]
struct InMemoryBrokerState {
    results: HashMap<TaskId, TaskState>,
    submissions: Vec<(TaskId, TaskSpec)>,
    forgotten: Vec<TaskId>,
    offline: bool,
}

impl<C> std::fmt::Debug for InMemoryBroker<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBroker")
            .field("dispatcher", &self.dispatcher)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<C> InMemoryBroker<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a broker that publishes into `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Arc<LifecycleDispatcher>, clock: Arc<C>) -> Self {
        Self {
            dispatcher,
            clock,
            state: Arc::new(RwLock::new(InMemoryBrokerState::default())),
        }
    }

    /// Returns the dispatcher the broker publishes into.
    #[must_use]
    pub fn dispatcher(&self) -> &LifecycleDispatcher {
        &self.dispatcher
    }

    /// Makes every subsequent broker call fail as unavailable, or restores
    /// service.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Unavailable`] when the lock is poisoned.
    pub fn set_offline(&self, offline: bool) -> BrokerResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.offline = offline;
        Ok(())
    }

    /// Returns the submitted task ids in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Unavailable`] when the lock is poisoned.
    pub fn submissions(&self) -> BrokerResult<Vec<TaskId>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .submissions
            .iter()
            .map(|(task_id, _)| task_id.clone())
            .collect())
    }

    /// Returns the task ids whose results were forgotten, in call order.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Unavailable`] when the lock is poisoned.
    pub fn forgotten(&self) -> BrokerResult<Vec<TaskId>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.forgotten.clone())
    }

    /// Simulates a worker picking the task up.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Unavailable`] when the broker is offline.
    pub async fn start(&self, task_id: &TaskId) -> BrokerResult<()> {
        self.record_result(task_id, TaskState::Started)?;
        self.publish(task_id, LifecycleNotification::Started).await;
        Ok(())
    }

    /// Simulates the worker reporting an outcome code.
    ///
    /// Unrecognised codes are still published, leaving the broker-side
    /// state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Unavailable`] when the broker is offline.
    pub async fn report(&self, task_id: &TaskId, outcome: &str) -> BrokerResult<()> {
        match TaskState::lookup(outcome) {
            Ok(state) => self.record_result(task_id, state)?,
            Err(_) => self.ensure_online()?,
        }
        let notification = LifecycleNotification::OutcomeReported {
            outcome: outcome.to_owned(),
        };
        self.publish(task_id, notification).await;
        Ok(())
    }

    /// Simulates a successful run.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Unavailable`] when the broker is offline.
    pub async fn succeed(&self, task_id: &TaskId) -> BrokerResult<()> {
        self.report(task_id, TaskState::Success.as_str()).await
    }

    /// Simulates the worker refusing the task.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Unavailable`] when the broker is offline.
    pub async fn reject(&self, task_id: &TaskId) -> BrokerResult<()> {
        self.report(task_id, TaskState::Rejected.as_str()).await
    }

    /// Simulates the task body raising an unrecoverable error.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Unavailable`] when the broker is offline.
    pub async fn fail(&self, task_id: &TaskId, reason: Option<&str>) -> BrokerResult<()> {
        self.record_result(task_id, TaskState::Failure)?;
        let notification = LifecycleNotification::Failed {
            reason: reason.map(str::to_owned),
        };
        self.publish(task_id, notification).await;
        Ok(())
    }

    /// Delivers a prebuilt event unchanged, for replaying late or
    /// duplicated notifications.
    pub async fn deliver(&self, event: &LifecycleEvent) {
        self.dispatcher.dispatch(event).await;
    }

    fn writable(&self) -> BrokerResult<RwLockWriteGuard<'_, InMemoryBrokerState>> {
        let state = self.state.write().map_err(poisoned)?;
        if state.offline {
            return Err(offline());
        }
        Ok(state)
    }

    fn ensure_online(&self) -> BrokerResult<()> {
        let state = self.state.read().map_err(poisoned)?;
        if state.offline {
            return Err(offline());
        }
        Ok(())
    }

    fn record_result(&self, task_id: &TaskId, result: TaskState) -> BrokerResult<()> {
        let mut state = self.writable()?;
        state.results.insert(task_id.clone(), result);
        Ok(())
    }

    async fn publish(&self, task_id: &TaskId, notification: LifecycleNotification) {
        let event = LifecycleEvent::now(task_id.clone(), notification, &*self.clock);
        self.dispatcher.dispatch(&event).await;
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> BrokerError {
    BrokerError::unavailable(std::io::Error::other(err.to_string()))
}

fn offline() -> BrokerError {
    BrokerError::unavailable(std::io::Error::other("broker is offline"))
}

#[async_trait]
impl<C> TaskBroker for InMemoryBroker<C>
where
    C: Clock + Send + Sync,
{
    async fn submit(&self, spec: &TaskSpec, task_id: &TaskId) -> BrokerResult<PendingResult> {
        {
            let mut state = self.writable()?;
            state.results.insert(task_id.clone(), TaskState::Pending);
            state.submissions.push((task_id.clone(), spec.clone()));
        }
        self.publish(task_id, LifecycleNotification::Submitted).await;
        Ok(PendingResult::new(task_id.clone()))
    }

    async fn result_state(&self, task_id: &TaskId) -> BrokerResult<TaskState> {
        let state = self.state.read().map_err(poisoned)?;
        if state.offline {
            return Err(offline());
        }
        Ok(state
            .results
            .get(task_id)
            .copied()
            .unwrap_or(TaskState::Pending))
    }

    async fn forget(&self, task_id: &TaskId) -> BrokerResult<()> {
        let mut state = self.writable()?;
        state.results.remove(task_id);
        state.forgotten.push(task_id.clone());
        Ok(())
    }

    async fn revoke(&self, task_id: &TaskId) -> BrokerResult<()> {
        {
            let mut state = self.writable()?;
            state.results.remove(task_id);
        }
        self.publish(task_id, LifecycleNotification::Revoked).await;
        Ok(())
    }
}
