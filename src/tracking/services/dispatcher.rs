//! Lifecycle event dispatcher.
//!
//! The broker integration owns a shared [`LifecycleDispatcher`] and calls
//! [`LifecycleDispatcher::dispatch`] for every notification. Handlers are
//! registered explicitly per [`LifecycleEventKind`]; nothing is wired up
//! through process-wide hooks.

use super::DispatcherConfig;
use crate::tracking::{
    domain::{
        LifecycleEvent, LifecycleEventKind, LifecycleNotification, TaskState,
        UnknownLifecycleState,
    },
    ports::{StateUpdate, TaskRecordRepository, TaskRecordRepositoryError},
};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while applying a lifecycle event.
///
/// These never reach the broker: the dispatcher logs them and drops the
/// event once retries are exhausted.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The event carried an outcome code that names no state.
    #[error(transparent)]
    UnknownLifecycleState(#[from] UnknownLifecycleState),

    /// The store rejected or failed the update.
    #[error(transparent)]
    Repository(#[from] TaskRecordRepositoryError),
}

impl DispatchError {
    /// Returns `true` when running the handler again may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Repository(TaskRecordRepositoryError::Persistence(_))
        )
    }
}

/// Handler invoked for lifecycle events of the kinds it is registered
/// against.
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// Applies the event.
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), DispatchError>;
}

struct RegisteredHandler {
    name: String,
    handler: Arc<dyn LifecycleHandler>,
}

/// Routes lifecycle events to registered handlers.
///
/// Dispatch is fire-and-forget: failures are logged through `tracing` and
/// never returned to the caller, so a broken store cannot disrupt the
/// broker's delivery path.
pub struct LifecycleDispatcher {
    handlers: HashMap<LifecycleEventKind, Vec<RegisteredHandler>>,
    config: DispatcherConfig,
}

impl std::fmt::Debug for LifecycleDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: HashMap<_, Vec<_>> = self
            .handlers
            .iter()
            .map(|(kind, handlers)| {
                (
                    *kind,
                    handlers.iter().map(|entry| entry.name.as_str()).collect(),
                )
            })
            .collect();
        f.debug_struct("LifecycleDispatcher")
            .field("handlers", &names)
            .field("config", &self.config)
            .finish()
    }
}

impl LifecycleDispatcher {
    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            handlers: HashMap::new(),
            config,
        }
    }

    /// Creates a dispatcher with the task-record handler registered for
    /// every lifecycle event kind.
    #[must_use]
    pub fn tracking<R, C>(repository: Arc<R>, clock: Arc<C>, config: DispatcherConfig) -> Self
    where
        R: TaskRecordRepository + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let reject_stale_events = config.reject_stale_events;
        let mut dispatcher = Self::new(config);
        let handler: Arc<dyn LifecycleHandler> = Arc::new(TaskRecordStateHandler::new(
            repository,
            clock,
            reject_stale_events,
        ));
        for kind in LifecycleEventKind::ALL {
            dispatcher.register(kind, format!("task_records.{kind}"), Arc::clone(&handler));
        }
        dispatcher
    }

    /// Registers a handler for one event kind.
    ///
    /// Handlers run in registration order.
    pub fn register(
        &mut self,
        kind: LifecycleEventKind,
        name: impl Into<String>,
        handler: Arc<dyn LifecycleHandler>,
    ) {
        self.handlers.entry(kind).or_default().push(RegisteredHandler {
            name: name.into(),
            handler,
        });
    }

    /// Returns the number of handlers registered for `kind`.
    #[must_use]
    pub fn handler_count(&self, kind: LifecycleEventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Returns the dispatcher configuration.
    #[must_use]
    pub const fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Applies an event through every handler registered for its kind.
    pub async fn dispatch(&self, event: &LifecycleEvent) {
        let Some(handlers) = self.handlers.get(&event.kind()) else {
            tracing::debug!(
                task_id = %event.task_id(),
                kind = %event.kind(),
                "no lifecycle handler registered"
            );
            return;
        };

        for entry in handlers {
            self.run_handler(entry, event).await;
        }
    }

    async fn run_handler(&self, entry: &RegisteredHandler, event: &LifecycleEvent) {
        let attempts = self.config.apply_attempts.get();
        let mut attempt = 1;
        loop {
            let Err(err) = entry.handler.handle(event).await else {
                return;
            };

            if !err.is_retryable() {
                tracing::warn!(
                    handler = %entry.name,
                    task_id = %event.task_id(),
                    kind = %event.kind(),
                    error = %err,
                    "dropping lifecycle event"
                );
                return;
            }

            if attempt >= attempts {
                tracing::error!(
                    handler = %entry.name,
                    task_id = %event.task_id(),
                    kind = %event.kind(),
                    attempts,
                    error = %err,
                    "lifecycle event not applied, giving up"
                );
                return;
            }

            tracing::warn!(
                handler = %entry.name,
                task_id = %event.task_id(),
                kind = %event.kind(),
                attempt,
                error = %err,
                "retrying lifecycle event"
            );
            attempt += 1;
            if !self.config.retry_backoff.is_zero() {
                tokio::time::sleep(self.config.retry_backoff).await;
            }
        }
    }
}

/// Built-in handler that mirrors lifecycle events into task records.
///
/// Every state-bearing event is a single bulk update scoped by task id, so
/// all owners of a task observe the same state. Revocation deletes the
/// records outright.
pub struct TaskRecordStateHandler<R, C>
where
    R: TaskRecordRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    reject_stale_events: bool,
}

impl<R, C> TaskRecordStateHandler<R, C>
where
    R: TaskRecordRepository,
    C: Clock + Send + Sync,
{
    /// Creates the handler.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, reject_stale_events: bool) -> Self {
        Self {
            repository,
            clock,
            reject_stale_events,
        }
    }

    fn state_update(&self, event: &LifecycleEvent, state: TaskState) -> StateUpdate {
        let task_id = event.task_id().clone();
        if self.reject_stale_events {
            StateUpdate::ordered(task_id, state, event.occurred_at())
        } else {
            StateUpdate::unconditional(task_id, state, self.clock.utc())
        }
    }
}

/// Maps a state-bearing notification to the state it sets.
///
/// Returns `Ok(None)` for revocation, which bypasses the state machine.
///
/// # Errors
///
/// Returns [`UnknownLifecycleState`] when a reported outcome names no
/// state.
pub fn target_state(
    notification: &LifecycleNotification,
) -> Result<Option<TaskState>, UnknownLifecycleState> {
    match notification {
        LifecycleNotification::Submitted => Ok(Some(TaskState::Pending)),
        LifecycleNotification::Started => Ok(Some(TaskState::Started)),
        LifecycleNotification::OutcomeReported { outcome } => {
            TaskState::lookup(outcome).map(Some)
        }
        LifecycleNotification::Failed { .. } => Ok(Some(TaskState::Failure)),
        LifecycleNotification::Revoked => Ok(None),
    }
}

#[async_trait]
impl<R, C> LifecycleHandler for TaskRecordStateHandler<R, C>
where
    R: TaskRecordRepository,
    C: Clock + Send + Sync,
{
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), DispatchError> {
        match target_state(event.notification())? {
            Some(state) => {
                let update = self.state_update(event, state);
                let affected = self.repository.update_state(&update).await?;
                tracing::debug!(
                    task_id = %event.task_id(),
                    state = %state,
                    affected,
                    "applied lifecycle state"
                );
            }
            None => {
                let removed = self.repository.delete_by_task_id(event.task_id()).await?;
                tracing::debug!(
                    task_id = %event.task_id(),
                    removed,
                    "purged records of revoked task"
                );
            }
        }
        Ok(())
    }
}
