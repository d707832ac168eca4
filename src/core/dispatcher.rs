// Alert dispatcher - drains the event queue one alert at a time.
//
// Exactly one alert is in flight: the drain loop invokes the handler for the popped event
// and suspends until the handler's completion resolves before popping the next one.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;

use super::completion::{AlertOutcome, Completion};
use super::error::AlertError;
use super::model::{EventKind, NormalizedEvent};
use super::queue::EventQueue;

/// Visual reaction to one event kind.
pub trait AlertHandler: Send + Sync {
    /// Starts displaying the alert. The returned completion resolves when it is gone.
    fn handle(&self, event: &NormalizedEvent) -> Result<Completion, AlertError>;

    /// Called when the completion did not resolve within the dispatcher's timeout.
    fn abort(&self) {}
}

/// Handler lookup by event kind. A kind without an entry is skipped.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<EventKind, Arc<dyn AlertHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: EventKind, handler: Arc<dyn AlertHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn register(&mut self, kind: EventKind, handler: Arc<dyn AlertHandler>) {
        self.handlers.insert(kind, handler);
    }

    pub fn resolve(&self, kind: EventKind) -> Option<Arc<dyn AlertHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Kinds that will produce a visible alert
    pub fn handled_kinds(&self) -> Vec<EventKind> {
        EventKind::all()
            .iter()
            .copied()
            .filter(|kind| self.handlers.contains_key(kind))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchState {
    Idle,
    Draining {
        /// Event currently on screen, `None` between completion and the next pop
        in_flight: Option<NormalizedEvent>,
    },
}

struct Inner {
    queue: EventQueue,
    state: Mutex<DispatchState>,
    handlers: HandlerTable,
    completion_timeout: Option<Duration>,
}

/// Sequential consumer of the event queue. Cheap to clone.
#[derive(Clone)]
pub struct AlertDispatcher {
    inner: Arc<Inner>,
}

impl AlertDispatcher {
    /// `completion_timeout` bounds how long one alert may stay in flight; `None` waits forever.
    pub fn new(queue: EventQueue, handlers: HandlerTable, completion_timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue,
                state: Mutex::new(DispatchState::Idle),
                handlers,
                completion_timeout,
            }),
        }
    }

    /// Wake-up after a push. Starts a drain loop unless one is running or there is nothing
    /// to drain. Must be called from within a tokio runtime.
    ///
    /// Returns true when a new drain loop was spawned.
    pub fn on_queue_activity(&self) -> bool {
        {
            let mut state = self.inner.lock_state();
            if matches!(*state, DispatchState::Draining { .. }) || self.inner.queue.is_empty() {
                return false;
            }
            *state = DispatchState::Draining { in_flight: None };
        }

        tokio::spawn(Arc::clone(&self.inner).drain());
        true
    }

    pub fn state(&self) -> DispatchState {
        self.inner.lock_state().clone()
    }

    pub fn is_idle(&self) -> bool {
        matches!(*self.inner.lock_state(), DispatchState::Idle)
    }

    pub fn queue(&self) -> &EventQueue {
        &self.inner.queue
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn drain(self: Arc<Self>) {
        log::debug!("Drain loop started ({} queued)", self.queue.len());
        while let Some(event) = self.next_event() {
            self.dispatch(&event).await;
            self.clear_in_flight();
        }
        log::debug!("Queue drained, dispatcher idle");
    }

    /// Pops under the state lock so that a push racing with the final empty check is seen
    /// either here or by `on_queue_activity`.
    fn next_event(&self) -> Option<NormalizedEvent> {
        let mut state = self.lock_state();
        match self.queue.pop() {
            Some(event) => {
                *state = DispatchState::Draining {
                    in_flight: Some(event.clone()),
                };
                Some(event)
            }
            None => {
                *state = DispatchState::Idle;
                None
            }
        }
    }

    fn clear_in_flight(&self) {
        if let DispatchState::Draining { in_flight } = &mut *self.lock_state() {
            *in_flight = None;
        }
    }

    async fn dispatch(&self, event: &NormalizedEvent) {
        let Some(handler) = self.handlers.resolve(event.kind) else {
            log::debug!("No handler for {} event, skipping", event.kind);
            return;
        };

        let waited_ms = (Utc::now() - event.received_at).num_milliseconds();
        log::info!(
            "Dispatching {} alert for {} (queued {}ms)",
            event.kind,
            event.display_name().unwrap_or("<unnamed>"),
            waited_ms
        );

        let completion = match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
            Ok(Ok(completion)) => completion,
            Ok(Err(e)) => {
                log::warn!("{} alert failed, moving on: {}", event.kind, e);
                return;
            }
            Err(_) => {
                log::warn!("{} alert handler panicked, moving on", event.kind);
                return;
            }
        };

        let outcome = match self.completion_timeout {
            Some(limit) => match tokio::time::timeout(limit, completion.wait()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    log::warn!(
                        "{} alert did not complete within {}s, dismissing",
                        event.kind,
                        limit.as_secs_f32()
                    );
                    handler.abort();
                    return;
                }
            },
            None => completion.wait().await,
        };

        match outcome {
            Some(AlertOutcome::Finished) => log::debug!("{} alert finished", event.kind),
            Some(other) => log::info!("{} alert ended early: {:?}", event.kind, other),
            None => log::warn!("{} alert abandoned its completion signal", event.kind),
        }
    }
}
