// One-shot completion channel between a visual handler and the dispatcher.
//
// The signal side is consumed on fire, so an episode can resolve at most once.

use tokio::sync::oneshot;

/// How a displayed alert ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// The one-shot animation played to its end
    Finished,
    /// A newer badge forcibly replaced this one
    Replaced,
    /// Torn down on request (e.g. completion timeout)
    Dismissed,
}

/// Sender half, held by whoever owns the visual.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: oneshot::Sender<AlertOutcome>,
}

/// Receiver half, awaited by the dispatcher.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<AlertOutcome>,
}

pub fn completion_pair() -> (CompletionSignal, Completion) {
    let (tx, rx) = oneshot::channel();
    (CompletionSignal { tx }, Completion { rx })
}

impl CompletionSignal {
    pub fn fire(self, outcome: AlertOutcome) {
        // Receiver gone means nobody is waiting any more.
        let _ = self.tx.send(outcome);
    }
}

impl Completion {
    /// An already-resolved completion, for handlers with nothing to wait on.
    pub fn ready(outcome: AlertOutcome) -> Self {
        let (signal, completion) = completion_pair();
        signal.fire(outcome);
        completion
    }

    /// Waits for the outcome. `None` when the signal was dropped without firing.
    pub async fn wait(self) -> Option<AlertOutcome> {
        self.rx.await.ok()
    }

    /// Non-blocking check, `None` while still pending or if abandoned.
    pub fn try_outcome(&mut self) -> Option<AlertOutcome> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fire_resolves_wait() {
        let (signal, completion) = completion_pair();
        signal.fire(AlertOutcome::Finished);
        assert_eq!(completion.wait().await, Some(AlertOutcome::Finished));
    }

    #[tokio::test]
    async fn test_dropped_signal_resolves_none() {
        let (signal, completion) = completion_pair();
        drop(signal);
        assert_eq!(completion.wait().await, None);
    }

    #[test]
    fn test_try_outcome_pending_then_ready() {
        let (signal, mut completion) = completion_pair();
        assert_eq!(completion.try_outcome(), None);
        signal.fire(AlertOutcome::Dismissed);
        assert_eq!(completion.try_outcome(), Some(AlertOutcome::Dismissed));
    }

    #[tokio::test]
    async fn test_ready_completion() {
        assert_eq!(
            Completion::ready(AlertOutcome::Finished).wait().await,
            Some(AlertOutcome::Finished)
        );
    }
}
