use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::model::NormalizedEvent;

/// FIFO buffer between the source adapter (producer) and the dispatcher (consumer).
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct EventQueue {
    events: Arc<Mutex<VecDeque<NormalizedEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the tail. Callers must notify the dispatcher afterwards.
    pub fn push(&self, event: NormalizedEvent) {
        self.lock().push_back(event);
    }

    /// Removes the oldest event, never waits.
    pub fn pop(&self) -> Option<NormalizedEvent> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<NormalizedEvent>> {
        // push/pop never leave the deque half-mutated, so poisoning is ignored
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::EventKind;
    use serde_json::json;
    use std::thread;

    fn named(kind: EventKind, name: &str) -> NormalizedEvent {
        NormalizedEvent::new(kind, json!({ "event": { "name": name } }))
    }

    #[test]
    fn test_pop_returns_oldest_first() {
        let queue = EventQueue::new();
        queue.push(named(EventKind::Follow, "first"));
        queue.push(named(EventKind::Subscriber, "second"));
        queue.push(named(EventKind::Follow, "third"));

        let names: Vec<String> = std::iter::from_fn(|| queue.pop())
            .map(|e| e.display_name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_on_empty_returns_none() {
        let queue = EventQueue::new();
        assert!(queue.pop().is_none());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_concurrent_producers_keep_their_order() {
        let queue = EventQueue::new();
        let producers: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|prefix| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        queue.push(named(EventKind::Follow, &format!("{prefix}{i}")));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(queue.len(), 400);
        let mut last_seen = std::collections::HashMap::new();
        while let Some(event) = queue.pop() {
            let name = event.display_name().unwrap().to_string();
            let (prefix, index) = name.split_at(1);
            let index: i32 = index.parse().unwrap();
            let previous = last_seen.insert(prefix.to_string(), index).unwrap_or(-1);
            assert!(index > previous, "{name} popped out of order");
        }
    }
}
