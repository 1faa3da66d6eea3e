//! Push-based value stream with ordered delivery.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A current value plus a list of subscribers that receive every change.
///
/// Publishing holds one lock across the update and the fan-out, so every
/// subscriber sees changes in exactly the order they were made.
#[derive(Debug)]
pub struct Observable<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

#[derive(Debug)]
struct Shared<T> {
    value: T,
    subscribers: Vec<mpsc::UnboundedSender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                value,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> T {
        self.shared.lock().value.clone()
    }

    /// Replace the value and push it to every live subscriber.
    pub fn set(&self, value: T) {
        let mut shared = self.shared.lock();
        shared.value = value;

        let Shared { value, subscribers } = &mut *shared;
        subscribers.retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Guarded publish with a follow-up step, all under the one lock.
    ///
    /// `guard` decides whether `value` is published at all. When it is,
    /// `then` runs on the new value before any other `set` can land, so
    /// side effects happen in the same order as publications.
    /// Returns whether the value was published.
    pub fn set_then(
        &self,
        value: T,
        guard: impl FnOnce() -> bool,
        then: impl FnOnce(&T),
    ) -> bool {
        let mut shared = self.shared.lock();
        if !guard() {
            return false;
        }
        shared.value = value;

        let Shared { value, subscribers } = &mut *shared;
        subscribers.retain(|tx| tx.send(value.clone()).is_ok());
        then(value);
        true
    }

    /// New subscription; the current value is delivered first.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut shared = self.shared.lock();

        // The receiver is alive, so this send cannot fail.
        let _ = tx.send(shared.value.clone());
        shared.subscribers.push(tx);

        Subscription { rx }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }
}

/// Receiving end of an [`Observable`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Wait for the next value. `None` once the observable is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next value if one is already queued.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Wait until a value matches `predicate` and return it.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        while let Some(value) = self.next().await {
            if predicate(&value) {
                return Some(value);
            }
        }
        None
    }
}
