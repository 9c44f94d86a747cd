//! Event bus with scoped subscriptions.
//!
//! `on()` returns a `Subscription` handle that detaches its listener when
//! disposed or dropped. Components collect their handles into a
//! `SubscriptionSet` so every listener is released deterministically on
//! component destruction. `emit` invokes listeners outside the registry
//! lock, so a listener may subscribe or dispose re-entrantly.

use std::sync::{Arc, Mutex, Weak};

struct BusInner<E> {
    next_id: u64,
    listeners: Vec<(u64, Arc<dyn Fn(&E) + Send + Sync>)>,
}

/// Cheaply cloneable fan-out bus for events of type `E`.
pub struct EventBus<E> {
    inner: Arc<Mutex<BusInner<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Registers a listener and returns its disposable handle.
    pub fn on(&self, listener: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut inner = match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Arc::new(listener)));
            id
        };

        let weak: Weak<Mutex<BusInner<E>>> = Arc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let mut inner = match inner.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    inner.listeners.retain(|(listener_id, _)| *listener_id != id);
                }
            })),
        }
    }

    /// Invokes every registered listener with the event.
    pub fn emit(&self, event: &E) {
        let listeners: Vec<Arc<dyn Fn(&E) + Send + Sync>> = {
            let inner = match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(event);
        }
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.listeners.len(),
            Err(poisoned) => poisoned.into_inner().listeners.len(),
        }
    }
}

/// Handle for one registered listener. Disposing (or dropping) removes the
/// listener from its bus.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Detaches the listener now instead of at drop time.
    pub fn dispose(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

/// Per-component teardown list of subscription handles.
#[derive(Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Releases every held subscription.
    pub fn dispose_all(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
