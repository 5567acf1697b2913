//! Typed publish/subscribe channels.
//!
//! Everything here is single-threaded: listeners run on the host event loop
//! and a `Subscription` holds only a weak reference back to its channel, so
//! dropping a channel never leaks its listeners and releasing a subscription
//! after the channel is gone is a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

pub struct Channel<T> {
    inner: Rc<RefCell<Listeners<T>>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("subscribers", &self.inner.borrow().entries.len())
            .finish()
    }
}

impl<T: 'static> Channel<T> {
    pub fn new() -> Self {
        Channel {
            inner: Rc::new(RefCell::new(Listeners {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a listener. It stays registered until the returned
    /// subscription is released or dropped.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push((id, Rc::new(listener)));
            id
        };

        let weak: Weak<RefCell<Listeners<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().entries.retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Deliver `event` to every listener registered at the time of the call.
    ///
    /// The listener list is snapshotted first, so listeners may subscribe or
    /// unsubscribe (on this or any other channel) while being notified.
    pub fn publish(&self, event: &T) {
        let snapshot: Vec<Listener<T>> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

/// Handle for a registered listener. Released explicitly with `dispose` or
/// implicitly on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn dispose(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// A bag of subscriptions released together.
#[derive(Debug, Default)]
pub struct Subscriptions {
    items: Vec<Subscription>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.items.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn dispose_all(&mut self) {
        for mut subscription in self.items.drain(..) {
            subscription.dispose();
        }
    }
}
