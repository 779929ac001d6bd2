//! Single-threaded event delivery for list-set changes
//!
//! Every list-set owns an [`EventChannel`]. Derived structures subscribe at
//! creation time and receive each published [`ListSetChange`] in their own
//! queue; they drain that queue inside their `sync` entry point. Delivery
//! is therefore explicit message passing - there is no virtual dispatch on
//! event arrival, and the publisher holds no strong reference to any
//! subscriber.
//!
//! Dropped subscribers are detected through their dangling `Weak` queue and
//! pruned on the next publish.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use verset_core::ListSetChange;

type EventQueue = Rc<RefCell<VecDeque<Rc<ListSetChange>>>>;

struct Subscriber {
    id: u64,
    queue: Weak<RefCell<VecDeque<Rc<ListSetChange>>>>,
}

/// Publisher side of a list-set's change channel
///
/// Interior-mutable so that publishing only needs a shared reference; the
/// owning list-set can hand out subscriptions while borrowed.
#[derive(Default)]
pub struct EventChannel {
    subscribers: RefCell<Vec<Subscriber>>,
    next_id: Cell<u64>,
}

impl EventChannel {
    /// Create a channel with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its queue handle
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let queue: EventQueue = Rc::new(RefCell::new(VecDeque::new()));
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            queue: Rc::downgrade(&queue),
        });
        Subscription { id, queue }
    }

    /// Deliver a change to every live subscriber, pruning dead ones
    pub fn publish(&self, change: ListSetChange) {
        let event = Rc::new(change);
        self.subscribers.borrow_mut().retain(|subscriber| {
            match subscriber.queue.upgrade() {
                Some(queue) => {
                    queue.borrow_mut().push_back(Rc::clone(&event));
                    true
                }
                None => false,
            }
        });
    }

    /// Drop a subscriber by its id
    pub fn unsubscribe(&self, id: u64) {
        self.subscribers
            .borrow_mut()
            .retain(|subscriber| subscriber.id != id);
    }

    /// Number of live subscribers (dead ones count until the next publish)
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Subscriber side of a list-set's change channel
///
/// Holds the strong reference to the queue; dropping the subscription is
/// how a derived structure detaches.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    queue: EventQueue,
}

impl Subscription {
    /// This subscription's id on its channel
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Take every queued change, oldest first
    pub fn drain(&self) -> Vec<Rc<ListSetChange>> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Whether changes are queued
    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }
}
