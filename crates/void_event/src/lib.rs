//! # void_event - Timed Event Delivery
//!
//! Publish/subscribe plumbing for game events:
//! - **Subscribers**: a shared, explicitly owned subscriber list
//! - **Event**: a payload plus the list it is delivered to
//! - **EventQueue**: events waiting for their delay to pass
//!
//! Delivery fans out to every subscriber on its own scoped thread and joins
//! them all before returning. Subscribers must therefore be `Send + Sync` and
//! must not rely on being notified in any particular order.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use void_core::AsAny;

/// Receives delivered events
pub trait EventSubscriber: Send + Sync {
    fn notify(&self, event: &dyn EventPublisher);
}

fn same_subscriber(a: &Arc<dyn EventSubscriber>, b: &Arc<dyn EventSubscriber>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Shared subscriber list. Clones refer to the same list.
#[derive(Clone, Default)]
pub struct Subscribers {
    list: Arc<Mutex<Vec<Arc<dyn EventSubscriber>>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. Returns false if it was already subscribed.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> bool {
        let mut list = self.list.lock();
        if list.iter().any(|s| same_subscriber(s, &subscriber)) {
            return false;
        }
        list.push(subscriber);
        true
    }

    pub fn unsubscribe(&self, subscriber: &Arc<dyn EventSubscriber>) -> bool {
        let mut list = self.list.lock();
        let before = list.len();
        list.retain(|s| !same_subscriber(s, subscriber));
        list.len() != before
    }

    pub fn clear(&self) {
        self.list.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.list.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.lock().is_empty()
    }

    /// Copy of the current list, taken under the lock
    pub fn snapshot(&self) -> Vec<Arc<dyn EventSubscriber>> {
        self.list.lock().clone()
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers").field("len", &self.len()).finish()
    }
}

/// Something that can be queued and delivered
pub trait EventPublisher: AsAny + Send + Sync {
    /// Notify every subscriber, returning once all have been notified
    fn deliver(&self);

    fn set_time(&self, enqueued: Duration, delay: Duration);

    fn time_enqueued(&self) -> Duration;

    fn delay(&self) -> Duration;

    fn is_expired(&self, now: Duration) -> bool {
        now >= self.time_enqueued() + self.delay()
    }
}

impl<'a> dyn EventPublisher + 'a {
    /// Downcast to a concrete event type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Payload of an [`Event<P>`], if this is one
    pub fn message<P: Send + Sync + 'static>(&self) -> Option<&P> {
        self.downcast_ref::<Event<P>>().map(Event::message)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Timing {
    enqueued: Duration,
    delay: Duration,
}

/// An event carrying a payload of type `P`
pub struct Event<P> {
    payload: P,
    subscribers: Subscribers,
    timing: Mutex<Timing>,
}

impl<P: Send + Sync + 'static> Event<P> {
    pub fn new(payload: P, subscribers: &Subscribers) -> Self {
        Self {
            payload,
            subscribers: subscribers.clone(),
            timing: Mutex::new(Timing::default()),
        }
    }

    pub fn message(&self) -> &P {
        &self.payload
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }
}

impl<P: Send + Sync + 'static> EventPublisher for Event<P> {
    fn deliver(&self) {
        let subscribers = self.subscribers.snapshot();
        log::trace!(
            "delivering {} to {} subscribers",
            std::any::type_name::<P>(),
            subscribers.len()
        );
        std::thread::scope(|scope| {
            for subscriber in &subscribers {
                scope.spawn(move || subscriber.notify(self));
            }
        });
    }

    fn set_time(&self, enqueued: Duration, delay: Duration) {
        *self.timing.lock() = Timing { enqueued, delay };
    }

    fn time_enqueued(&self) -> Duration {
        self.timing.lock().enqueued
    }

    fn delay(&self) -> Duration {
        self.timing.lock().delay
    }
}

impl<P: fmt::Debug> fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("payload", &self.payload)
            .field("timing", &*self.timing.lock())
            .finish()
    }
}

/// Events waiting for their delay to pass
#[derive(Default)]
pub struct EventQueue {
    pending: Mutex<Vec<Arc<dyn EventPublisher>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `event` with `now` and `delay` and hold it until it expires
    pub fn enqueue(&self, event: Arc<dyn EventPublisher>, now: Duration, delay: Duration) {
        event.set_time(now, delay);
        self.pending.lock().push(event);
    }

    /// Deliver immediately, bypassing the queue
    pub fn send(&self, event: &dyn EventPublisher) {
        event.deliver();
    }

    /// Remove and deliver every event expired at `now`. Events are delivered
    /// concurrently; all deliveries finish before this returns.
    pub fn update(&self, now: Duration) -> usize {
        let expired: Vec<Arc<dyn EventPublisher>> = {
            let mut pending = self.pending.lock();
            let (expired, waiting): (Vec<_>, Vec<_>) =
                pending.drain(..).partition(|e| e.is_expired(now));
            *pending = waiting;
            expired
        };
        if expired.is_empty() {
            return 0;
        }

        log::trace!("delivering {} expired events", expired.len());
        std::thread::scope(|scope| {
            for event in &expired {
                scope.spawn(move || event.deliver());
            }
        });
        expired.len()
    }

    /// Drop every pending event without delivering it
    pub fn clear(&self) {
        self.pending.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue").field("pending", &self.len()).finish()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, EventPublisher, EventQueue, EventSubscriber, Subscribers};
}
