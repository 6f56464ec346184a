//! # Event Bus
//!
//! Synchronous, typed publish/subscribe between systems.
//!
//! ## Delivery Model
//!
//! ```text
//! System A update
//!   └─ world.publish(Hit { .. })
//!        ├─ handler 1 (subscribed first)   ──┐
//!        │    └─ world.publish(Died { .. })  │ nested, same call stack
//!        └─ handler 2                        │
//!   <─ publish returns after every handler ──┘
//! ```
//!
//! Nothing is queued: `publish` returns once every handler subscribed to the
//! event type has run. Handlers receive the world mutably, but structural
//! changes (destroying entities, removing components) belong in a
//! [`CommandQueue`](crate::CommandQueue) drained by the owning system's own
//! update.

use std::any::{Any, TypeId};
use std::rc::Rc;

use hashbrown::HashMap;

use super::world::World;

/// Marker trait for event payloads.
///
/// Handlers are keyed by the implementing type: publishing a `T` reaches
/// exactly the handlers subscribed to `T`.
pub trait Event: 'static {
    /// Human-readable name used in logs.
    #[must_use]
    fn event_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

/// Handle identifying one subscription, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// A subscribed handler.
pub(crate) type Handler<E> = Rc<dyn Fn(&mut World, &E)>;

/// Ordered handlers for one event type.
struct HandlerList<E> {
    handlers: Vec<(SubscriptionId, Handler<E>)>,
}

/// Type-erased operations every handler list supports.
trait ErasedHandlerList {
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Event> ErasedHandlerList for HandlerList<E> {
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    fn len(&self) -> usize {
        self.handlers.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry of event handlers, owned by the [`World`].
///
/// Publishing goes through [`World::publish`] because handlers receive the
/// world itself.
pub struct EventBus {
    /// Handler lists keyed by event type.
    lists: HashMap<TypeId, Box<dyn ErasedHandlerList>>,
    /// Event type of each live subscription.
    owners: HashMap<SubscriptionId, TypeId>,
    /// Next subscription id.
    next_id: u64,
    /// Current nesting of in-flight publishes.
    depth: usize,
    /// Maximum nesting before a publish is treated as runaway recursion.
    max_depth: usize,
    /// Total publishes since creation.
    published: u64,
}

impl EventBus {
    /// Creates an empty bus.
    ///
    /// # Arguments
    ///
    /// * `max_depth` - Maximum nesting of synchronous publishes
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            lists: HashMap::new(),
            owners: HashMap::new(),
            next_id: 0,
            depth: 0,
            max_depth,
            published: 0,
        }
    }

    /// Registers a handler for events of type `E`.
    ///
    /// Handlers for the same type run in subscription order.
    pub fn subscribe<E, F>(&mut self, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&mut World, &E) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let list = self
            .lists
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(HandlerList::<E> { handlers: Vec::new() }));
        match list.as_any_mut().downcast_mut::<HandlerList<E>>() {
            Some(list) => list.handlers.push((id, Rc::new(handler))),
            None => unreachable!("handler list for {} is mistyped", E::event_name()),
        }
        self.owners.insert(id, TypeId::of::<E>());

        tracing::debug!(event = E::event_name(), ?id, "subscribed handler");
        id
    }

    /// Removes a subscription.
    ///
    /// Returns `false` if the id was unknown or already removed. A publish
    /// already in flight still delivers to the removed handler.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(event_type) = self.owners.remove(&id) else {
            return false;
        };
        self.lists
            .get_mut(&event_type)
            .is_some_and(|list| list.unsubscribe(id))
    }

    /// Number of handlers subscribed to `E`.
    #[must_use]
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.lists
            .get(&TypeId::of::<E>())
            .map_or(0, |list| list.len())
    }

    /// Current nesting of in-flight publishes (0 outside any handler).
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Total publishes since creation, including those with no subscribers.
    #[inline]
    #[must_use]
    pub const fn published_count(&self) -> u64 {
        self.published
    }

    /// Clones the handlers currently subscribed to `E`, in order.
    pub(crate) fn snapshot<E: Event>(&mut self) -> Vec<Handler<E>> {
        self.published += 1;
        self.lists
            .get(&TypeId::of::<E>())
            .and_then(|list| list.as_any().downcast_ref::<HandlerList<E>>())
            .map(|list| list.handlers.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default()
    }

    /// Marks the start of a delivery.
    ///
    /// # Panics
    ///
    /// Panics if the nesting would exceed the configured maximum.
    pub(crate) fn enter<E: Event>(&mut self) {
        if self.depth >= self.max_depth {
            tracing::error!(
                event = E::event_name(),
                max_depth = self.max_depth,
                "publish recursion limit exceeded"
            );
            panic!(
                "publishing {} exceeded the maximum publish depth of {}",
                E::event_name(),
                self.max_depth
            );
        }
        self.depth += 1;
    }

    /// Marks the end of a delivery.
    pub(crate) fn exit(&mut self) {
        self.depth -= 1;
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.lists.len())
            .field("subscriptions", &self.owners.len())
            .field("depth", &self.depth)
            .field("max_depth", &self.max_depth)
            .field("published", &self.published)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;
    impl Event for Ping {}

    struct Pong;
    impl Event for Pong {}

    #[test]
    fn test_subscribe_and_count() {
        let mut bus = EventBus::new(8);
        assert_eq!(bus.subscriber_count::<Ping>(), 0);

        let first = bus.subscribe(|_: &mut World, _: &Ping| {});
        let second = bus.subscribe(|_: &mut World, _: &Ping| {});
        bus.subscribe(|_: &mut World, _: &Pong| {});

        assert_ne!(first, second);
        assert_eq!(bus.subscriber_count::<Ping>(), 2);
        assert_eq!(bus.subscriber_count::<Pong>(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new(8);
        let id = bus.subscribe(|_: &mut World, _: &Ping| {});

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count::<Ping>(), 0);
    }

    #[test]
    fn test_snapshot_of_unknown_type_is_empty() {
        let mut bus = EventBus::new(8);
        assert!(bus.snapshot::<Pong>().is_empty());
        assert_eq!(bus.published_count(), 1);
    }

    #[test]
    #[should_panic(expected = "maximum publish depth")]
    fn test_depth_limit() {
        let mut bus = EventBus::new(2);
        bus.enter::<Ping>();
        bus.enter::<Ping>();
        bus.enter::<Ping>();
    }

    #[test]
    fn test_enter_exit_tracks_depth() {
        let mut bus = EventBus::new(4);
        bus.enter::<Ping>();
        bus.enter::<Pong>();
        assert_eq!(bus.depth(), 2);
        bus.exit();
        bus.exit();
        assert_eq!(bus.depth(), 0);
    }
}
