use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use super::world::World;
use crate::math::{Vec2, Vector};

/// Payload type that can travel through the bus. The type itself is the
/// event kind.
pub trait Event: Any {
    const NAME: &'static str;
}

/// Fired once per tick, carrying the time elapsed over the previous tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateEvent {
    pub delta_time: Duration,
}

impl Event for UpdateEvent {
    const NAME: &'static str = "update";
}

/// Pointer press inside the viewport, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseDownEvent {
    pub position: Vec2,
}

impl Event for MouseDownEvent {
    const NAME: &'static str = "mouse_down";
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseMoveEvent {
    pub position: Vec2,
}

impl Event for MouseMoveEvent {
    const NAME: &'static str = "mouse_move";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Failure reported by a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("{event} handler {index} failed: {source}")]
    Handler {
        event: &'static str,
        index: usize,
        #[source]
        source: HandlerError,
    },
}

type BoxedHandler<V> = Box<dyn FnMut(&dyn Any, &mut World<V>) -> Result<(), HandlerError>>;

struct Subscriber<V: Vector> {
    id: HandlerId,
    handler: BoxedHandler<V>,
}

/// Per-kind ordered subscriber lists. Handlers receive the world so they can
/// move, add and remove entities.
pub struct EventBus<V: Vector> {
    next_id: u64,
    subscribers: HashMap<TypeId, Vec<Subscriber<V>>>,
}

impl<V: Vector> Default for EventBus<V> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: HashMap::new(),
        }
    }
}

impl<V: Vector> EventBus<V> {
    pub fn register_handler<E, F>(&mut self, mut handler: F) -> HandlerId
    where
        E: Event,
        F: FnMut(&E, &mut World<V>) -> Result<(), HandlerError> + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        let erased: BoxedHandler<V> =
            Box::new(move |payload: &dyn Any, world: &mut World<V>| {
                match payload.downcast_ref::<E>() {
                    Some(event) => handler(event, world),
                    None => Ok(()),
                }
            });
        self.subscribers
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Subscriber {
                id,
                handler: erased,
            });
        id
    }

    /// Removes exactly the subscriber behind `id`. Unknown ids are a no-op.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        for subscribers in self.subscribers.values_mut() {
            if let Some(index) = subscribers.iter().position(|entry| entry.id == id) {
                subscribers.remove(index);
                return true;
            }
        }
        false
    }

    /// Runs every subscriber of `E` in registration order. The first failure
    /// stops the chain and is returned.
    pub fn fire_event<E: Event>(&mut self, event: &E, world: &mut World<V>) -> Result<(), EventError> {
        let Some(subscribers) = self.subscribers.get_mut(&TypeId::of::<E>()) else {
            return Ok(());
        };
        for (index, subscriber) in subscribers.iter_mut().enumerate() {
            (subscriber.handler)(event, world).map_err(|source| EventError::Handler {
                event: E::NAME,
                index,
                source,
            })?;
        }
        Ok(())
    }

    pub fn handler_count<E: Event>(&self) -> usize {
        self.subscribers
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}
