use crate::scene::{EntityId, EntityKind};
use bevy_ecs::prelude::Entity;
use std::fmt;

/// In-order queue drained by the owner once per dispatch.
#[derive(Debug)]
pub struct EventBus<T> {
    events: Vec<T>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<T> EventBus<T> {
    pub fn push(&mut self, event: T) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<T> {
        self.events.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Append-only fan-out channel. Every subscriber keeps its own cursor, so
/// readers never steal events from each other.
#[derive(Debug)]
pub struct Broadcast<T> {
    log: Vec<T>,
}

impl<T> Default for Broadcast<T> {
    fn default() -> Self {
        Self { log: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    cursor: usize,
}

impl<T> Broadcast<T> {
    pub fn publish(&mut self, event: T) {
        self.log.push(event);
    }

    /// Subscribes from the current end of the log; earlier events are not replayed.
    pub fn subscribe(&self) -> Subscription {
        Subscription { cursor: self.log.len() }
    }

    pub fn read<'a>(&'a self, subscription: &mut Subscription) -> &'a [T] {
        let start = subscription.cursor.min(self.log.len());
        subscription.cursor = self.log.len();
        &self.log[start..]
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityCreated {
    pub entity: Entity,
    pub kind: EntityKind,
    pub id: EntityId,
}

impl fmt::Display for EntityCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityCreated entity={} kind={} id={}", self.entity.index(), self.kind, self.id)
    }
}

/// Tags where a surface or playback-bar event came from. Presenters only act on
/// `UserEdit`; `ExternalSync` marks echoes of values the presenter itself pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateOrigin {
    #[default]
    UserEdit,
    ExternalSync,
}
