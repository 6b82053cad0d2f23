use crate::events::EventBus;
use bevy_ecs::prelude::Entity;
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    Selected(Entity),
    Deselected(Entity),
}

/// A raw pick from hit-testing: the entity under the pointer (if any) and the
/// pointer position in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PickRequest {
    pub target: Option<Entity>,
    pub pointer: Option<Vec2>,
}

impl PickRequest {
    pub fn at(target: Option<Entity>, pointer: Vec2) -> Self {
        Self { target, pointer: Some(pointer) }
    }

    pub fn entity(target: Entity) -> Self {
        Self { target: Some(target), pointer: None }
    }
}

/// Veto hook consulted before a pick commits.
pub trait PickFilter {
    fn allows(&self, pick: &PickRequest) -> bool;
}

impl<F> PickFilter for F
where
    F: Fn(&PickRequest) -> bool,
{
    fn allows(&self, pick: &PickRequest) -> bool {
        self(pick)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiRect {
    pub name: String,
    pub min: Vec2,
    pub max: Vec2,
}

impl UiRect {
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Rejects picks made through on-screen UI panels so clicks on the editor
/// chrome never change the scene selection.
#[derive(Debug, Clone, Default)]
pub struct UiRegionBlocker {
    regions: Vec<UiRect>,
}

impl UiRegionBlocker {
    pub fn set_region(&mut self, name: &str, min: Vec2, max: Vec2) {
        let rect = UiRect { name: name.to_string(), min: min.min(max), max: min.max(max) };
        match self.regions.iter_mut().find(|region| region.name == name) {
            Some(existing) => *existing = rect,
            None => self.regions.push(rect),
        }
    }

    pub fn remove_region(&mut self, name: &str) -> bool {
        let before = self.regions.len();
        self.regions.retain(|region| region.name != name);
        self.regions.len() != before
    }

    pub fn regions(&self) -> &[UiRect] {
        &self.regions
    }

    pub fn blocking_region(&self, point: Vec2) -> Option<&UiRect> {
        self.regions.iter().find(|region| region.contains(point))
    }
}

impl PickFilter for UiRegionBlocker {
    fn allows(&self, pick: &PickRequest) -> bool {
        pick.pointer.map_or(true, |pointer| self.blocking_region(pointer).is_none())
    }
}

/// Tracks the single selected entity. The coordinator only observes entity
/// lifetime; it never despawns anything.
pub struct SelectionCoordinator {
    selected: Option<Entity>,
    enabled: bool,
    ui_blocker: UiRegionBlocker,
    filters: Vec<Box<dyn PickFilter>>,
    events: EventBus<SelectionEvent>,
}

impl Default for SelectionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self {
            selected: None,
            enabled: true,
            ui_blocker: UiRegionBlocker::default(),
            filters: Vec::new(),
            events: EventBus::default(),
        }
    }

    pub fn selected(&self) -> Option<Entity> {
        self.selected
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// While disabled, picks are ignored. The current selection is kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            log::debug!("[selection] picking {}", if enabled { "enabled" } else { "disabled" });
            self.enabled = enabled;
        }
    }

    pub fn add_filter(&mut self, filter: Box<dyn PickFilter>) {
        self.filters.push(filter);
    }

    pub fn ui_blocker(&self) -> &UiRegionBlocker {
        &self.ui_blocker
    }

    pub fn ui_blocker_mut(&mut self) -> &mut UiRegionBlocker {
        &mut self.ui_blocker
    }

    /// Commits a raw pick unless picking is disabled or a filter vetoes it.
    /// Returns true when the selection changed.
    pub fn pick(&mut self, pick: PickRequest) -> bool {
        if !self.enabled {
            log::debug!("[selection] pick ignored while disabled");
            return false;
        }
        if !self.ui_blocker.allows(&pick) {
            log::debug!("[selection] pick blocked by UI region");
            return false;
        }
        if self.filters.iter().any(|filter| !filter.allows(&pick)) {
            log::debug!("[selection] pick vetoed by filter");
            return false;
        }
        self.select(pick.target)
    }

    pub fn clear(&mut self) -> bool {
        self.select(None)
    }

    /// Drops the selection if it points at `entity`; used when the entity is despawned.
    pub fn forget(&mut self, entity: Entity) -> bool {
        if self.selected == Some(entity) {
            return self.select(None);
        }
        false
    }

    fn select(&mut self, target: Option<Entity>) -> bool {
        if self.selected == target {
            return false;
        }
        if let Some(previous) = self.selected {
            self.events.push(SelectionEvent::Deselected(previous));
        }
        if let Some(next) = target {
            self.events.push(SelectionEvent::Selected(next));
        }
        self.selected = target;
        true
    }

    pub fn drain_events(&mut self) -> Vec<SelectionEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    fn two_entities() -> (Entity, Entity) {
        let mut world = World::new();
        (world.spawn_empty().id(), world.spawn_empty().id())
    }

    #[test]
    fn switching_emits_deselect_before_select() {
        let (a, b) = two_entities();
        let mut selection = SelectionCoordinator::new();
        assert!(selection.pick(PickRequest::entity(a)));
        assert!(selection.pick(PickRequest::entity(b)));
        assert_eq!(
            selection.drain_events(),
            vec![SelectionEvent::Selected(a), SelectionEvent::Deselected(a), SelectionEvent::Selected(b)]
        );
        assert!(selection.clear());
        assert_eq!(selection.drain_events(), vec![SelectionEvent::Deselected(b)]);
    }

    #[test]
    fn ui_region_and_custom_filters_veto_picks() {
        let (a, b) = two_entities();
        let mut selection = SelectionCoordinator::new();
        selection.ui_blocker_mut().set_region("toolbar", Vec2::new(0.0, 0.0), Vec2::new(100.0, 40.0));
        assert!(!selection.pick(PickRequest::at(Some(a), Vec2::new(10.0, 10.0))));
        assert!(selection.pick(PickRequest::at(Some(a), Vec2::new(10.0, 100.0))));

        selection.add_filter(Box::new(move |pick: &PickRequest| pick.target != Some(b)));
        assert!(!selection.pick(PickRequest::entity(b)));
        assert_eq!(selection.selected(), Some(a));
    }

    #[test]
    fn disabled_coordinator_keeps_selection() {
        let (a, b) = two_entities();
        let mut selection = SelectionCoordinator::new();
        selection.pick(PickRequest::entity(a));
        selection.set_enabled(false);
        assert!(!selection.pick(PickRequest::entity(b)));
        assert_eq!(selection.selected(), Some(a));
        assert!(selection.forget(a));
        assert_eq!(selection.selected(), None);
    }
}
