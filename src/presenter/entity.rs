use super::surfaces::{SurfaceEvent, SurfaceTable};
use crate::assets::AssetContainer;
use crate::context::AuthoringContext;
use crate::ecs::EcsWorld;
use crate::events::UpdateOrigin;
use crate::scene::{EntityData, EntityKind};
use bevy_ecs::prelude::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOutcome {
    Ignored,
    Applied,
    /// The edit swapped the model's content, and with it the animation controller.
    ContentReplaced(Entity),
    Deleted(Entity),
    Duplicated(Entity),
}

/// Routes data between the selected entity and the editor surface for its kind.
/// Writes flow surface -> entity on user edits and entity -> surface on
/// selection, load completion and external transform changes.
pub struct EntityPresenter {
    surfaces: SurfaceTable,
    current: Option<(Entity, EntityKind)>,
}

impl EntityPresenter {
    pub fn new(surfaces: SurfaceTable) -> Self {
        Self { surfaces, current: None }
    }

    pub fn current(&self) -> Option<Entity> {
        self.current.map(|(entity, _)| entity)
    }

    pub fn current_kind(&self) -> Option<EntityKind> {
        self.current.map(|(_, kind)| kind)
    }

    pub fn surfaces(&self) -> &SurfaceTable {
        &self.surfaces
    }

    pub fn surfaces_mut(&mut self) -> &mut SurfaceTable {
        &mut self.surfaces
    }

    /// Camera keyboard navigation is suspended while an editor is open.
    pub fn blocks_keyboard(&self) -> bool {
        self.surfaces.any_open()
    }

    pub fn on_selected(&mut self, world: &mut EcsWorld, entity: Entity) {
        let (Some(kind), Some(data)) = (world.entity_kind(entity), world.entity_data(entity)) else {
            log::debug!("[presenter] selected entity {entity:?} is gone");
            return;
        };
        // The full snapshot already carries the current transform.
        world.take_transform_change(entity);
        self.current = Some((entity, kind));
        for other in EntityKind::ALL {
            if other != kind {
                self.surfaces.get_mut(other).close();
            }
        }
        let surface = self.surfaces.get_mut(kind);
        surface.populate(&data);
        surface.open();
        log::debug!("[presenter] editing {kind} {entity:?}");
    }

    pub fn on_deselected(&mut self, _entity: Entity) {
        self.current = None;
        self.surfaces.close_all();
    }

    pub fn handle_surface_event(
        &mut self,
        world: &mut EcsWorld,
        ctx: &mut AuthoringContext,
        assets: &AssetContainer,
        kind: EntityKind,
        event: SurfaceEvent,
    ) -> SurfaceOutcome {
        let Some((entity, tracked)) = self.current else {
            return SurfaceOutcome::Ignored;
        };
        if tracked != kind {
            log::debug!("[presenter] stale {kind} surface event while editing {tracked}");
            return SurfaceOutcome::Ignored;
        }
        match event {
            SurfaceEvent::DataChanged { origin: UpdateOrigin::ExternalSync, .. } => SurfaceOutcome::Ignored,
            SurfaceEvent::DataChanged { data, origin: UpdateOrigin::UserEdit } => {
                let content_before = world.model_content(entity);
                if !world.populate_data(entity, assets, &data) {
                    return SurfaceOutcome::Ignored;
                }
                if world.model_content(entity) != content_before {
                    log::debug!("[presenter] model content of {entity:?} replaced by edit");
                    SurfaceOutcome::ContentReplaced(entity)
                } else {
                    SurfaceOutcome::Applied
                }
            }
            SurfaceEvent::Delete => {
                self.current = None;
                self.surfaces.get_mut(kind).close();
                if world.despawn_entity(entity) {
                    log::info!("[presenter] deleted {kind} {entity:?}");
                    SurfaceOutcome::Deleted(entity)
                } else {
                    SurfaceOutcome::Ignored
                }
            }
            SurfaceEvent::Duplicate => match self.duplicate_current(world, ctx, assets) {
                Some(copy) => SurfaceOutcome::Duplicated(copy),
                None => SurfaceOutcome::Ignored,
            },
        }
    }

    /// Pushes a transform-only partial when the tracked entity was moved
    /// outside the editor since the last frame.
    pub fn sync_transform(&mut self, world: &mut EcsWorld) -> bool {
        let Some((entity, kind)) = self.current else {
            return false;
        };
        let Some(transform) = world.take_transform_change(entity) else {
            return false;
        };
        self.surfaces.get_mut(kind).populate(&EntityData::transform_only(kind, transform));
        true
    }

    /// Creates a copy of the tracked entity through the regular creation path,
    /// with a fresh id and default name.
    pub fn duplicate_current(
        &mut self,
        world: &mut EcsWorld,
        ctx: &mut AuthoringContext,
        assets: &AssetContainer,
    ) -> Option<Entity> {
        let (entity, _) = self.current?;
        let data = world.entity_data(entity)?.with_identity_cleared();
        Some(world.instant_new_entity(ctx, assets, &data))
    }

    /// Re-pushes the model surface when `asset_id` finished loading for the
    /// entity still being edited. Loads for anything else leave surfaces alone.
    pub fn on_model_loaded(&mut self, world: &EcsWorld, asset_id: &str) -> bool {
        let Some((entity, EntityKind::Model)) = self.current else {
            return false;
        };
        if world.model_asset_id(entity) != Some(asset_id) {
            return false;
        }
        let Some(data) = world.entity_data(entity) else {
            return false;
        };
        self.surfaces.get_mut(EntityKind::Model).populate(&data);
        true
    }
}
