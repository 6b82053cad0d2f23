use super::*;
use crate::animation::AnimationController;
use crate::assets::AssetContainer;
use crate::context::AuthoringContext;
use crate::events::EntityCreated;
use crate::scene::{
    ButtonData, ButtonEffect, EntityCommon, EntityData, EntityId, EntityKind, ImageData, ModelData, NoteData,
    SoundData, TransformData,
};
use bevy_ecs::prelude::{Entity, With, World};

// ---------- World container ----------
pub struct EcsWorld {
    pub world: World,
}

impl Default for EcsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EcsWorld {
    pub fn new() -> Self {
        Self { world: World::new() }
    }

    /// Number of authored entities (content children are not counted).
    pub fn entity_count(&mut self) -> usize {
        let mut query = self.world.query::<&EntityIdentity>();
        query.iter(&self.world).count()
    }

    pub fn entities(&mut self) -> Vec<Entity> {
        let mut query = self.world.query_filtered::<Entity, With<EntityIdentity>>();
        let mut entities: Vec<Entity> = query.iter(&self.world).collect();
        entities.sort_by_key(|entity| entity.index());
        entities
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.world.get::<EntityIdentity>(entity).is_some()
    }

    pub fn entity_kind(&self, entity: Entity) -> Option<EntityKind> {
        self.world.get::<EntityKindTag>(entity).map(|tag| tag.0)
    }

    pub fn find_by_id(&mut self, id: &EntityId) -> Option<Entity> {
        let mut query = self.world.query::<(Entity, &EntityIdentity)>();
        query.iter(&self.world).find(|(_, identity)| identity.id == *id).map(|(entity, _)| entity)
    }

    /// Spawns a scene node for `data.kind()`, applies `data` to it, assigns a
    /// default name when none was supplied and broadcasts the creation.
    pub fn instant_new_entity(
        &mut self,
        ctx: &mut AuthoringContext,
        assets: &AssetContainer,
        data: &EntityData,
    ) -> Entity {
        let kind = data.kind();
        let id = match data.common().id.clone().filter(|id| !id.is_empty()) {
            Some(id) if self.find_by_id(&id).is_some() => {
                let fresh = EntityId::new();
                log::warn!("[entity] id '{id}' is already in use; assigning '{fresh}'");
                fresh
            }
            Some(id) => id,
            None => EntityId::new(),
        };
        let mut spawned = self.world.spawn((
            EntityIdentity { id: id.clone(), name: String::new() },
            EntityKindTag(kind),
            Transform3D::default(),
            TransformChanged::default(),
            Visibility::default(),
            Children::default(),
        ));
        match kind {
            EntityKind::Model => {
                spawned.insert(ModelEntity::default());
            }
            EntityKind::Image => {
                spawned.insert(ImageEntity::default());
            }
            EntityKind::Sound => {
                spawned.insert(SoundEntity::default());
            }
            EntityKind::Button => {
                spawned.insert(ButtonEntity::default());
            }
            EntityKind::Note => {
                spawned.insert(NoteEntity::default());
            }
        }
        let entity = spawned.id();

        self.populate_data(entity, assets, data);
        if kind == EntityKind::Model && self.model_content(entity).is_none() {
            self.replace_model_content(entity, assets);
        }
        if self.entity_name(entity).map_or(true, str::is_empty) {
            let name = ctx.next_default_name(kind);
            self.set_entity_name(entity, &name);
        }
        log::info!(
            "[entity] created {kind} '{}' ({id})",
            self.entity_name(entity).unwrap_or_default()
        );
        ctx.publish_created(EntityCreated { entity, kind, id });
        entity
    }

    /// Full snapshot of the entity's current state; every field is present.
    pub fn entity_data(&self, entity: Entity) -> Option<EntityData> {
        let identity = self.world.get::<EntityIdentity>(entity)?;
        let kind = self.entity_kind(entity)?;
        let transform = self.world.get::<Transform3D>(entity)?.capture();
        let visibility = self.world.get::<Visibility>(entity).copied().unwrap_or_default();
        let common = EntityCommon {
            id: Some(identity.id.clone()),
            name: Some(identity.name.clone()),
            transform: Some(transform),
            is_visible: Some(visibility.authored),
        };
        let data = match kind {
            EntityKind::Model => {
                let model = self.world.get::<ModelEntity>(entity)?;
                EntityData::Model(ModelData {
                    common,
                    asset_id: Some(model.asset_id.clone()),
                    default_animation: Some(model.default_animation),
                })
            }
            EntityKind::Image => {
                let image = self.world.get::<ImageEntity>(entity)?;
                EntityData::Image(ImageData { common, asset_id: Some(image.asset_id.clone()) })
            }
            EntityKind::Sound => {
                let sound = self.world.get::<SoundEntity>(entity)?;
                EntityData::Sound(SoundData {
                    common,
                    asset_id: Some(sound.asset_id.clone()),
                    play_at_start: Some(sound.play_at_start),
                    loop_playback: Some(sound.loop_playback),
                    volume: Some(sound.volume),
                })
            }
            EntityKind::Button => {
                let button = self.world.get::<ButtonEntity>(entity)?;
                EntityData::Button(ButtonData {
                    common,
                    label: Some(button.label.clone()),
                    actions: Some(button.actions.clone()),
                })
            }
            EntityKind::Note => {
                let note = self.world.get::<NoteEntity>(entity)?;
                EntityData::Note(NoteData {
                    common,
                    text: Some(note.text.clone()),
                    font_size: Some(note.font_size),
                    box_size: Some(note.box_size),
                })
            }
        };
        Some(data)
    }

    /// Applies only the fields present in `data`. Returns false when the entity
    /// is gone or `data` belongs to another kind; both are logged and dropped.
    pub fn populate_data(&mut self, entity: Entity, assets: &AssetContainer, data: &EntityData) -> bool {
        let Some(kind) = self.entity_kind(entity) else {
            log::debug!("[entity] populate for missing entity {entity:?} dropped");
            return false;
        };
        if data.kind() != kind {
            log::warn!("[entity] {} data ignored for {kind} entity {entity:?}", data.kind());
            return false;
        }
        match data {
            EntityData::Model(model) => self.populate_model(entity, assets, model),
            EntityData::Image(image) => {
                if let (Some(asset_id), Some(mut payload)) =
                    (&image.asset_id, self.world.get_mut::<ImageEntity>(entity))
                {
                    if payload.asset_id != *asset_id {
                        payload.asset_id = asset_id.clone();
                    }
                }
            }
            EntityData::Sound(sound) => {
                if let Some(mut payload) = self.world.get_mut::<SoundEntity>(entity) {
                    if let Some(asset_id) = &sound.asset_id {
                        if payload.asset_id != *asset_id {
                            payload.asset_id = asset_id.clone();
                            payload.playing = false;
                        }
                    }
                    if let Some(play_at_start) = sound.play_at_start {
                        payload.play_at_start = play_at_start;
                    }
                    if let Some(loop_playback) = sound.loop_playback {
                        payload.loop_playback = loop_playback;
                    }
                    if let Some(volume) = sound.volume.filter(|v| v.is_finite()) {
                        payload.volume = volume.clamp(0.0, 1.0);
                    }
                }
            }
            EntityData::Button(button) => {
                if let Some(mut payload) = self.world.get_mut::<ButtonEntity>(entity) {
                    if let Some(label) = &button.label {
                        payload.label = label.clone();
                    }
                    if let Some(actions) = &button.actions {
                        payload.actions = actions.clone();
                    }
                }
            }
            EntityData::Note(note) => {
                if let Some(mut payload) = self.world.get_mut::<NoteEntity>(entity) {
                    if let Some(text) = &note.text {
                        payload.text = text.clone();
                    }
                    if let Some(font_size) = note.font_size.filter(|size| size.is_finite() && *size > 0.0) {
                        payload.font_size = font_size;
                    }
                    if let Some(box_size) = note.box_size {
                        payload.box_size = box_size;
                    }
                }
            }
        }
        self.populate_common(entity, data.common());
        true
    }

    fn populate_common(&mut self, entity: Entity, common: &EntityCommon) {
        if let Some(visible) = common.is_visible {
            if let Some(mut visibility) = self.world.get_mut::<Visibility>(entity) {
                visibility.authored = visible;
            }
        }
        if let Some(name) = common.name.as_deref().filter(|name| !name.is_empty()) {
            self.set_entity_name(entity, name);
        }
        if let Some(transform) = &common.transform {
            if let Some(mut node) = self.world.get_mut::<Transform3D>(entity) {
                node.apply(transform);
            }
            // The editor already shows what it wrote; don't echo it back.
            if let Some(mut changed) = self.world.get_mut::<TransformChanged>(entity) {
                changed.0 = false;
            }
        }
        if let Some(id) = common.id.as_ref().filter(|id| !id.is_empty()) {
            if !self.set_entity_id(entity, id.clone()) {
                log::debug!("[entity] id of {entity:?} is already set; ignoring '{id}'");
            }
        }
    }

    pub fn entity_id(&self, entity: Entity) -> Option<&EntityId> {
        self.world.get::<EntityIdentity>(entity).map(|identity| &identity.id)
    }

    /// Ids are write-once: this only succeeds when the id was cleared, or when
    /// `id` equals the current one.
    pub fn set_entity_id(&mut self, entity: Entity, id: EntityId) -> bool {
        if self.find_by_id(&id).is_some_and(|owner| owner != entity) {
            log::warn!("[entity] id '{id}' is already in use; not assigning it to {entity:?}");
            return false;
        }
        let Some(mut identity) = self.world.get_mut::<EntityIdentity>(entity) else {
            return false;
        };
        if !identity.id.is_empty() {
            return identity.id == id;
        }
        identity.id = id;
        true
    }

    pub fn clear_entity_id(&mut self, entity: Entity) -> bool {
        let Some(mut identity) = self.world.get_mut::<EntityIdentity>(entity) else {
            return false;
        };
        identity.id = EntityId::from("");
        true
    }

    pub fn entity_name(&self, entity: Entity) -> Option<&str> {
        self.world.get::<EntityIdentity>(entity).map(|identity| identity.name.as_str())
    }

    pub fn set_entity_name(&mut self, entity: Entity, name: &str) -> bool {
        let Some(mut identity) = self.world.get_mut::<EntityIdentity>(entity) else {
            return false;
        };
        if identity.name != name {
            identity.name = name.to_string();
        }
        true
    }

    pub fn is_valid_entity(&self, entity: Entity) -> bool {
        match self.entity_kind(entity) {
            Some(EntityKind::Model) => {
                self.world.get::<ModelEntity>(entity).map_or(false, |model| !model.asset_id.is_empty())
            }
            Some(EntityKind::Image) => {
                self.world.get::<ImageEntity>(entity).map_or(false, |image| !image.asset_id.is_empty())
            }
            Some(EntityKind::Sound) => {
                self.world.get::<SoundEntity>(entity).map_or(false, |sound| !sound.asset_id.is_empty())
            }
            Some(EntityKind::Button) | Some(EntityKind::Note) => true,
            None => false,
        }
    }

    /// Editing state: everything shown, models back on clip 0, sounds stopped.
    pub fn reset_entity_state(&mut self, entity: Entity) {
        self.set_active(entity, true);
        match self.entity_kind(entity) {
            Some(EntityKind::Model) => {
                if let Some(mut controller) = self.animation_controller_mut(entity) {
                    controller.play_animation(0);
                }
            }
            Some(EntityKind::Sound) => {
                if let Some(mut sound) = self.world.get_mut::<SoundEntity>(entity) {
                    sound.playing = false;
                }
            }
            _ => {}
        }
    }

    /// Preview state: authored visibility, default clip, autoplay sounds.
    pub fn start_default_state(&mut self, entity: Entity) {
        let authored = self.world.get::<Visibility>(entity).map_or(true, |visibility| visibility.authored);
        self.set_active(entity, authored);
        match self.entity_kind(entity) {
            Some(EntityKind::Model) => {
                let index = self.world.get::<ModelEntity>(entity).map_or(0, |model| model.default_animation);
                if let Some(mut controller) = self.animation_controller_mut(entity) {
                    controller.play_animation(index);
                }
            }
            Some(EntityKind::Sound) => {
                if let Some(mut sound) = self.world.get_mut::<SoundEntity>(entity) {
                    sound.playing = sound.play_at_start;
                }
            }
            _ => {}
        }
    }

    pub fn is_active(&self, entity: Entity) -> Option<bool> {
        self.world.get::<Visibility>(entity).map(|visibility| visibility.active)
    }

    pub fn set_active(&mut self, entity: Entity, active: bool) -> bool {
        let Some(mut visibility) = self.world.get_mut::<Visibility>(entity) else {
            return false;
        };
        visibility.active = active;
        true
    }

    pub fn sound_playing(&self, entity: Entity) -> Option<bool> {
        self.world.get::<SoundEntity>(entity).map(|sound| sound.playing)
    }

    pub fn transform(&self, entity: Entity) -> Option<TransformData> {
        self.world.get::<Transform3D>(entity).map(Transform3D::capture)
    }

    /// Direct scene manipulation (gizmo drag and the like). Marks the node as
    /// changed so the editor surface gets a transform-only refresh.
    pub fn set_transform(&mut self, entity: Entity, transform: &TransformData) -> bool {
        let Some(mut node) = self.world.get_mut::<Transform3D>(entity) else {
            return false;
        };
        node.apply(transform);
        if let Some(mut changed) = self.world.get_mut::<TransformChanged>(entity) {
            changed.0 = true;
        }
        true
    }

    /// Returns the current transform if it changed since the last call, and clears the flag.
    pub fn take_transform_change(&mut self, entity: Entity) -> Option<TransformData> {
        {
            let mut changed = self.world.get_mut::<TransformChanged>(entity)?;
            if !changed.0 {
                return None;
            }
            changed.0 = false;
        }
        self.transform(entity)
    }

    pub fn activate_button(&mut self, entity: Entity) -> usize {
        let Some(actions) = self.world.get::<ButtonEntity>(entity).map(|button| button.actions.clone()) else {
            return 0;
        };
        let mut applied = 0;
        for action in &actions {
            let Some(target) = self.find_by_id(&action.target) else {
                log::debug!("[entity] button target '{}' not found", action.target);
                continue;
            };
            let done = match action.effect {
                ButtonEffect::Show => self.set_active(target, true),
                ButtonEffect::Hide => self.set_active(target, false),
                ButtonEffect::Toggle => {
                    let active = self.is_active(target).unwrap_or(false);
                    self.set_active(target, !active)
                }
                ButtonEffect::PlayAnimation { index } => self.play_animation(target, index),
            };
            if done {
                applied += 1;
            }
        }
        applied
    }

    pub fn tick_animations(&mut self, dt: f32) {
        let mut query = self.world.query::<&mut AnimationController>();
        for mut controller in query.iter_mut(&mut self.world) {
            controller.tick(dt);
        }
    }

    /// Drops animation events nobody is bound to.
    pub fn discard_animation_events(&mut self) {
        let mut query = self.world.query::<&mut AnimationController>();
        for mut controller in query.iter_mut(&mut self.world) {
            controller.discard_events();
        }
    }

    pub fn despawn_entity(&mut self, entity: Entity) -> bool {
        if let Some(parent) = self.world.get::<Parent>(entity).copied() {
            if let Some(mut siblings) = self.world.get_mut::<Children>(parent.0) {
                siblings.0.retain(|&child| child != entity);
            }
        }
        let child_ids = self.world.get::<Children>(entity).map(|c| c.0.clone()).unwrap_or_default();
        let mut removed = false;
        for child in child_ids {
            removed |= self.despawn_entity(child);
        }
        removed |= self.world.despawn(entity);
        removed
    }
}
