use super::*;
use crate::animation::AnimationController;
use crate::assets::{AssetContainer, ModelAsset};
use crate::scene::{ModelData, TransformData};
use bevy_ecs::prelude::{Entity, Mut};
use std::sync::Arc;

impl EcsWorld {
    pub(super) fn populate_model(&mut self, entity: Entity, assets: &AssetContainer, data: &ModelData) {
        if let Some(asset_id) = &data.asset_id {
            self.set_model(entity, assets, asset_id);
        }
        if let Some(index) = data.default_animation {
            self.set_default_animation(entity, index);
        }
    }

    /// Points the model entity at `asset_id` and re-instantiates its content.
    /// Re-setting the current id leaves the existing content untouched.
    pub fn set_model(&mut self, entity: Entity, assets: &AssetContainer, asset_id: &str) -> bool {
        let Some(model) = self.world.get::<ModelEntity>(entity) else {
            return false;
        };
        if model.asset_id == asset_id && model.content.is_some() {
            return false;
        }
        if let Some(mut model) = self.world.get_mut::<ModelEntity>(entity) {
            model.asset_id = asset_id.to_string();
        }
        self.replace_model_content(entity, assets)
    }

    /// Swaps in a fresh content child for the model's current asset. The old
    /// child's local placement carries over to the new one.
    pub(super) fn replace_model_content(&mut self, entity: Entity, assets: &AssetContainer) -> bool {
        let Some(model) = self.world.get::<ModelEntity>(entity) else {
            return false;
        };
        let asset_id = model.asset_id.clone();
        let previous = model.content;

        let mut placement = Transform3D::default();
        if let Some(old) = previous {
            if let Some(node) = self.world.get::<Transform3D>(old) {
                placement = *node;
            }
            self.despawn_entity(old);
        }

        let asset = assets.model_or_placeholder(&asset_id);
        let mut spawned = self.world.spawn((ModelContent { asset: Arc::clone(&asset) }, placement, Parent(entity)));
        if !asset.clips.is_empty() {
            spawned.insert(AnimationController::new(asset.clips.clone()));
        }
        let content = spawned.id();

        if let Some(mut children) = self.world.get_mut::<Children>(entity) {
            children.0.push(content);
        }
        if let Some(mut model) = self.world.get_mut::<ModelEntity>(entity) {
            model.content = Some(content);
        }
        log::debug!(
            "[entity] model {entity:?} content -> '{}' ({} clips{})",
            asset.name,
            asset.clips.len(),
            if asset.is_placeholder() { ", placeholder" } else { "" }
        );
        true
    }

    /// Re-instantiates content that is still showing the placeholder once the
    /// real asset for its id is present in `assets`.
    pub fn refresh_model_content(&mut self, entity: Entity, assets: &AssetContainer) -> bool {
        let Some(asset_id) = self.model_asset_id(entity).map(str::to_string) else {
            return false;
        };
        let showing_placeholder = self.model_asset(entity).map_or(true, |asset| asset.is_placeholder());
        if !showing_placeholder || !assets.has_model(&asset_id) {
            return false;
        }
        self.replace_model_content(entity, assets)
    }

    pub fn model_entities_with_asset(&mut self, asset_id: &str) -> Vec<Entity> {
        let mut query = self.world.query::<(Entity, &ModelEntity)>();
        let mut found: Vec<Entity> = query
            .iter(&self.world)
            .filter(|(_, model)| model.asset_id == asset_id)
            .map(|(entity, _)| entity)
            .collect();
        found.sort_by_key(|entity| entity.index());
        found
    }

    pub fn model_asset_id(&self, entity: Entity) -> Option<&str> {
        self.world.get::<ModelEntity>(entity).map(|model| model.asset_id.as_str())
    }

    pub fn model_content(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<ModelEntity>(entity)?.content
    }

    pub fn model_asset(&self, entity: Entity) -> Option<Arc<ModelAsset>> {
        let content = self.model_content(entity)?;
        self.world.get::<ModelContent>(content).map(|content| Arc::clone(&content.asset))
    }

    pub fn content_transform(&self, entity: Entity) -> Option<TransformData> {
        let content = self.model_content(entity)?;
        self.transform(content)
    }

    /// Moves the instantiated content relative to its model entity.
    pub fn set_content_transform(&mut self, entity: Entity, transform: &TransformData) -> bool {
        let Some(content) = self.model_content(entity) else {
            return false;
        };
        let Some(mut node) = self.world.get_mut::<Transform3D>(content) else {
            return false;
        };
        node.apply(transform);
        true
    }

    pub fn animation_controller(&self, entity: Entity) -> Option<&AnimationController> {
        let content = self.model_content(entity)?;
        self.world.get::<AnimationController>(content)
    }

    pub fn animation_controller_mut(&mut self, entity: Entity) -> Option<Mut<'_, AnimationController>> {
        let content = self.model_content(entity)?;
        self.world.get_mut::<AnimationController>(content)
    }

    pub fn play_animation(&mut self, entity: Entity, index: usize) -> bool {
        match self.animation_controller_mut(entity) {
            Some(mut controller) => controller.play_animation(index),
            None => false,
        }
    }

    pub fn default_animation(&self, entity: Entity) -> Option<usize> {
        self.world.get::<ModelEntity>(entity).map(|model| model.default_animation)
    }

    pub fn set_default_animation(&mut self, entity: Entity, index: usize) -> bool {
        let Some(mut model) = self.world.get_mut::<ModelEntity>(entity) else {
            return false;
        };
        model.default_animation = index;
        true
    }
}
