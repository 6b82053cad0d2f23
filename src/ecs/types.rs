use crate::assets::ModelAsset;
use crate::scene::{ButtonAction, EntityId, EntityKind, TransformData, Vec2Data};
use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use std::sync::Arc;

#[derive(Component, Clone, Debug)]
pub struct EntityIdentity {
    pub id: EntityId,
    pub name: String,
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityKindTag(pub EntityKind);

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl Transform3D {
    pub fn capture(&self) -> TransformData {
        TransformData::from_components(self.translation, self.rotation, self.scale)
    }

    pub fn apply(&mut self, data: &TransformData) {
        let (translation, rotation, scale) = data.components();
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
    }
}

/// Set when a spatial node is moved outside the editor surface (gizmo drag,
/// scripted motion). Cleared when the editor itself writes the transform.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct TransformChanged(pub bool);

#[derive(Component, Clone, Copy, Debug)]
pub struct Visibility {
    /// Authored flag, persisted in entity data.
    pub authored: bool,
    /// Runtime state; editing shows everything, preview honours `authored`.
    pub active: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self { authored: true, active: true }
    }
}

#[derive(Component, Clone, Copy)]
pub struct Parent(pub Entity);

#[derive(Component, Default)]
pub struct Children(pub Vec<Entity>);

#[derive(Component, Clone, Debug, Default)]
pub struct ModelEntity {
    pub asset_id: String,
    pub default_animation: usize,
    pub content: Option<Entity>,
}

/// Instantiated renderable owned by a model entity; lives on a child entity.
#[derive(Component, Clone, Debug)]
pub struct ModelContent {
    pub asset: Arc<ModelAsset>,
}

#[derive(Component, Clone, Debug, Default)]
pub struct ImageEntity {
    pub asset_id: String,
}

#[derive(Component, Clone, Debug)]
pub struct SoundEntity {
    pub asset_id: String,
    pub play_at_start: bool,
    pub loop_playback: bool,
    pub volume: f32,
    pub playing: bool,
}

impl Default for SoundEntity {
    fn default() -> Self {
        Self { asset_id: String::new(), play_at_start: false, loop_playback: false, volume: 1.0, playing: false }
    }
}

#[derive(Component, Clone, Debug, Default)]
pub struct ButtonEntity {
    pub label: String,
    pub actions: Vec<ButtonAction>,
}

#[derive(Component, Clone, Debug)]
pub struct NoteEntity {
    pub text: String,
    pub font_size: f32,
    pub box_size: Vec2Data,
}

impl Default for NoteEntity {
    fn default() -> Self {
        Self { text: String::new(), font_size: 14.0, box_size: Vec2Data { x: 1.0, y: 0.5 } }
    }
}
