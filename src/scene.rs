use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2Data {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3Data {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuatData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for QuatData {
    fn default() -> Self {
        Quat::IDENTITY.into()
    }
}

/// Position, rotation and scale of a spatial node, captured on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformData {
    pub position: Vec3Data,
    pub rotation: QuatData,
    pub scale: Vec3Data,
}

impl Default for TransformData {
    fn default() -> Self {
        Self::from_components(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }
}

impl TransformData {
    pub fn from_components(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position: position.into(), rotation: rotation.into(), scale: scale.into() }
    }

    pub fn components(&self) -> (Vec3, Quat, Vec3) {
        (self.position.into(), self.rotation.into(), self.scale.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Model,
    Image,
    Sound,
    Button,
    Note,
}

impl EntityKind {
    pub const COUNT: usize = 5;
    pub const ALL: [EntityKind; Self::COUNT] =
        [EntityKind::Model, EntityKind::Image, EntityKind::Sound, EntityKind::Button, EntityKind::Note];

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Model => "Model",
            EntityKind::Image => "Image",
            EntityKind::Sound => "Sound",
            EntityKind::Button => "Button",
            EntityKind::Note => "Note",
        }
    }

    pub fn index(self) -> usize {
        match self {
            EntityKind::Model => 0,
            EntityKind::Image => 1,
            EntityKind::Sound => 2,
            EntityKind::Button => 3,
            EntityKind::Note => 4,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields shared by every entity kind. `None` always means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCommon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelData {
    #[serde(flatten)]
    pub common: EntityCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_animation: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(flatten)]
    pub common: EntityCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundData {
    #[serde(flatten)]
    pub common: EntityCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_at_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_playback: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ButtonEffect {
    Show,
    Hide,
    Toggle,
    PlayAnimation { index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonAction {
    pub target: EntityId,
    #[serde(flatten)]
    pub effect: ButtonEffect,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonData {
    #[serde(flatten)]
    pub common: EntityCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ButtonAction>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteData {
    #[serde(flatten)]
    pub common: EntityCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_size: Option<Vec2Data>,
}

/// Snapshot of one entity, tagged with its kind. Used both as a full snapshot
/// (`EcsWorld::entity_data`) and as a partial update (`EcsWorld::populate_data`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityData {
    Model(ModelData),
    Image(ImageData),
    Sound(SoundData),
    Button(ButtonData),
    Note(NoteData),
}

impl EntityData {
    /// A partial with every field absent.
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Model => EntityData::Model(ModelData::default()),
            EntityKind::Image => EntityData::Image(ImageData::default()),
            EntityKind::Sound => EntityData::Sound(SoundData::default()),
            EntityKind::Button => EntityData::Button(ButtonData::default()),
            EntityKind::Note => EntityData::Note(NoteData::default()),
        }
    }

    pub fn transform_only(kind: EntityKind, transform: TransformData) -> Self {
        let mut data = Self::empty(kind);
        data.common_mut().transform = Some(transform);
        data
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityData::Model(_) => EntityKind::Model,
            EntityData::Image(_) => EntityKind::Image,
            EntityData::Sound(_) => EntityKind::Sound,
            EntityData::Button(_) => EntityKind::Button,
            EntityData::Note(_) => EntityKind::Note,
        }
    }

    pub fn common(&self) -> &EntityCommon {
        match self {
            EntityData::Model(data) => &data.common,
            EntityData::Image(data) => &data.common,
            EntityData::Sound(data) => &data.common,
            EntityData::Button(data) => &data.common,
            EntityData::Note(data) => &data.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut EntityCommon {
        match self {
            EntityData::Model(data) => &mut data.common,
            EntityData::Image(data) => &mut data.common,
            EntityData::Sound(data) => &mut data.common,
            EntityData::Button(data) => &mut data.common,
            EntityData::Note(data) => &mut data.common,
        }
    }

    /// Drops id and name so the creation path assigns fresh ones.
    pub fn with_identity_cleared(mut self) -> Self {
        let common = self.common_mut();
        common.id = None;
        common.name = None;
        self
    }

    pub fn asset_id(&self) -> Option<&str> {
        match self {
            EntityData::Model(data) => data.asset_id.as_deref(),
            EntityData::Image(data) => data.asset_id.as_deref(),
            EntityData::Sound(data) => data.asset_id.as_deref(),
            EntityData::Button(_) | EntityData::Note(_) => None,
        }
    }
}

impl From<Vec2> for Vec2Data {
    fn from(value: Vec2) -> Self {
        Self { x: value.x, y: value.y }
    }
}

impl From<Vec2Data> for Vec2 {
    fn from(value: Vec2Data) -> Self {
        Vec2::new(value.x, value.y)
    }
}

impl From<Vec3> for Vec3Data {
    fn from(value: Vec3) -> Self {
        Self { x: value.x, y: value.y, z: value.z }
    }
}

impl From<Vec3Data> for Vec3 {
    fn from(value: Vec3Data) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

// No normalization here: capture/apply must round-trip bit-for-bit.
impl From<Quat> for QuatData {
    fn from(value: Quat) -> Self {
        Self { x: value.x, y: value.y, z: value.z, w: value.w }
    }
}

impl From<QuatData> for Quat {
    fn from(value: QuatData) -> Self {
        Quat::from_xyzw(value.x, value.y, value.z, value.w)
    }
}
