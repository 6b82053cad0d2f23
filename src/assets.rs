use std::collections::HashMap;
use std::sync::Arc;

pub const PLACEHOLDER_MODEL_KEY: &str = "placeholder";

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClipInfo {
    pub name: String,
    pub duration: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshSummary {
    pub name: Option<String>,
    pub primitive_count: usize,
    pub vertex_count: usize,
}

/// Root renderable produced by a model load: the decoded node/mesh layout plus
/// the animation clips it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub name: String,
    pub node_count: usize,
    pub meshes: Vec<MeshSummary>,
    pub clips: Vec<AnimationClipInfo>,
    pub source: Option<String>,
}

impl ModelAsset {
    /// Unit cube stand-in used when an entity references an asset that is not loaded.
    pub fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER_MODEL_KEY.to_string(),
            node_count: 1,
            meshes: vec![MeshSummary { name: Some("cube".to_string()), primitive_count: 1, vertex_count: 24 }],
            clips: Vec::new(),
            source: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source.is_none() && self.name == PLACEHOLDER_MODEL_KEY
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.vertex_count).sum()
    }
}

/// Lookup of loaded models by asset id. Missing ids resolve to the placeholder.
pub struct AssetContainer {
    models: HashMap<String, Arc<ModelAsset>>,
    placeholder: Arc<ModelAsset>,
}

impl Default for AssetContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetContainer {
    pub fn new() -> Self {
        Self { models: HashMap::new(), placeholder: Arc::new(ModelAsset::placeholder()) }
    }

    pub fn insert_model(&mut self, asset_id: impl Into<String>, model: Arc<ModelAsset>) {
        let key = asset_id.into();
        if self.models.insert(key.clone(), model).is_some() {
            log::debug!("[assets] replaced model '{key}'");
        }
    }

    pub fn model(&self, asset_id: &str) -> Option<Arc<ModelAsset>> {
        self.models.get(asset_id).cloned()
    }

    pub fn model_or_placeholder(&self, asset_id: &str) -> Arc<ModelAsset> {
        match self.models.get(asset_id) {
            Some(model) => Arc::clone(model),
            None => {
                if !asset_id.is_empty() {
                    log::debug!("[assets] model '{asset_id}' not loaded; using placeholder");
                }
                Arc::clone(&self.placeholder)
            }
        }
    }

    pub fn has_model(&self, asset_id: &str) -> bool {
        self.models.contains_key(asset_id)
    }
}
