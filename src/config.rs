use crate::context::AppMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ServerConfig::default_model_route")]
    pub model_route: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "LoaderConfig::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "LoaderConfig::default_stepped_formats")]
    pub stepped_formats: Vec<String>,
    #[serde(default = "LoaderConfig::default_imported_formats")]
    pub imported_formats: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub initial_mode: AppMode,
    #[serde(default = "EditorConfig::default_sync_transforms")]
    pub sync_transforms: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthoringConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub chunk_size: Option<usize>,
    pub initial_mode: Option<AppMode>,
}

impl ServerConfig {
    fn default_base_url() -> String {
        "http://localhost:5000".to_string()
    }

    fn default_model_route() -> String {
        "models".to_string()
    }

    pub fn model_url(&self, asset_id: &str, format: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let route = self.model_route.trim_matches('/');
        format!("{base}/{route}/{asset_id}.{format}")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { base_url: Self::default_base_url(), model_route: Self::default_model_route() }
    }
}

impl LoaderConfig {
    const fn default_chunk_size() -> usize {
        256 * 1024
    }

    fn default_stepped_formats() -> Vec<String> {
        ["gltf", "glb"].iter().map(|ext| ext.to_string()).collect()
    }

    fn default_imported_formats() -> Vec<String> {
        ["fbx", "obj", "dae", "3ds", "stl", "ply", "zip"].iter().map(|ext| ext.to_string()).collect()
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
            stepped_formats: Self::default_stepped_formats(),
            imported_formats: Self::default_imported_formats(),
        }
    }
}

impl EditorConfig {
    const fn default_sync_transforms() -> bool {
        true
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { initial_mode: AppMode::default(), sync_transforms: Self::default_sync_transforms() }
    }
}

impl AuthoringConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("[config] load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(base_url) = &overrides.base_url {
            self.server.base_url = base_url.clone();
        }
        if let Some(chunk_size) = overrides.chunk_size {
            self.loader.chunk_size = chunk_size.max(1);
        }
        if let Some(mode) = overrides.initial_mode {
            self.editor.initial_mode = mode;
        }
    }
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.base_url.is_none() && self.chunk_size.is_none() && self.initial_mode.is_none()
    }
}
