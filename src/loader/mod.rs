mod gltf_task;
mod import;
mod transport;

pub use gltf_task::{GltfLoadStrategy, GltfStep, GltfTask, StepProgress, TaskPoll};
pub use import::{ImportLoadStrategy, ImportPoll, ImportService, UnavailableImportService, IMPORT_PROGRESS_MESSAGE};
pub use transport::{ByteStream, FileTransport, MemoryTransport, Transport};

use crate::assets::ModelAsset;
use crate::config::{LoaderConfig, ServerConfig};
use crate::events::EventBus;
use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("a load is already in flight for '{0}'")]
    Busy(String),
    #[error("unsupported model format '{0}'")]
    UnsupportedFormat(String),
    #[error("download of '{url}' failed: {message}")]
    Download { url: String, message: String },
    #[error("failed to decode '{url}': {message}")]
    Decode { url: String, message: String },
    #[error("import of '{url}' failed: {message}")]
    Import { url: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub url: String,
    /// File extension without the leading dot.
    pub format: String,
    /// Asset id the loaded model is registered under.
    pub asset_id: String,
}

impl LoadRequest {
    pub fn new(url: impl Into<String>, format: impl Into<String>, asset_id: impl Into<String>) -> Self {
        Self { url: url.into(), format: normalize_format(&format.into()), asset_id: asset_id.into() }
    }

    pub fn for_asset(server: &ServerConfig, asset_id: &str, format: &str) -> Self {
        let format = normalize_format(format);
        Self { url: server.model_url(asset_id, &format), format, asset_id: asset_id.to_string() }
    }

    /// Builds a request for a local file. The asset id is the file stem and the
    /// format falls back to the file extension.
    pub fn from_path(path: &Path, format: Option<&str>) -> Result<Self> {
        let asset_id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("model path {} has no file name", path.display()))?;
        let format = match format {
            Some(format) => format.to_string(),
            None => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_string)
                .ok_or_else(|| anyhow!("model path {} has no extension; pass --format", path.display()))?,
        };
        Ok(Self::new(path.to_string_lossy(), format, asset_id))
    }
}

fn normalize_format(format: &str) -> String {
    format.trim().trim_start_matches('.').to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgress {
    pub fraction: f32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    Started { asset_id: String },
    ProgressChanged(LoadProgress),
    Ended { request: LoadRequest, model: Arc<ModelAsset> },
    Failed { request: LoadRequest, error: LoadError },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    NotStarted,
    Loading(LoadProgress),
    Completed(Arc<ModelAsset>),
    Failed(LoadError),
}

pub enum StrategyPoll {
    /// Nothing in flight.
    Idle,
    Pending,
    Progress(LoadProgress),
    Ready(ModelAsset),
    Failed(LoadError),
}

/// One loader backend. `begin` starts a request; `step` is called once per tick
/// until it yields `Ready` or `Failed`.
pub trait LoadStrategy {
    fn begin(&mut self, request: &LoadRequest) -> Result<(), LoadError>;
    fn step(&mut self) -> StrategyPoll;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Stepped,
    Imported,
}

impl StrategyKind {
    pub fn for_format(format: &str, config: &LoaderConfig) -> Option<Self> {
        let format = normalize_format(format);
        let listed = |formats: &[String]| formats.iter().any(|entry| normalize_format(entry) == format);
        if listed(&config.stepped_formats) {
            Some(StrategyKind::Stepped)
        } else if listed(&config.imported_formats) {
            Some(StrategyKind::Imported)
        } else {
            None
        }
    }
}

/// Loads one model at a time through the strategy matching its format and
/// reports the same event sequence whichever backend ran.
pub struct AssetLoader {
    config: LoaderConfig,
    stepped: Box<dyn LoadStrategy>,
    imported: Box<dyn LoadStrategy>,
    active: Option<(StrategyKind, LoadRequest)>,
    state: LoadState,
    events: EventBus<LoadEvent>,
}

impl AssetLoader {
    pub fn new(config: LoaderConfig, transport: Box<dyn Transport>, import: Box<dyn ImportService>) -> Self {
        let stepped = Box::new(GltfLoadStrategy::new(transport, config.chunk_size));
        let imported = Box::new(ImportLoadStrategy::new(import));
        Self::with_strategies(config, stepped, imported)
    }

    pub fn with_strategies(
        config: LoaderConfig,
        stepped: Box<dyn LoadStrategy>,
        imported: Box<dyn LoadStrategy>,
    ) -> Self {
        Self { config, stepped, imported, active: None, state: LoadState::NotStarted, events: EventBus::default() }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_request(&self) -> Option<&LoadRequest> {
        self.active.as_ref().map(|(_, request)| request)
    }

    /// Starts a load. Fails with `Busy` while another load is in flight and
    /// with `UnsupportedFormat` when no strategy handles `request.format`.
    pub fn load_model(&mut self, request: LoadRequest) -> Result<(), LoadError> {
        if let Some((_, active)) = &self.active {
            log::warn!("[loader] '{}' requested while '{}' is loading", request.url, active.url);
            return Err(LoadError::Busy(active.url.clone()));
        }
        let Some(kind) = StrategyKind::for_format(&request.format, &self.config) else {
            let error = LoadError::UnsupportedFormat(request.format.clone());
            log::warn!("[loader] {error} ({})", request.url);
            self.state = LoadState::Failed(error.clone());
            return Err(error);
        };

        log::info!("[loader] loading '{}' as {kind:?}", request.url);
        self.events.push(LoadEvent::Started { asset_id: request.asset_id.clone() });
        self.state = LoadState::Loading(LoadProgress { fraction: 0.0, message: String::new() });
        if let Err(error) = self.strategy_mut(kind).begin(&request) {
            self.fail(request, error);
            return Ok(());
        }
        self.active = Some((kind, request));
        Ok(())
    }

    /// Advances the in-flight load by one unit. Returns true while a load is
    /// still running afterwards.
    pub fn step(&mut self) -> bool {
        let Some(kind) = self.active.as_ref().map(|(kind, _)| *kind) else {
            return false;
        };
        match self.strategy_mut(kind).step() {
            StrategyPoll::Idle | StrategyPoll::Pending => {}
            StrategyPoll::Progress(progress) => {
                self.state = LoadState::Loading(progress.clone());
                self.events.push(LoadEvent::ProgressChanged(progress));
            }
            StrategyPoll::Ready(model) => {
                if let Some((_, request)) = self.active.take() {
                    let model = Arc::new(model);
                    log::info!("[loader] '{}' ready", request.url);
                    self.state = LoadState::Completed(Arc::clone(&model));
                    self.events.push(LoadEvent::Ended { request, model });
                }
            }
            StrategyPoll::Failed(error) => {
                if let Some((_, request)) = self.active.take() {
                    self.fail(request, error);
                }
            }
        }
        self.active.is_some()
    }

    pub fn drain_events(&mut self) -> Vec<LoadEvent> {
        self.events.drain()
    }

    fn fail(&mut self, request: LoadRequest, error: LoadError) {
        log::warn!("[loader] {error}");
        self.state = LoadState::Failed(error.clone());
        self.events.push(LoadEvent::Failed { request, error });
    }

    fn strategy_mut(&mut self, kind: StrategyKind) -> &mut dyn LoadStrategy {
        match kind {
            StrategyKind::Stepped => self.stepped.as_mut(),
            StrategyKind::Imported => self.imported.as_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader_with(transport: MemoryTransport) -> AssetLoader {
        AssetLoader::new(LoaderConfig::default(), Box::new(transport), Box::new(UnavailableImportService))
    }

    #[test]
    fn format_lookup_is_case_and_dot_insensitive() {
        let config = LoaderConfig::default();
        assert_eq!(StrategyKind::for_format(".GLB", &config), Some(StrategyKind::Stepped));
        assert_eq!(StrategyKind::for_format("fbx", &config), Some(StrategyKind::Imported));
        assert_eq!(StrategyKind::for_format("usdz", &config), None);
    }

    #[test]
    fn second_load_while_busy_is_rejected() {
        let mut transport = MemoryTransport::new();
        transport.insert("mem://a.glb", vec![0; 16]);
        let mut loader = loader_with(transport);
        loader.load_model(LoadRequest::new("mem://a.glb", "glb", "a")).expect("first load starts");
        let err = loader.load_model(LoadRequest::new("mem://b.glb", "glb", "b")).expect_err("busy");
        assert_eq!(err, LoadError::Busy("mem://a.glb".into()));
        assert_eq!(loader.active_request().map(|r| r.asset_id.as_str()), Some("a"));
    }

    #[test]
    fn unsupported_format_fails_without_events() {
        let mut loader = loader_with(MemoryTransport::new());
        let err = loader.load_model(LoadRequest::new("mem://a.usdz", "usdz", "a")).expect_err("unsupported");
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
        assert!(loader.drain_events().is_empty());
        assert!(!loader.is_busy());
    }

    #[test]
    fn unavailable_import_service_reports_failure_and_frees_loader() {
        let mut loader = loader_with(MemoryTransport::new());
        loader.load_model(LoadRequest::new("mem://a.fbx", "fbx", "a")).expect("start reported via events");
        let events = loader.drain_events();
        assert!(matches!(events.first(), Some(LoadEvent::Started { .. })));
        assert!(matches!(events.last(), Some(LoadEvent::Failed { error: LoadError::Import { .. }, .. })));
        assert!(!loader.is_busy());
        assert!(!loader.step(), "stepping an idle loader is a no-op");
    }

    #[test]
    fn request_from_path_uses_stem_and_extension() {
        let request = LoadRequest::from_path(Path::new("/tmp/models/Fox.GLB"), None).expect("request");
        assert_eq!(request.asset_id, "Fox");
        assert_eq!(request.format, "glb");
        assert!(LoadRequest::from_path(Path::new("/tmp/models/fox"), None).is_err());
    }
}
