use super::{LoadError, LoadProgress, LoadRequest, LoadStrategy, StrategyPoll};
use crate::assets::ModelAsset;
use anyhow::{bail, Result};

pub const IMPORT_PROGRESS_MESSAGE: &str = "Loading...";

#[derive(Debug)]
pub enum ImportPoll {
    /// Coarse progress in `[0, 1]`.
    Pending(f32),
    Ready(ModelAsset),
    /// Failure with the service's own context.
    Failed(String),
}

/// External fetch-and-decode service for the formats not decoded in-process.
/// Completion is observed by polling once per tick.
pub trait ImportService {
    fn request(&mut self, url: &str, format: &str) -> Result<()>;
    fn poll(&mut self) -> ImportPoll;
}

/// Stand-in used when the host provides no import backend; every request fails.
#[derive(Debug, Default)]
pub struct UnavailableImportService;

impl ImportService for UnavailableImportService {
    fn request(&mut self, url: &str, format: &str) -> Result<()> {
        bail!("no import service is configured for '.{format}' models ({url})")
    }

    fn poll(&mut self) -> ImportPoll {
        ImportPoll::Failed("no import service is configured".to_string())
    }
}

/// Strategy B: hands the request to an [`ImportService`] and relays its
/// coarse progress with a fixed message. Failures are reported, never retried.
pub struct ImportLoadStrategy {
    service: Box<dyn ImportService>,
    active: Option<String>,
}

impl ImportLoadStrategy {
    pub fn new(service: Box<dyn ImportService>) -> Self {
        Self { service, active: None }
    }
}

impl LoadStrategy for ImportLoadStrategy {
    fn begin(&mut self, request: &LoadRequest) -> Result<(), LoadError> {
        self.service
            .request(&request.url, &request.format)
            .map_err(|err| LoadError::Import { url: request.url.clone(), message: format!("{err:#}") })?;
        self.active = Some(request.url.clone());
        Ok(())
    }

    fn step(&mut self) -> StrategyPoll {
        let Some(url) = self.active.as_ref() else {
            return StrategyPoll::Idle;
        };
        match self.service.poll() {
            ImportPoll::Pending(progress) => {
                let fraction = if progress.is_finite() { progress.clamp(0.0, 1.0) } else { 0.0 };
                StrategyPoll::Progress(LoadProgress { fraction, message: IMPORT_PROGRESS_MESSAGE.to_string() })
            }
            ImportPoll::Ready(mut model) => {
                if model.source.is_none() {
                    model.source = Some(url.clone());
                }
                self.active = None;
                StrategyPoll::Ready(model)
            }
            ImportPoll::Failed(message) => {
                let error = LoadError::Import { url: url.clone(), message };
                self.active = None;
                StrategyPoll::Failed(error)
            }
        }
    }
}
