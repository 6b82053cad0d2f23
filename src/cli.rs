use crate::config::{AuthoringConfig, ConfigOverrides};
use crate::context::AppMode;
use crate::loader::{AssetLoader, FileTransport, LoadRequest, LoadState, UnavailableImportService};
use crate::presenter::{HeadlessPlaybackBar, LogProgressBar, SurfaceTable};
use crate::scene::{EntityData, ModelData};
use crate::session::{AuthoringSession, SessionSurfaces};
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

const FRAME_DT: f32 = 1.0 / 60.0;
const DEFAULT_PREVIEW_TICKS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliArgs {
    model: Option<PathBuf>,
    format: Option<String>,
    config: Option<PathBuf>,
    ticks: Option<u32>,
    mode: Option<AppMode>,
    chunk_size: Option<usize>,
}

impl CliArgs {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = CliArgs::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Use --model <path> and optional flags with values.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "model" => parsed.model = Some(PathBuf::from(value)),
                "format" => parsed.format = Some(value),
                "config" => parsed.config = Some(PathBuf::from(value)),
                "ticks" => {
                    parsed.ticks = Some(value.parse::<u32>().with_context(|| format!("Invalid ticks '{value}'"))?);
                }
                "mode" => parsed.mode = Some(parse_mode(&value)?),
                "chunk-size" => {
                    parsed.chunk_size =
                        Some(value.parse::<usize>().with_context(|| format!("Invalid chunk size '{value}'"))?);
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --model, --format, --config, --ticks, --mode, --chunk-size."
                ),
            }
        }
        Ok(parsed)
    }

    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides { base_url: None, chunk_size: self.chunk_size, initial_mode: self.mode }
    }

    pub fn model(&self) -> Option<&PathBuf> {
        self.model.as_ref()
    }

    pub fn ticks(&self) -> u32 {
        self.ticks.unwrap_or(DEFAULT_PREVIEW_TICKS)
    }
}

fn parse_mode(value: &str) -> Result<AppMode> {
    serde_json::from_value(serde_json::Value::String(value.to_ascii_lowercase())).map_err(|_| {
        anyhow!("Invalid mode '{value}'. Use view_model, edit_model, edit_ar_module or view_ar_module.")
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub asset_id: String,
    pub model_name: String,
    pub vertex_count: usize,
    pub clips: Vec<String>,
    pub current_clip: Option<usize>,
    pub load_ticks: u32,
}

/// Loads `--model` through the stepped loader, places it as a model entity in
/// its default state and previews it for `--ticks` frames.
pub fn run_headless(args: &CliArgs) -> Result<RunSummary> {
    let model_path = args.model().ok_or_else(|| anyhow!("--model <path> is required"))?;
    let mut config = match &args.config {
        Some(path) => AuthoringConfig::load(path)?,
        None => AuthoringConfig::default(),
    };
    config.apply_overrides(&args.config_overrides());

    let request = LoadRequest::from_path(model_path, args.format.as_deref())?;
    let asset_id = request.asset_id.clone();
    let loader =
        AssetLoader::new(config.loader.clone(), Box::new(FileTransport::new()), Box::new(UnavailableImportService));
    let surfaces = SessionSurfaces {
        editors: SurfaceTable::headless(),
        playback: Box::new(HeadlessPlaybackBar::new()),
        progress: Box::new(LogProgressBar::default()),
    };
    let mut session = AuthoringSession::new(config, surfaces, loader);

    session.request_model(request);
    let mut load_ticks = 0;
    while session.pending_loads() > 0 {
        session.update(FRAME_DT);
        load_ticks += 1;
    }
    if let LoadState::Failed(error) = session.loader().state() {
        bail!("Failed to load {}: {error}", model_path.display());
    }
    let asset = session
        .assets()
        .model(&asset_id)
        .ok_or_else(|| anyhow!("model '{asset_id}' was not registered after loading"))?;

    let entity = session.create_entity(&EntityData::Model(ModelData {
        asset_id: Some(asset_id.clone()),
        ..ModelData::default()
    }));
    session.world_mut().start_default_state(entity);
    for _ in 0..args.ticks() {
        session.update(FRAME_DT);
    }

    let controller = session.world().animation_controller(entity);
    Ok(RunSummary {
        asset_id,
        model_name: asset.name.clone(),
        vertex_count: asset.vertex_count(),
        clips: controller.map(|c| c.clip_names()).unwrap_or_default(),
        current_clip: controller.map(|c| c.current_index()),
        load_ticks,
    })
}
