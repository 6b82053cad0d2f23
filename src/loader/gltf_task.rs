use super::transport::{ByteStream, Transport};
use super::{LoadError, LoadProgress, LoadRequest, LoadStrategy, StrategyPoll};
use crate::assets::{AnimationClipInfo, MeshSummary, ModelAsset};
use std::fmt;

const BYTES_PER_MB: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GltfStep {
    Download,
    Parse,
    Buffers,
    Meshes,
    Animations,
}

impl GltfStep {
    pub fn label(self) -> &'static str {
        match self {
            GltfStep::Download => "Download",
            GltfStep::Parse => "Parse",
            GltfStep::Buffers => "Buffers",
            GltfStep::Meshes => "Meshes",
            GltfStep::Animations => "Animations",
        }
    }
}

/// Raw `(step, completed, total)` report from one task step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepProgress {
    pub step: GltfStep,
    pub completed: u64,
    pub total: u64,
}

impl StepProgress {
    pub fn new(step: GltfStep, completed: usize, total: usize) -> Self {
        Self { step, completed: completed as u64, total: total as u64 }
    }

    /// Maps the raw report to a `[0, 1]` fraction and a display message.
    /// While the download size is unknown the fraction stays at 0 and the
    /// message carries the byte count in megabytes.
    pub fn normalize(&self) -> LoadProgress {
        let fraction = if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64).clamp(0.0, 1.0) as f32
        };
        let message = match self.step {
            GltfStep::Download if self.total == 0 => {
                format!("Download: {:.2}MB", self.completed as f64 / BYTES_PER_MB)
            }
            GltfStep::Download => format!(
                "Download: {:.2}/{:.2}MB",
                self.completed as f64 / BYTES_PER_MB,
                self.total as f64 / BYTES_PER_MB
            ),
            step => format!("{}: {}/{}", step.label(), self.completed, self.total),
        };
        LoadProgress { fraction, message }
    }
}

pub enum TaskPoll {
    Progress(StepProgress),
    Done(ModelAsset),
    Failed(LoadError),
}

enum Phase {
    Download { stream: Box<dyn ByteStream>, bytes: Vec<u8> },
    Parse { bytes: Vec<u8> },
    Buffers { gltf: gltf::Gltf, next: usize },
    Meshes { document: gltf::Document, next: usize, meshes: Vec<MeshSummary> },
    Animations { document: gltf::Document, meshes: Vec<MeshSummary>, next: usize, clips: Vec<AnimationClipInfo> },
    Finalize { document: gltf::Document, meshes: Vec<MeshSummary>, clips: Vec<AnimationClipInfo> },
    Finished,
}

/// Cooperative glTF/GLB load. Each `step` performs one unit of work (one
/// download chunk, one buffer, one mesh, one animation) and never blocks.
pub struct GltfTask {
    url: String,
    chunk_size: usize,
    phase: Phase,
}

impl GltfTask {
    pub fn new(url: impl Into<String>, stream: Box<dyn ByteStream>, chunk_size: usize) -> Self {
        Self { url: url.into(), chunk_size: chunk_size.max(1), phase: Phase::Download { stream, bytes: Vec::new() } }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Returns `None` once the task has completed or failed.
    pub fn step(&mut self) -> Option<TaskPoll> {
        let phase = std::mem::replace(&mut self.phase, Phase::Finished);
        if matches!(phase, Phase::Finished) {
            return None;
        }
        match self.advance(phase) {
            Ok((next, poll)) => {
                self.phase = next;
                Some(poll)
            }
            Err(error) => {
                log::warn!("[loader] {error}");
                Some(TaskPoll::Failed(error))
            }
        }
    }

    fn advance(&self, phase: Phase) -> Result<(Phase, TaskPoll), LoadError> {
        match phase {
            Phase::Download { mut stream, mut bytes } => {
                let chunk = stream.read_chunk(self.chunk_size).map_err(|err| self.download_error(format!("{err:#}")))?;
                let total = stream.total_len().unwrap_or(0) as usize;
                match chunk {
                    Some(chunk) => {
                        bytes.extend_from_slice(&chunk);
                        let progress = StepProgress::new(GltfStep::Download, bytes.len(), total);
                        Ok((Phase::Download { stream, bytes }, TaskPoll::Progress(progress)))
                    }
                    None if bytes.is_empty() => Err(self.download_error("empty response")),
                    None => {
                        let progress = StepProgress::new(GltfStep::Download, bytes.len(), bytes.len());
                        Ok((Phase::Parse { bytes }, TaskPoll::Progress(progress)))
                    }
                }
            }
            Phase::Parse { bytes } => {
                let gltf = gltf::Gltf::from_slice(&bytes).map_err(|err| self.decode_error(err))?;
                let progress = StepProgress::new(GltfStep::Parse, 1, 1);
                Ok((Phase::Buffers { gltf, next: 0 }, TaskPoll::Progress(progress)))
            }
            Phase::Buffers { gltf, next } => {
                let total = gltf.document.buffers().count();
                if let Some(buffer) = gltf.document.buffers().nth(next) {
                    self.check_buffer(&buffer, gltf.blob.as_deref())?;
                }
                let done = (next + 1).min(total);
                let progress = TaskPoll::Progress(StepProgress::new(GltfStep::Buffers, done, total));
                if done < total {
                    return Ok((Phase::Buffers { gltf, next: next + 1 }, progress));
                }
                let gltf::Gltf { document, .. } = gltf;
                Ok((Phase::Meshes { document, next: 0, meshes: Vec::new() }, progress))
            }
            Phase::Meshes { document, next, mut meshes } => {
                let total = document.meshes().count();
                if let Some(mesh) = document.meshes().nth(next) {
                    meshes.push(summarize_mesh(&mesh));
                }
                let done = (next + 1).min(total);
                let progress = TaskPoll::Progress(StepProgress::new(GltfStep::Meshes, done, total));
                if done < total {
                    return Ok((Phase::Meshes { document, next: next + 1, meshes }, progress));
                }
                Ok((Phase::Animations { document, meshes, next: 0, clips: Vec::new() }, progress))
            }
            Phase::Animations { document, meshes, next, mut clips } => {
                let total = document.animations().count();
                if let Some(animation) = document.animations().nth(next) {
                    clips.push(summarize_animation(&animation));
                }
                let done = (next + 1).min(total);
                let progress = TaskPoll::Progress(StepProgress::new(GltfStep::Animations, done, total));
                if done < total {
                    return Ok((Phase::Animations { document, meshes, next: next + 1, clips }, progress));
                }
                Ok((Phase::Finalize { document, meshes, clips }, progress))
            }
            Phase::Finalize { document, meshes, clips } => {
                let name = document
                    .scenes()
                    .find_map(|scene| scene.name().map(str::to_string))
                    .unwrap_or_else(|| file_stem(&self.url));
                let model = ModelAsset {
                    name,
                    node_count: document.nodes().count(),
                    meshes,
                    clips,
                    source: Some(self.url.clone()),
                };
                log::info!(
                    "[loader] decoded '{}': {} nodes, {} vertices, {} clips",
                    model.name,
                    model.node_count,
                    model.vertex_count(),
                    model.clips.len()
                );
                Ok((Phase::Finished, TaskPoll::Done(model)))
            }
            Phase::Finished => Err(self.decode_error("task already finished")),
        }
    }

    fn check_buffer(&self, buffer: &gltf::Buffer<'_>, blob: Option<&[u8]>) -> Result<(), LoadError> {
        let available = match buffer.source() {
            gltf::buffer::Source::Bin => blob
                .map(<[u8]>::len)
                .ok_or_else(|| self.decode_error(format!("buffer {} expects a BIN chunk", buffer.index())))?,
            gltf::buffer::Source::Uri(uri) => decode_data_uri(uri).map_err(|message| self.decode_error(message))?.len(),
        };
        if available < buffer.length() {
            return Err(self.decode_error(format!(
                "buffer {} has {} bytes but expected {}",
                buffer.index(),
                available,
                buffer.length()
            )));
        }
        Ok(())
    }

    fn download_error(&self, message: impl fmt::Display) -> LoadError {
        LoadError::Download { url: self.url.clone(), message: message.to_string() }
    }

    fn decode_error(&self, message: impl fmt::Display) -> LoadError {
        LoadError::Decode { url: self.url.clone(), message: message.to_string() }
    }
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, String> {
    let rest = uri.strip_prefix("data:").ok_or_else(|| format!("external buffer '{uri}' is not supported"))?;
    let (_, encoded) = rest.split_once(',').ok_or_else(|| "malformed data URI".to_string())?;
    base64::decode(encoded).map_err(|err| format!("failed to decode data URI: {err}"))
}

fn summarize_mesh(mesh: &gltf::Mesh<'_>) -> MeshSummary {
    let mut primitive_count = 0;
    let mut vertex_count = 0;
    for primitive in mesh.primitives() {
        primitive_count += 1;
        vertex_count += primitive.get(&gltf::Semantic::Positions).map_or(0, |positions| positions.count());
    }
    MeshSummary { name: mesh.name().map(str::to_string), primitive_count, vertex_count }
}

fn summarize_animation(animation: &gltf::Animation<'_>) -> AnimationClipInfo {
    let duration = animation
        .samplers()
        .filter_map(|sampler| sampler.input().max())
        .filter_map(|max| max.as_array()?.first()?.as_f64())
        .fold(0.0_f64, f64::max);
    AnimationClipInfo {
        name: animation.name().map(str::to_string).unwrap_or_else(|| format!("Animation {}", animation.index())),
        duration: duration as f32,
    }
}

fn file_stem(url: &str) -> String {
    let file = url.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(url);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

/// Strategy A: glTF and GLB, decoded in-process by a stepped [`GltfTask`].
pub struct GltfLoadStrategy {
    transport: Box<dyn Transport>,
    chunk_size: usize,
    task: Option<GltfTask>,
}

impl GltfLoadStrategy {
    pub fn new(transport: Box<dyn Transport>, chunk_size: usize) -> Self {
        Self { transport, chunk_size, task: None }
    }
}

impl LoadStrategy for GltfLoadStrategy {
    fn begin(&mut self, request: &LoadRequest) -> Result<(), LoadError> {
        let stream = self
            .transport
            .open(&request.url)
            .map_err(|err| LoadError::Download { url: request.url.clone(), message: format!("{err:#}") })?;
        self.task = Some(GltfTask::new(request.url.clone(), stream, self.chunk_size));
        Ok(())
    }

    fn step(&mut self) -> StrategyPoll {
        let Some(task) = self.task.as_mut() else {
            return StrategyPoll::Idle;
        };
        match task.step() {
            Some(TaskPoll::Progress(progress)) => StrategyPoll::Progress(progress.normalize()),
            Some(TaskPoll::Done(model)) => {
                self.task = None;
                StrategyPoll::Ready(model)
            }
            Some(TaskPoll::Failed(error)) => {
                self.task = None;
                StrategyPoll::Failed(error)
            }
            None => {
                self.task = None;
                StrategyPoll::Idle
            }
        }
    }
}
