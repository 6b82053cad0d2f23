use crate::events::{EventBus, UpdateOrigin};
use crate::scene::{EntityData, EntityKind};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    DataChanged { data: EntityData, origin: UpdateOrigin },
    Delete,
    Duplicate,
}

impl SurfaceEvent {
    pub fn edit(data: EntityData) -> Self {
        SurfaceEvent::DataChanged { data, origin: UpdateOrigin::UserEdit }
    }
}

/// Editor panel for one entity kind.
pub trait EditorSurface {
    fn populate(&mut self, data: &EntityData);
    fn open(&mut self);
    fn close(&mut self);
    fn is_open(&self) -> bool;
    fn drain_events(&mut self) -> Vec<SurfaceEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarAction {
    SliderMoved(f32),
    PlayToggled(bool),
    ClipChosen(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarEvent {
    pub action: BarAction,
    pub origin: UpdateOrigin,
}

impl BarEvent {
    pub fn user(action: BarAction) -> Self {
        Self { action, origin: UpdateOrigin::UserEdit }
    }
}

/// Animation playback bar: clip dropdown, play toggle and scrub slider.
pub trait PlaybackBar {
    fn set_visible(&mut self, visible: bool);
    fn set_clips(&mut self, names: &[String], current: usize);
    fn set_playing(&mut self, playing: bool);
    fn set_progress(&mut self, position: f32);
    fn drain_events(&mut self) -> Vec<BarEvent>;
}

pub trait ProgressBar {
    fn set_enabled(&mut self, enabled: bool);
    fn set_progress(&mut self, fraction: f32, message: &str);
}

/// One editor surface per entity kind, indexed by [`EntityKind::index`].
pub struct SurfaceTable {
    surfaces: Vec<Box<dyn EditorSurface>>,
}

impl SurfaceTable {
    pub fn new(mut build: impl FnMut(EntityKind) -> Box<dyn EditorSurface>) -> Self {
        Self { surfaces: EntityKind::ALL.iter().map(|&kind| build(kind)).collect() }
    }

    pub fn headless() -> Self {
        Self::new(|_| Box::new(HeadlessSurface::new()))
    }

    pub fn get(&self, kind: EntityKind) -> &dyn EditorSurface {
        self.surfaces[kind.index()].as_ref()
    }

    pub fn get_mut(&mut self, kind: EntityKind) -> &mut dyn EditorSurface {
        self.surfaces[kind.index()].as_mut()
    }

    pub fn close_all(&mut self) {
        for surface in &mut self.surfaces {
            if surface.is_open() {
                surface.close();
            }
        }
    }

    pub fn any_open(&self) -> bool {
        self.surfaces.iter().any(|surface| surface.is_open())
    }

    /// Pending events from every surface, tagged with the surface's kind.
    pub fn drain_events(&mut self) -> Vec<(EntityKind, SurfaceEvent)> {
        let mut drained = Vec::new();
        for (surface, &kind) in self.surfaces.iter_mut().zip(EntityKind::ALL.iter()) {
            drained.extend(surface.drain_events().into_iter().map(|event| (kind, event)));
        }
        drained
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    open: bool,
    pushed: Vec<EntityData>,
    outbox: EventBus<SurfaceEvent>,
}

/// In-process editor surface. Clones share state, so the host keeps one clone
/// as the "user side" to inspect pushes and raise edits.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_edit(&self, data: EntityData) {
        self.state.borrow_mut().outbox.push(SurfaceEvent::edit(data));
    }

    pub fn user_delete(&self) {
        self.state.borrow_mut().outbox.push(SurfaceEvent::Delete);
    }

    pub fn user_duplicate(&self) {
        self.state.borrow_mut().outbox.push(SurfaceEvent::Duplicate);
    }

    pub fn last_pushed(&self) -> Option<EntityData> {
        self.state.borrow().pushed.last().cloned()
    }

    pub fn push_count(&self) -> usize {
        self.state.borrow().pushed.len()
    }

    pub fn opened(&self) -> bool {
        self.state.borrow().open
    }
}

impl EditorSurface for HeadlessSurface {
    fn populate(&mut self, data: &EntityData) {
        let mut state = self.state.borrow_mut();
        state.pushed.push(data.clone());
        // Field widgets report programmatic writes like user input.
        state.outbox.push(SurfaceEvent::DataChanged { data: data.clone(), origin: UpdateOrigin::ExternalSync });
    }

    fn open(&mut self) {
        self.state.borrow_mut().open = true;
    }

    fn close(&mut self) {
        self.state.borrow_mut().open = false;
    }

    fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        self.state.borrow_mut().outbox.drain()
    }
}

#[derive(Debug, Default)]
struct BarState {
    visible: bool,
    clips: Vec<String>,
    current: usize,
    playing: bool,
    position: f32,
    progress_writes: usize,
    outbox: EventBus<BarEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessPlaybackBar {
    state: Rc<RefCell<BarState>>,
}

impl HeadlessPlaybackBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, action: BarAction) {
        self.state.borrow_mut().outbox.push(BarEvent::user(action));
    }

    pub fn visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn clips(&self) -> Vec<String> {
        self.state.borrow().clips.clone()
    }

    pub fn current_clip(&self) -> usize {
        self.state.borrow().current
    }

    pub fn playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn position(&self) -> f32 {
        self.state.borrow().position
    }

    pub fn progress_writes(&self) -> usize {
        self.state.borrow().progress_writes
    }
}

impl PlaybackBar for HeadlessPlaybackBar {
    fn set_visible(&mut self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    fn set_clips(&mut self, names: &[String], current: usize) {
        let mut state = self.state.borrow_mut();
        state.clips = names.to_vec();
        state.current = current;
        state.outbox.push(BarEvent { action: BarAction::ClipChosen(current), origin: UpdateOrigin::ExternalSync });
    }

    fn set_playing(&mut self, playing: bool) {
        let mut state = self.state.borrow_mut();
        state.playing = playing;
        state.outbox.push(BarEvent { action: BarAction::PlayToggled(playing), origin: UpdateOrigin::ExternalSync });
    }

    fn set_progress(&mut self, position: f32) {
        let mut state = self.state.borrow_mut();
        state.position = position;
        state.progress_writes += 1;
        state.outbox.push(BarEvent { action: BarAction::SliderMoved(position), origin: UpdateOrigin::ExternalSync });
    }

    fn drain_events(&mut self) -> Vec<BarEvent> {
        self.state.borrow_mut().outbox.drain()
    }
}

#[derive(Debug, Default)]
struct ProgressState {
    enabled: bool,
    fraction: f32,
    message: String,
    updates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessProgressBar {
    state: Rc<RefCell<ProgressState>>,
}

impl HeadlessProgressBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn fraction(&self) -> f32 {
        self.state.borrow().fraction
    }

    pub fn message(&self) -> String {
        self.state.borrow().message.clone()
    }

    pub fn updates(&self) -> usize {
        self.state.borrow().updates
    }
}

impl ProgressBar for HeadlessProgressBar {
    fn set_enabled(&mut self, enabled: bool) {
        self.state.borrow_mut().enabled = enabled;
    }

    fn set_progress(&mut self, fraction: f32, message: &str) {
        let mut state = self.state.borrow_mut();
        state.fraction = fraction;
        state.message = message.to_string();
        state.updates += 1;
    }
}

/// Progress bar for terminal hosts; writes each update to the log.
#[derive(Debug, Default)]
pub struct LogProgressBar {
    enabled: bool,
}

impl ProgressBar for LogProgressBar {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_progress(&mut self, fraction: f32, message: &str) {
        if self.enabled {
            log::info!("[progress] {:>5.1}% {message}", fraction * 100.0);
        }
    }
}
