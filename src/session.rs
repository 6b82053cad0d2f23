use crate::assets::{AssetContainer, ModelAsset};
use crate::config::AuthoringConfig;
use crate::context::{AppMode, AuthoringContext};
use crate::ecs::EcsWorld;
use crate::events::{EntityCreated, Subscription};
use crate::loader::{AssetLoader, LoadEvent, LoadRequest};
use crate::presenter::{
    AnimationPresenter, BarEvent, EntityPresenter, HeadlessPlaybackBar, HeadlessProgressBar, PlaybackBar,
    ProgressBar, ProgressPresenter, SurfaceEvent, SurfaceOutcome, SurfaceTable,
};
use crate::scene::{EntityData, EntityKind, TransformData};
use crate::selection::{PickRequest, SelectionCoordinator, SelectionEvent};
use bevy_ecs::prelude::Entity;
use std::collections::VecDeque;
use std::sync::Arc;

/// UI collaborators the session drives.
pub struct SessionSurfaces {
    pub editors: SurfaceTable,
    pub playback: Box<dyn PlaybackBar>,
    pub progress: Box<dyn ProgressBar>,
}

impl SessionSurfaces {
    pub fn headless() -> Self {
        Self {
            editors: SurfaceTable::headless(),
            playback: Box::new(HeadlessPlaybackBar::new()),
            progress: Box::new(HeadlessProgressBar::new()),
        }
    }
}

/// One authoring session: the scene, its selection, the presenters and the
/// model loader, advanced together once per frame by [`AuthoringSession::update`].
pub struct AuthoringSession {
    config: AuthoringConfig,
    ctx: AuthoringContext,
    world: EcsWorld,
    assets: AssetContainer,
    loader: AssetLoader,
    load_queue: VecDeque<LoadRequest>,
    selection: SelectionCoordinator,
    entity_presenter: EntityPresenter,
    animation_presenter: AnimationPresenter,
    progress_presenter: ProgressPresenter,
    created: Subscription,
    seen_mode_revision: u64,
}

impl AuthoringSession {
    pub fn new(config: AuthoringConfig, surfaces: SessionSurfaces, loader: AssetLoader) -> Self {
        let mode = config.editor.initial_mode;
        let ctx = AuthoringContext::new(mode);
        let created = ctx.created().subscribe();
        let seen_mode_revision = ctx.mode_revision();
        let mut selection = SelectionCoordinator::new();
        selection.set_enabled(mode.accepts_picking());
        let mut session = Self {
            config,
            ctx,
            world: EcsWorld::new(),
            assets: AssetContainer::new(),
            loader,
            load_queue: VecDeque::new(),
            selection,
            entity_presenter: EntityPresenter::new(surfaces.editors),
            animation_presenter: AnimationPresenter::new(surfaces.playback, mode),
            progress_presenter: ProgressPresenter::new(surfaces.progress),
            created,
            seen_mode_revision,
        };
        session.animation_presenter.apply_mode(&mut session.world, mode, None);
        session
    }

    pub fn config(&self) -> &AuthoringConfig {
        &self.config
    }

    pub fn context(&self) -> &AuthoringContext {
        &self.ctx
    }

    pub fn mode(&self) -> AppMode {
        self.ctx.mode()
    }

    pub fn world(&self) -> &EcsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut EcsWorld {
        &mut self.world
    }

    pub fn assets(&self) -> &AssetContainer {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetContainer {
        &mut self.assets
    }

    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    pub fn selection(&self) -> &SelectionCoordinator {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionCoordinator {
        &mut self.selection
    }

    pub fn entity_presenter(&self) -> &EntityPresenter {
        &self.entity_presenter
    }

    pub fn animation_presenter(&self) -> &AnimationPresenter {
        &self.animation_presenter
    }

    pub fn pending_loads(&self) -> usize {
        self.load_queue.len() + usize::from(self.loader.is_busy())
    }

    pub fn blocks_keyboard(&self) -> bool {
        self.entity_presenter.blocks_keyboard()
    }

    pub fn create_entity(&mut self, data: &EntityData) -> Entity {
        let entity = self.world.instant_new_entity(&mut self.ctx, &self.assets, data);
        self.apply_mode_state(entity);
        self.dispatch_created();
        entity
    }

    pub fn pick(&mut self, pick: PickRequest) -> bool {
        if let Some(target) = pick.target {
            if !self.world.is_alive(target) {
                log::debug!("[session] pick on non-authored entity {target:?} ignored");
                return false;
            }
        }
        let changed = self.selection.pick(pick);
        self.dispatch_selection();
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear();
        self.dispatch_selection();
        changed
    }

    pub fn handle_surface_event(&mut self, kind: EntityKind, event: SurfaceEvent) -> SurfaceOutcome {
        let outcome =
            self.entity_presenter.handle_surface_event(&mut self.world, &mut self.ctx, &self.assets, kind, event);
        match outcome {
            SurfaceOutcome::Deleted(entity) => {
                self.selection.forget(entity);
                self.dispatch_selection();
                self.animation_presenter.refresh(&mut self.world);
            }
            SurfaceOutcome::Duplicated(entity) => {
                self.apply_mode_state(entity);
                self.dispatch_created();
            }
            SurfaceOutcome::ContentReplaced(entity) => {
                self.apply_mode_state(entity);
                self.animation_presenter.refresh(&mut self.world);
            }
            SurfaceOutcome::Applied | SurfaceOutcome::Ignored => {}
        }
        outcome
    }

    pub fn handle_bar_event(&mut self, event: BarEvent) -> bool {
        self.animation_presenter.handle_bar_event(&mut self.world, event)
    }

    pub fn duplicate_selected(&mut self) -> Option<Entity> {
        let copy = self.entity_presenter.duplicate_current(&mut self.world, &mut self.ctx, &self.assets)?;
        self.apply_mode_state(copy);
        self.dispatch_created();
        Some(copy)
    }

    /// Switches the application mode. Editing modes show everything and accept
    /// picks; view modes clear the selection and start every entity's default state.
    pub fn set_mode(&mut self, mode: AppMode) -> bool {
        self.ctx.set_mode(mode);
        self.dispatch_mode_change()
    }

    /// Applies the context's mode once per revision bump.
    fn dispatch_mode_change(&mut self) -> bool {
        let revision = self.ctx.mode_revision();
        if revision == self.seen_mode_revision {
            return false;
        }
        self.seen_mode_revision = revision;
        let mode = self.ctx.mode();
        self.selection.set_enabled(mode.accepts_picking());
        if !mode.accepts_picking() {
            self.selection.clear();
            self.dispatch_selection();
        }
        for entity in self.world.entities() {
            self.apply_mode_state(entity);
        }
        let selected = self.selection.selected();
        self.animation_presenter.apply_mode(&mut self.world, mode, selected);
        true
    }

    /// Queues a model load; it starts as soon as the loader is idle.
    pub fn request_model(&mut self, request: LoadRequest) {
        log::debug!("[session] queued '{}' ({})", request.asset_id, request.url);
        self.load_queue.push_back(request);
        self.start_next_load();
    }

    pub fn request_asset(&mut self, asset_id: &str, format: &str) {
        let request = LoadRequest::for_asset(&self.config.server, asset_id, format);
        self.request_model(request);
    }

    pub fn manipulate_transform(&mut self, entity: Entity, transform: &TransformData) -> bool {
        self.world.set_transform(entity, transform)
    }

    pub fn activate_button(&mut self, entity: Entity) -> usize {
        let applied = self.world.activate_button(entity);
        if applied > 0 {
            self.animation_presenter.pump(&mut self.world);
        }
        applied
    }

    /// One frame: advance the loader, apply queued UI events, tick animation
    /// playback and mirror external transform changes into the open editor.
    pub fn update(&mut self, dt: f32) {
        self.loader.step();
        for event in self.loader.drain_events() {
            self.progress_presenter.handle(&event);
            match event {
                LoadEvent::Ended { request, model } => self.on_model_loaded(&request, model),
                LoadEvent::Failed { request, error } => {
                    log::warn!("[session] model '{}' not loaded: {error}", request.asset_id);
                }
                LoadEvent::Started { .. } | LoadEvent::ProgressChanged(_) => {}
            }
        }
        self.start_next_load();

        for (kind, event) in self.entity_presenter.surfaces_mut().drain_events() {
            self.handle_surface_event(kind, event);
        }
        for event in self.animation_presenter.drain_bar_events() {
            self.handle_bar_event(event);
        }

        self.world.tick_animations(dt);
        self.animation_presenter.pump(&mut self.world);
        self.world.discard_animation_events();

        if self.config.editor.sync_transforms {
            self.entity_presenter.sync_transform(&mut self.world);
        }
    }

    fn on_model_loaded(&mut self, request: &LoadRequest, model: Arc<ModelAsset>) {
        self.assets.insert_model(request.asset_id.clone(), model);
        let mut refreshed = 0;
        for entity in self.world.model_entities_with_asset(&request.asset_id) {
            if self.world.refresh_model_content(entity, &self.assets) {
                self.apply_mode_state(entity);
                refreshed += 1;
            }
        }
        self.entity_presenter.on_model_loaded(&self.world, &request.asset_id);
        self.animation_presenter.refresh(&mut self.world);
        log::info!("[session] model '{}' loaded; {refreshed} entities refreshed", request.asset_id);
    }

    fn start_next_load(&mut self) {
        while !self.loader.is_busy() {
            let Some(request) = self.load_queue.pop_front() else {
                break;
            };
            if let Err(err) = self.loader.load_model(request) {
                log::warn!("[session] {err}");
            }
        }
    }

    fn apply_mode_state(&mut self, entity: Entity) {
        if self.ctx.mode().accepts_picking() {
            self.world.reset_entity_state(entity);
        } else {
            self.world.start_default_state(entity);
        }
    }

    fn dispatch_selection(&mut self) {
        for event in self.selection.drain_events() {
            match event {
                SelectionEvent::Selected(entity) => {
                    self.entity_presenter.on_selected(&mut self.world, entity);
                    self.animation_presenter.on_selected(&mut self.world, entity);
                }
                SelectionEvent::Deselected(entity) => {
                    self.entity_presenter.on_deselected(entity);
                    self.animation_presenter.on_deselected(&mut self.world, entity);
                }
            }
        }
    }

    fn dispatch_created(&mut self) {
        let events: Vec<EntityCreated> = self.ctx.created().read(&mut self.created).to_vec();
        for event in &events {
            self.animation_presenter.on_entity_created(&mut self.world, event);
        }
    }
}
