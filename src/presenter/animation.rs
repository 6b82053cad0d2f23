use super::surfaces::{BarAction, BarEvent, PlaybackBar};
use crate::animation::AnimationEvent;
use crate::context::AppMode;
use crate::ecs::EcsWorld;
use crate::events::{EntityCreated, UpdateOrigin};
use crate::scene::EntityKind;
use bevy_ecs::prelude::Entity;

/// Binds the playback bar to one model's animation controller.
///
/// In the model modes the binding is pinned to the first model ever created;
/// in the AR-module modes it follows the selection. Only the bound
/// controller's events reach the bar.
pub struct AnimationPresenter {
    bar: Box<dyn PlaybackBar>,
    mode: AppMode,
    first_model: Option<Entity>,
    /// Model the bar should follow, whether or not it has clips yet.
    target: Option<Entity>,
    /// Model whose controller is currently driving the bar.
    bound: Option<Entity>,
}

impl AnimationPresenter {
    pub fn new(bar: Box<dyn PlaybackBar>, mode: AppMode) -> Self {
        Self { bar, mode, first_model: None, target: None, bound: None }
    }

    pub fn bound(&self) -> Option<Entity> {
        self.bound
    }

    pub fn first_model(&self) -> Option<Entity> {
        self.first_model
    }

    pub fn apply_mode(&mut self, world: &mut EcsWorld, mode: AppMode, selected: Option<Entity>) {
        self.mode = mode;
        let target = if mode.pins_first_model() { self.first_model } else { selected };
        self.bind(world, target);
    }

    pub fn on_entity_created(&mut self, world: &mut EcsWorld, event: &EntityCreated) {
        if event.kind != EntityKind::Model || self.first_model.is_some() {
            return;
        }
        self.first_model = Some(event.entity);
        if self.mode.pins_first_model() {
            self.bind(world, Some(event.entity));
        }
    }

    pub fn on_selected(&mut self, world: &mut EcsWorld, entity: Entity) {
        if self.mode.pins_first_model() {
            return;
        }
        self.bind(world, Some(entity));
    }

    pub fn on_deselected(&mut self, world: &mut EcsWorld, entity: Entity) {
        if self.mode.pins_first_model() || self.target != Some(entity) {
            return;
        }
        self.bind(world, None);
    }

    /// Rebinds the current target; used after its content was re-instantiated.
    pub fn refresh(&mut self, world: &mut EcsWorld) {
        if self.first_model.is_some_and(|entity| !world.is_alive(entity)) {
            self.first_model = None;
        }
        let target = self.target;
        self.bind(world, target);
    }

    fn bind(&mut self, world: &mut EcsWorld, target: Option<Entity>) {
        if let Some(previous) = self.bound.take() {
            if let Some(mut controller) = world.animation_controller_mut(previous) {
                controller.discard_events();
            }
        }
        self.target = target.filter(|&entity| world.is_alive(entity));

        let Some(entity) = self.target else {
            self.bar.set_visible(false);
            return;
        };
        let Some(mut controller) = world.animation_controller_mut(entity) else {
            log::debug!("[presenter] {entity:?} has no animation clips; hiding playback bar");
            self.bar.set_visible(false);
            return;
        };
        controller.discard_events();
        let names = controller.clip_names();
        let current = controller.current_index();
        let playing = controller.is_playing();
        let position = controller.normalized_position();

        self.bound = Some(entity);
        self.bar.set_clips(&names, current);
        self.bar.set_playing(playing);
        self.bar.set_progress(position);
        self.bar.set_visible(true);
    }

    /// Forwards the bound controller's pending events to the bar.
    pub fn pump(&mut self, world: &mut EcsWorld) {
        let Some(entity) = self.bound else {
            return;
        };
        let Some(mut controller) = world.animation_controller_mut(entity) else {
            self.bound = None;
            self.bar.set_visible(false);
            return;
        };
        for event in controller.drain_events() {
            match event {
                AnimationEvent::ProgressChanged(position) => self.bar.set_progress(position),
                AnimationEvent::PlaybackStarted(playing) => self.bar.set_playing(playing),
            }
        }
    }

    /// Applies a user action from the bar. Echoes of values the presenter wrote
    /// itself are tagged `ExternalSync` and dropped here.
    pub fn handle_bar_event(&mut self, world: &mut EcsWorld, event: BarEvent) -> bool {
        if event.origin == UpdateOrigin::ExternalSync {
            return false;
        }
        let Some(entity) = self.bound else {
            return false;
        };
        let Some(mut controller) = world.animation_controller_mut(entity) else {
            return false;
        };
        match event.action {
            BarAction::SliderMoved(position) => {
                controller.set_playback_state(position);
                true
            }
            BarAction::PlayToggled(playing) => {
                controller.toggle_play(playing);
                true
            }
            BarAction::ClipChosen(index) => controller.play_animation(index),
        }
    }

    pub fn drain_bar_events(&mut self) -> Vec<BarEvent> {
        self.bar.drain_events()
    }
}
