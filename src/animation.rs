use crate::assets::AnimationClipInfo;
use crate::events::EventBus;
use bevy_ecs::prelude::Component;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationEvent {
    /// Normalized position in `[0, 1)` within the current clip.
    ProgressChanged(f32),
    PlaybackStarted(bool),
}

/// Playback state for the clips attached to one loaded model.
#[derive(Component, Debug)]
pub struct AnimationController {
    clips: Vec<AnimationClipInfo>,
    current: usize,
    time: f32,
    playing: bool,
    events: EventBus<AnimationEvent>,
}

impl AnimationController {
    pub fn new(clips: Vec<AnimationClipInfo>) -> Self {
        Self { clips, current: 0, time: 0.0, playing: false, events: EventBus::default() }
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn clip_names(&self) -> Vec<String> {
        self.clips.iter().map(|clip| clip.name.clone()).collect()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn current_duration(&self) -> f32 {
        self.clips.get(self.current).map(|clip| clip.duration).unwrap_or(0.0)
    }

    pub fn normalized_position(&self) -> f32 {
        let duration = self.current_duration();
        if duration <= 0.0 {
            return 0.0;
        }
        (self.time / duration).fract()
    }

    /// Restarts playback on clip `index`. Out-of-range indices are ignored.
    pub fn play_animation(&mut self, index: usize) -> bool {
        if index >= self.clips.len() {
            log::debug!("[animation] clip index {index} out of range ({} clips)", self.clips.len());
            return false;
        }
        self.current = index;
        self.time = 0.0;
        self.set_playing(true);
        self.events.push(AnimationEvent::ProgressChanged(0.0));
        true
    }

    /// Scrubs the current clip. `position` is wrapped into `[0, 1)`.
    pub fn set_playback_state(&mut self, position: f32) {
        if !position.is_finite() {
            return;
        }
        let wrapped = position - position.floor();
        self.time = wrapped * self.current_duration();
    }

    pub fn toggle_play(&mut self, playing: bool) {
        if self.clips.is_empty() {
            return;
        }
        self.set_playing(playing);
    }

    fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            self.playing = playing;
            self.events.push(AnimationEvent::PlaybackStarted(playing));
        }
    }

    /// Advances the current clip by `dt` seconds, looping at the clip end.
    pub fn tick(&mut self, dt: f32) {
        if !self.playing || dt <= 0.0 {
            return;
        }
        let duration = self.current_duration();
        if duration <= 0.0 {
            self.events.push(AnimationEvent::ProgressChanged(0.0));
            return;
        }
        self.time = (self.time + dt) % duration;
        self.events.push(AnimationEvent::ProgressChanged(self.normalized_position()));
    }

    pub fn drain_events(&mut self) -> Vec<AnimationEvent> {
        self.events.drain()
    }

    pub fn discard_events(&mut self) {
        self.events.clear();
    }
}
