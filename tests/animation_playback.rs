use ar_composer::assets::{AnimationClipInfo, ModelAsset};
use ar_composer::config::{AuthoringConfig, LoaderConfig};
use ar_composer::events::UpdateOrigin;
use ar_composer::loader::{AssetLoader, MemoryTransport, UnavailableImportService};
use ar_composer::presenter::{
    BarAction, BarEvent, HeadlessPlaybackBar, HeadlessProgressBar, SurfaceEvent, SurfaceOutcome, SurfaceTable,
};
use ar_composer::scene::{EntityData, EntityKind, ModelData, NoteData};
use ar_composer::selection::PickRequest;
use ar_composer::{AppMode, AuthoringSession, SessionSurfaces};
use bevy_ecs::prelude::Entity;
use std::sync::Arc;

const DT: f32 = 0.1;

fn clip(name: &str, duration: f32) -> AnimationClipInfo {
    AnimationClipInfo { name: name.to_string(), duration }
}

fn animated(name: &str, clips: Vec<AnimationClipInfo>) -> Arc<ModelAsset> {
    Arc::new(ModelAsset {
        name: name.to_string(),
        clips,
        source: Some(format!("mem://{name}.glb")),
        ..ModelAsset::placeholder()
    })
}

fn session(mode: AppMode) -> (AuthoringSession, HeadlessPlaybackBar) {
    let mut config = AuthoringConfig::default();
    config.editor.initial_mode = mode;
    let bar = HeadlessPlaybackBar::new();
    let surfaces = SessionSurfaces {
        editors: SurfaceTable::headless(),
        playback: Box::new(bar.clone()),
        progress: Box::new(HeadlessProgressBar::new()),
    };
    let loader = AssetLoader::new(
        LoaderConfig::default(),
        Box::new(MemoryTransport::new()),
        Box::new(UnavailableImportService),
    );
    let mut session = AuthoringSession::new(config, surfaces, loader);
    session
        .assets_mut()
        .insert_model("wolf", animated("wolf", vec![clip("idle", 2.0), clip("run", 1.0), clip("howl", 4.0)]));
    session.assets_mut().insert_model("fox", animated("fox", vec![clip("trot", 1.0), clip("sit", 3.0)]));
    (session, bar)
}

fn model(session: &mut AuthoringSession, asset_id: &str) -> Entity {
    session.create_entity(&EntityData::Model(ModelData {
        asset_id: Some(asset_id.to_string()),
        ..ModelData::default()
    }))
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

#[test]
fn model_modes_pin_the_bar_to_the_first_model() {
    let (mut session, bar) = session(AppMode::EditModel);
    assert!(!bar.visible(), "no model yet");

    let wolf = model(&mut session, "wolf");
    let fox = model(&mut session, "fox");
    assert_eq!(session.animation_presenter().first_model(), Some(wolf));
    assert_eq!(session.animation_presenter().bound(), Some(wolf));
    assert!(bar.visible());
    assert_eq!(bar.clips(), names(&["idle", "run", "howl"]));

    assert!(session.pick(PickRequest::entity(fox)));
    assert_eq!(session.animation_presenter().bound(), Some(wolf), "selection does not move a pinned bar");
    assert_eq!(bar.clips(), names(&["idle", "run", "howl"]));
}

#[test]
fn module_modes_follow_the_selection() {
    let (mut session, bar) = session(AppMode::EditArModule);
    let wolf = model(&mut session, "wolf");
    let fox = model(&mut session, "fox");
    let note = session.create_entity(&EntityData::Note(NoteData::default()));
    assert!(!bar.visible(), "nothing selected yet");
    assert_eq!(session.animation_presenter().bound(), None);

    session.pick(PickRequest::entity(fox));
    assert!(bar.visible());
    assert_eq!(bar.clips(), names(&["trot", "sit"]));
    assert_eq!(session.animation_presenter().bound(), Some(fox));

    session.pick(PickRequest::entity(wolf));
    assert_eq!(bar.clips(), names(&["idle", "run", "howl"]));

    session.pick(PickRequest::entity(note));
    assert!(!bar.visible(), "non-model selection hides the bar");
    assert_eq!(session.animation_presenter().bound(), None);

    session.pick(PickRequest::entity(fox));
    session.clear_selection();
    assert!(!bar.visible());
}

#[test]
fn only_the_bound_controller_reaches_the_bar() {
    let (mut session, bar) = session(AppMode::EditArModule);
    let wolf = model(&mut session, "wolf");
    let fox = model(&mut session, "fox");
    session.pick(PickRequest::entity(wolf));
    let writes_after_bind = bar.progress_writes();

    for _ in 0..7 {
        session.update(DT);
    }
    assert_eq!(bar.progress_writes(), writes_after_bind + 7, "one progress write per tick from the bound model");

    let wolf_position = session.world().animation_controller(wolf).expect("wolf controller").normalized_position();
    let fox_position = session.world().animation_controller(fox).expect("fox controller").normalized_position();
    assert!((bar.position() - wolf_position).abs() < 1e-5, "bar follows wolf ({wolf_position})");
    assert!((wolf_position - fox_position).abs() > 1e-3, "clips differ so positions diverge");
}

#[test]
fn bar_echoes_never_drive_the_controller() {
    let (mut session, bar) = session(AppMode::EditModel);
    let wolf = model(&mut session, "wolf");
    session.update(0.5);

    let echo = BarEvent { action: BarAction::ClipChosen(2), origin: UpdateOrigin::ExternalSync };
    assert!(!session.handle_bar_event(echo));
    let controller = session.world().animation_controller(wolf).expect("wolf controller");
    assert_eq!(controller.current_index(), 0);
    assert!(controller.is_playing());

    // Each frame re-drains the previous frame's echoes without feeding back.
    let writes = bar.progress_writes();
    for _ in 0..5 {
        session.update(0.0);
    }
    assert_eq!(bar.progress_writes(), writes, "a paused frame writes nothing back");
}

#[test]
fn user_actions_scrub_toggle_and_switch_clips() {
    let (mut session, bar) = session(AppMode::EditModel);
    let wolf = model(&mut session, "wolf");

    bar.user(BarAction::SliderMoved(0.5));
    session.update(0.0);
    let controller = session.world().animation_controller(wolf).expect("wolf controller");
    assert!((controller.normalized_position() - 0.5).abs() < 1e-5);

    bar.user(BarAction::PlayToggled(false));
    session.update(DT);
    assert!(!session.world().animation_controller(wolf).expect("wolf controller").is_playing());
    assert!(!bar.playing(), "pause is reflected back onto the bar");

    bar.user(BarAction::ClipChosen(2));
    session.update(0.0);
    let controller = session.world().animation_controller(wolf).expect("wolf controller");
    assert_eq!(controller.current_index(), 2);
    assert!(controller.is_playing());
    assert!(bar.playing());
    assert_eq!(bar.position(), 0.0);

    bar.user(BarAction::ClipChosen(9));
    session.update(0.0);
    assert_eq!(session.world().animation_controller(wolf).expect("wolf controller").current_index(), 2);
}

#[test]
fn mode_switch_rebinds_and_view_modes_start_defaults() {
    let (mut session, bar) = session(AppMode::EditArModule);
    let wolf = model(&mut session, "wolf");
    let fox = session.create_entity(&EntityData::Model(ModelData {
        asset_id: Some("fox".to_string()),
        default_animation: Some(1),
        ..ModelData::default()
    }));
    session.pick(PickRequest::entity(fox));
    assert_eq!(session.animation_presenter().bound(), Some(fox));

    assert!(session.set_mode(AppMode::EditModel));
    assert_eq!(session.animation_presenter().bound(), Some(wolf), "model modes pin the first model");

    assert!(session.set_mode(AppMode::ViewArModule));
    assert_eq!(session.selection().selected(), None, "view modes clear the selection");
    assert!(!bar.visible());
    let fox_clip = session.world().animation_controller(fox).expect("fox controller").current_index();
    assert_eq!(fox_clip, 1, "view modes start the authored default clip");

    assert!(session.set_mode(AppMode::EditArModule));
    let fox_clip = session.world().animation_controller(fox).expect("fox controller").current_index();
    assert_eq!(fox_clip, 0, "edit modes reset to the first clip");
    assert!(!session.set_mode(AppMode::EditArModule), "same mode is a no-op");
    assert_eq!(session.context().mode_revision(), 3, "only real switches bump the revision");
}

#[test]
fn deleting_the_first_model_unpins_the_bar() {
    let (mut session, bar) = session(AppMode::EditModel);
    let wolf = model(&mut session, "wolf");
    session.pick(PickRequest::entity(wolf));
    let outcome = session.handle_surface_event(EntityKind::Model, SurfaceEvent::Delete);
    assert_eq!(outcome, SurfaceOutcome::Deleted(wolf));
    assert_eq!(session.animation_presenter().first_model(), None);
    assert!(!bar.visible());
}

#[test]
fn swapping_the_asset_rebinds_the_bar_and_resets_playback() {
    let (mut session, bar) = session(AppMode::EditArModule);
    let wolf = model(&mut session, "wolf");
    session.pick(PickRequest::entity(wolf));
    bar.user(BarAction::ClipChosen(2));
    session.update(DT);
    assert_eq!(session.world().animation_controller(wolf).expect("wolf controller").current_index(), 2);

    let same_asset = SurfaceEvent::DataChanged {
        data: EntityData::Model(ModelData { default_animation: Some(1), ..ModelData::default() }),
        origin: UpdateOrigin::UserEdit,
    };
    assert_eq!(session.handle_surface_event(EntityKind::Model, same_asset), SurfaceOutcome::Applied);

    let swap = SurfaceEvent::DataChanged {
        data: EntityData::Model(ModelData { asset_id: Some("fox".to_string()), ..ModelData::default() }),
        origin: UpdateOrigin::UserEdit,
    };
    assert_eq!(session.handle_surface_event(EntityKind::Model, swap), SurfaceOutcome::ContentReplaced(wolf));
    assert_eq!(bar.clips(), names(&["trot", "sit"]), "bar shows the new controller's clips");

    let swapped = session.world().animation_controller(wolf).expect("swapped controller");
    assert_eq!(swapped.current_index(), 0);
    assert!(swapped.is_playing(), "edit modes reset the new content like a fresh entity");
    let fresh = model(&mut session, "fox");
    let fresh_playing = session.world().animation_controller(fresh).expect("fox controller").is_playing();
    assert_eq!(session.world().animation_controller(wolf).expect("swapped controller").is_playing(), fresh_playing);

    bar.user(BarAction::ClipChosen(1));
    session.update(0.0);
    assert_eq!(session.world().animation_controller(wolf).expect("swapped controller").current_index(), 1);
    assert_eq!(bar.clips(), names(&["trot", "sit"]));
}
