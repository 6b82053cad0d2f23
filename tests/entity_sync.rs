use ar_composer::assets::{AnimationClipInfo, AssetContainer, ModelAsset};
use ar_composer::context::{AppMode, AuthoringContext};
use ar_composer::ecs::EcsWorld;
use ar_composer::scene::{
    ButtonAction, ButtonData, ButtonEffect, EntityCommon, EntityData, EntityId, EntityKind, ModelData, NoteData,
    QuatData, SoundData, TransformData, Vec3Data,
};
use std::sync::Arc;

fn clip(name: &str, duration: f32) -> AnimationClipInfo {
    AnimationClipInfo { name: name.to_string(), duration }
}

fn animated_model(name: &str, clips: usize) -> Arc<ModelAsset> {
    Arc::new(ModelAsset {
        name: name.to_string(),
        node_count: 1,
        meshes: Vec::new(),
        clips: (0..clips).map(|i| clip(&format!("{name}_{i}"), 1.0 + i as f32)).collect(),
        source: Some(format!("{name}.glb")),
    })
}

fn setup() -> (EcsWorld, AuthoringContext, AssetContainer) {
    let mut assets = AssetContainer::new();
    assets.insert_model("wolf", animated_model("wolf", 3));
    assets.insert_model("fox", animated_model("fox", 1));
    (EcsWorld::new(), AuthoringContext::new(AppMode::EditArModule), assets)
}

fn model_data(asset_id: &str) -> EntityData {
    EntityData::Model(ModelData { asset_id: Some(asset_id.to_string()), ..ModelData::default() })
}

fn moved() -> TransformData {
    TransformData {
        position: Vec3Data { x: 1.0, y: 2.0, z: -3.0 },
        rotation: QuatData { x: 0.0, y: 0.70710677, z: 0.0, w: 0.70710677 },
        scale: Vec3Data { x: 2.0, y: 2.0, z: 2.0 },
    }
}

#[test]
fn transform_only_partial_changes_only_the_transform() {
    let (mut world, mut ctx, assets) = setup();
    let entity = world.instant_new_entity(&mut ctx, &assets, &model_data("wolf"));
    let before = world.entity_data(entity).expect("snapshot before");

    let partial = EntityData::transform_only(EntityKind::Model, moved());
    assert!(world.populate_data(entity, &assets, &partial));
    let after = world.entity_data(entity).expect("snapshot after");

    assert_eq!(after.common().transform, Some(moved()));
    assert_eq!(after.common().name, before.common().name);
    assert_eq!(after.common().id, before.common().id);
    assert_eq!(after.common().is_visible, before.common().is_visible);
    assert_eq!(after.asset_id(), Some("wolf"));
    let mut expected = before.clone();
    expected.common_mut().transform = Some(moved());
    assert_eq!(after, expected, "only the transform should differ");
}

#[test]
fn reapplying_own_snapshot_is_idempotent() {
    let (mut world, mut ctx, assets) = setup();
    let sound = world.instant_new_entity(
        &mut ctx,
        &assets,
        &EntityData::Sound(SoundData {
            asset_id: Some("chime".into()),
            play_at_start: Some(true),
            volume: Some(0.4),
            ..SoundData::default()
        }),
    );
    let model = world.instant_new_entity(&mut ctx, &assets, &model_data("wolf"));

    for entity in [sound, model] {
        let snapshot = world.entity_data(entity).expect("snapshot");
        let content = world.model_content(entity);
        assert!(world.populate_data(entity, &assets, &snapshot));
        assert!(world.populate_data(entity, &assets, &snapshot));
        assert_eq!(world.entity_data(entity).expect("snapshot again"), snapshot);
        assert_eq!(world.model_content(entity), content, "content must survive re-applying the snapshot");
    }
}

#[test]
fn same_asset_keeps_content_and_new_asset_keeps_placement() {
    let (mut world, mut ctx, assets) = setup();
    let entity = world.instant_new_entity(&mut ctx, &assets, &model_data("wolf"));
    let content = world.model_content(entity).expect("wolf content");
    assert!(!world.set_model(entity, &assets, "wolf"), "same asset id is suppressed");
    assert!(world.populate_data(entity, &assets, &model_data("wolf")));
    assert_eq!(world.model_content(entity), Some(content));

    assert!(world.set_content_transform(entity, &moved()));
    assert!(world.populate_data(entity, &assets, &model_data("fox")));
    let swapped = world.model_content(entity).expect("fox content");
    assert_ne!(swapped, content, "a new asset replaces the content node");
    assert!(world.world.get_entity(content).is_err(), "old content is released");
    assert_eq!(world.content_transform(entity), Some(moved()), "placement survives the swap");
    assert_eq!(world.animation_controller(entity).map(|c| c.clip_count()), Some(1));
}

#[test]
fn missing_asset_uses_placeholder_without_animation() {
    let (mut world, mut ctx, assets) = setup();
    let entity = world.instant_new_entity(&mut ctx, &assets, &model_data("unloaded"));
    let asset = world.model_asset(entity).expect("placeholder content");
    assert!(asset.is_placeholder());
    assert!(world.animation_controller(entity).is_none());
    assert!(world.is_valid_entity(entity), "asset id is set even though it is not loaded");

    let empty = world.instant_new_entity(&mut ctx, &assets, &EntityData::empty(EntityKind::Model));
    assert!(world.model_content(empty).is_some(), "models always own content");
    assert!(!world.is_valid_entity(empty));
}

#[test]
fn default_names_count_per_kind_and_never_reset() {
    let (mut world, mut ctx, assets) = setup();
    let first = world.instant_new_entity(&mut ctx, &assets, &EntityData::empty(EntityKind::Note));
    let named = world.instant_new_entity(
        &mut ctx,
        &assets,
        &EntityData::Note(NoteData {
            common: EntityCommon { name: Some("Welcome".into()), ..EntityCommon::default() },
            ..NoteData::default()
        }),
    );
    let image = world.instant_new_entity(&mut ctx, &assets, &EntityData::empty(EntityKind::Image));
    assert_eq!(world.entity_name(first), Some("Note 1"));
    assert_eq!(world.entity_name(named), Some("Welcome"));
    assert_eq!(world.entity_name(image), Some("Image 1"));

    assert!(world.despawn_entity(first));
    let next = world.instant_new_entity(&mut ctx, &assets, &EntityData::empty(EntityKind::Note));
    assert_eq!(world.entity_name(next), Some("Note 2"), "counters survive deletions");
    assert_eq!(ctx.names_issued(EntityKind::Note), 2);

    let mut created = ctx.created().subscribe();
    world.instant_new_entity(&mut ctx, &assets, &EntityData::empty(EntityKind::Button));
    let events = ctx.created().read(&mut created);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EntityKind::Button);
}

#[test]
fn ids_are_write_once_until_cleared() {
    let (mut world, mut ctx, assets) = setup();
    let data = EntityData::Note(NoteData {
        common: EntityCommon { id: Some(EntityId::from("note-a")), ..EntityCommon::default() },
        text: Some("hi".into()),
        ..NoteData::default()
    });
    let entity = world.instant_new_entity(&mut ctx, &assets, &data);
    assert_eq!(world.entity_id(entity), Some(&EntityId::from("note-a")));

    let mut other = EntityData::empty(EntityKind::Note);
    other.common_mut().id = Some(EntityId::from("note-b"));
    assert!(world.populate_data(entity, &assets, &other));
    assert_eq!(world.entity_id(entity), Some(&EntityId::from("note-a")), "id is immutable once set");

    assert!(!world.set_entity_id(entity, EntityId::from("note-b")));
    assert!(world.clear_entity_id(entity));
    assert!(world.set_entity_id(entity, EntityId::from("note-b")));
    assert_eq!(world.find_by_id(&EntityId::from("note-b")), Some(entity));
}

#[test]
fn taken_ids_are_replaced_with_fresh_ones() {
    let (mut world, mut ctx, assets) = setup();
    let mut data = EntityData::empty(EntityKind::Note);
    data.common_mut().id = Some(EntityId::from("shared"));
    let first = world.instant_new_entity(&mut ctx, &assets, &data);
    let second = world.instant_new_entity(&mut ctx, &assets, &data);

    assert_eq!(world.entity_id(first), Some(&EntityId::from("shared")));
    let second_id = world.entity_id(second).cloned().expect("second id");
    assert_ne!(second_id, EntityId::from("shared"));
    assert!(!second_id.is_empty());
    assert_eq!(world.find_by_id(&EntityId::from("shared")), Some(first));
    assert_eq!(world.find_by_id(&second_id), Some(second));

    assert!(world.clear_entity_id(second));
    assert!(!world.set_entity_id(second, EntityId::from("shared")), "a live entity already owns it");
}

#[test]
fn mismatched_kind_partial_is_dropped() {
    let (mut world, mut ctx, assets) = setup();
    let entity = world.instant_new_entity(&mut ctx, &assets, &model_data("wolf"));
    let before = world.entity_data(entity).expect("snapshot");
    let wrong = EntityData::transform_only(EntityKind::Image, moved());
    assert!(!world.populate_data(entity, &assets, &wrong));
    assert_eq!(world.entity_data(entity).expect("snapshot"), before);
}

#[test]
fn start_default_state_uses_configured_clip_and_reset_uses_first() {
    let (mut world, mut ctx, assets) = setup();
    let entity = world.instant_new_entity(
        &mut ctx,
        &assets,
        &EntityData::Model(ModelData {
            asset_id: Some("wolf".into()),
            default_animation: Some(2),
            ..ModelData::default()
        }),
    );
    world.start_default_state(entity);
    let controller = world.animation_controller(entity).expect("wolf has clips");
    assert_eq!(controller.current_index(), 2);
    assert!(controller.is_playing());

    world.reset_entity_state(entity);
    assert_eq!(world.animation_controller(entity).map(|c| c.current_index()), Some(0));

    world.set_default_animation(entity, 9);
    world.start_default_state(entity);
    assert_eq!(
        world.animation_controller(entity).map(|c| c.current_index()),
        Some(0),
        "out-of-range default clip is ignored"
    );
}

#[test]
fn visibility_follows_authored_flag_only_in_default_state() {
    let (mut world, mut ctx, assets) = setup();
    let mut hidden = EntityData::empty(EntityKind::Note);
    hidden.common_mut().is_visible = Some(false);
    let entity = world.instant_new_entity(&mut ctx, &assets, &hidden);

    world.reset_entity_state(entity);
    assert_eq!(world.is_active(entity), Some(true), "editing shows everything");
    world.start_default_state(entity);
    assert_eq!(world.is_active(entity), Some(false));
    assert_eq!(world.entity_data(entity).and_then(|d| d.common().is_visible), Some(false));

    let sound = world.instant_new_entity(
        &mut ctx,
        &assets,
        &EntityData::Sound(SoundData {
            asset_id: Some("chime".into()),
            play_at_start: Some(true),
            ..SoundData::default()
        }),
    );
    world.start_default_state(sound);
    assert_eq!(world.sound_playing(sound), Some(true));
    world.reset_entity_state(sound);
    assert_eq!(world.sound_playing(sound), Some(false));
}

#[test]
fn external_moves_are_reported_once_and_editor_writes_are_not() {
    let (mut world, mut ctx, assets) = setup();
    let entity = world.instant_new_entity(&mut ctx, &assets, &EntityData::empty(EntityKind::Image));
    assert_eq!(world.take_transform_change(entity), None);

    assert!(world.set_transform(entity, &moved()));
    assert_eq!(world.take_transform_change(entity), Some(moved()));
    assert_eq!(world.take_transform_change(entity), None);

    world.populate_data(entity, &assets, &EntityData::transform_only(EntityKind::Image, TransformData::default()));
    assert_eq!(world.take_transform_change(entity), None);
}

#[test]
fn button_actions_drive_targets() {
    let (mut world, mut ctx, assets) = setup();
    let mut model = model_data("wolf");
    model.common_mut().id = Some(EntityId::from("wolf-1"));
    let wolf = world.instant_new_entity(&mut ctx, &assets, &model);
    let mut note = EntityData::empty(EntityKind::Note);
    note.common_mut().id = Some(EntityId::from("note-1"));
    let note = world.instant_new_entity(&mut ctx, &assets, &note);

    let button = world.instant_new_entity(
        &mut ctx,
        &assets,
        &EntityData::Button(ButtonData {
            label: Some("Go".into()),
            actions: Some(vec![
                ButtonAction { target: EntityId::from("note-1"), effect: ButtonEffect::Toggle },
                ButtonAction { target: EntityId::from("wolf-1"), effect: ButtonEffect::PlayAnimation { index: 1 } },
                ButtonAction { target: EntityId::from("missing"), effect: ButtonEffect::Hide },
            ]),
            ..ButtonData::default()
        }),
    );
    assert!(world.is_valid_entity(button));
    assert_eq!(world.activate_button(button), 2, "missing targets are skipped");
    assert_eq!(world.is_active(note), Some(false));
    assert_eq!(world.animation_controller(wolf).map(|c| c.current_index()), Some(1));
}

#[test]
fn despawning_a_model_releases_its_content() {
    let (mut world, mut ctx, assets) = setup();
    let entity = world.instant_new_entity(&mut ctx, &assets, &model_data("wolf"));
    let content = world.model_content(entity).expect("content");
    assert_eq!(world.entity_count(), 1);
    assert!(world.despawn_entity(entity));
    assert!(world.world.get_entity(content).is_err());
    assert!(!world.is_alive(entity));
    assert_eq!(world.entity_count(), 0);
}
