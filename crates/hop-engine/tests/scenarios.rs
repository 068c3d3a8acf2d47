//! End-to-end runs through a live world.

use hop_engine::entities::player::actions;
use hop_engine::{
    ActionState, EnemyConfig, EnemyKind, GameState, NullInput, ObjectId, Vec2, World, WorldLayer,
};

const DT: f32 = 1.0 / 60.0;
const GROUND_TOP: f32 = 288.0;

/// 30x10 tiles of 32 with a solid bottom row, plus optional extra JSON.
fn level_json(entities: &str, checkpoints: &str) -> String {
    let mut collision = vec!["0"; 300];
    for tile in collision.iter_mut().skip(270) {
        *tile = "1";
    }
    format!(
        r##"{{
            "id": "meadow",
            "properties": {{ "width": 30, "height": 10, "tileSize": 32, "gravity": 800, "backgroundColor": "#6495ed" }},
            "layers": {{ "collision": [{}], "entities": [{entities}] }},
            "checkpoints": [{checkpoints}]
        }}"##,
        collision.join(",")
    )
}

fn step(world: &mut World, frames: usize) {
    for _ in 0..frames {
        world.update(DT, &NullInput);
    }
}

#[test]
fn falling_player_comes_to_rest_on_the_ground() {
    let mut world = World::default();
    let spawn = r#"{ "type": "player_spawn", "x": 100, "y": 206 }"#;
    let report = world.load_level_json(&level_json(spawn, "")).expect("level loads");
    assert_eq!(report.player_spawn, Some(Vec2::new(100.0, 206.0)));
    assert_eq!(report.tile_colliders, 1);

    let id = world.spawn_player(world.spawn_point());
    // 50 units under gravity 800 takes about 0.35 s; give it a full second.
    step(&mut world, 60);

    let player = world.get(id).expect("player is live");
    let bottom = player.bounds().max.y;
    assert!((bottom - GROUND_TOP).abs() < 0.5, "player bottom at {bottom}");
    assert!(player.body.velocity.y.abs() < 0.5, "vy = {}", player.body.velocity.y);
    assert!(world.physics().is_grounded(player));
    assert!(player.behavior.as_player().is_some_and(|p| p.grounded));
}

#[test]
fn patrolling_enemy_turns_at_its_patrol_distance() {
    let mut world = World::default();
    world.load_level_json(&level_json("", "")).expect("level loads");
    let config = EnemyConfig {
        patrol_distance: 100.0,
        ..EnemyConfig::default()
    };
    let start_x = 300.0;
    let id = world.spawn_enemy(Vec2::new(start_x, GROUND_TOP - config.size.y), EnemyKind::Basic, config);

    let mut last_x = start_x;
    let mut turned_at = None;
    for _ in 0..240 {
        step(&mut world, 1);
        let enemy = world.get(id).expect("enemy is live");
        if enemy.body.velocity.x < 0.0 {
            turned_at = Some(last_x);
            break;
        }
        last_x = enemy.body.position.x;
    }
    let turned_at = turned_at.expect("enemy reversed");
    let travelled = turned_at - start_x;
    // Within one frame's movement (60 units/s) of the patrol distance.
    assert!((travelled - 100.0).abs() <= 1.5, "turned after {travelled}");
}

#[test]
fn objects_spawned_mid_frame_go_live_next_frame() {
    let mut world = World::default();
    world.load_level_json(&level_json("", "")).expect("level loads");
    let player = world.spawn_player(Vec2::new(100.0, 200.0));
    step(&mut world, 30);
    if let Some(p) = world.get_mut(player).and_then(|o| o.behavior.as_player_mut()) {
        assert!(p.unlock_ability("fireball", 1));
    }

    let mut input = ActionState::new();
    input.set_action(actions::FIREBALL, true);
    world.update(DT, &input);
    input.end_frame();

    assert!(world.find_by_tag("projectile").is_none());
    assert_eq!(world.pending_objects().filter(|o| o.has_tag("projectile")).count(), 1);

    world.update(DT, &input);
    let shot = world.find_by_tag("projectile").expect("projectile is live").id;
    assert!(world.objects_in_layer(WorldLayer::Projectiles).iter().any(|o| o.id == shot));

    if let Some(obj) = world.get_mut(shot) {
        obj.destroy();
    }
    world.update(DT, &input);
    assert!(world.get(shot).is_none());
    assert!(world.objects_in_layer(WorldLayer::Projectiles).is_empty());
}

#[test]
fn save_and_restore_through_a_live_world() {
    let spawn = r#"{ "type": "player_spawn", "x": 100, "y": 200 }"#;
    let checkpoint = r#"{ "id": "cp_start", "x": 100, "y": 240 }"#;
    let text = level_json(spawn, checkpoint);

    let mut world = World::default();
    world.load_level_json(&text).expect("level loads");
    let id = world.spawn_player(world.spawn_point());
    step(&mut world, 60);
    assert_eq!(world.current_checkpoint(), Some("cp_start"));
    let events = world.drain_events();
    assert!(events.iter().any(|e| e.name() == "checkpointActivated"));

    if let Some(p) = world.get_mut(id).and_then(|o| o.behavior.as_player_mut()) {
        p.unlock_ability("double_jump", 1);
        p.add_score(250);
    }
    world.set_flag("met_guide", true);
    let json = world.save_game_state().to_json().expect("state serializes");

    let mut restored = World::default();
    restored.load_level_json(&text).expect("level loads");
    let state = GameState::from_json(&json).expect("state parses");
    restored.load_game_state(&state);
    let id: ObjectId = restored.spawn_player(restored.spawn_point());
    step(&mut restored, 1);

    assert!(restored.flag("met_guide"));
    assert_eq!(restored.current_checkpoint(), Some("cp_start"));
    assert_eq!(restored.respawn_point(), world.respawn_point());
    let player = restored.get(id).and_then(|o| o.behavior.as_player()).expect("player");
    assert_eq!(player.score, 250);
    assert_eq!(player.get_ability_level("double_jump"), 1);
    assert!(restored.clock().elapsed >= world.clock().elapsed);
}
