use glam::Vec2;

use crate::components::layer::WorldLayer;
use crate::components::object::GameObject;
use crate::components::sprite::Visual;
use crate::components::tilemap::TileLayer;
use crate::core::math::Aabb;
use crate::renderer::instance::{RenderBuffer, RenderInstance};
use crate::world::World;

/// Atlas holding the level tileset.
pub const TILE_ATLAS: u32 = 8;
/// Tileset cells per atlas row. Tile id `n` maps to cell `n - 1`.
pub const TILESET_COLUMNS: u32 = 16;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Draw data for one object, or `None` when it should not be drawn.
pub fn object_instance(obj: &GameObject) -> Option<RenderInstance> {
    if !obj.visible || obj.destroyed || !obj.appearance.is_drawable() {
        return None;
    }
    let look = &obj.appearance;
    let size = obj.body.size * look.scale;
    let top_left = obj.body.position + (obj.body.size - size) * 0.5;
    let mut inst = RenderInstance {
        x: top_left.x,
        y: top_left.y,
        width: size.x,
        height: size.y,
        rotation: look.rotation,
        alpha: look.opacity,
        flip_x: if look.flip_x { 1.0 } else { 0.0 },
        tint: WHITE,
        ..Default::default()
    };
    match look.visual {
        Visual::None => return None,
        Visual::Color(rgba) => inst.tint = rgba,
        Visual::Sprite { atlas, col, row } => {
            inst.textured = 1.0;
            inst.atlas = atlas.0 as f32;
            inst.sprite_col = col;
            inst.sprite_row = row;
        }
    }
    if let Some((flash, _)) = look.flash {
        inst.tint = flash;
    }
    Some(inst)
}

fn push_tiles(layer: &TileLayer, view: &Aabb, buffer: &mut RenderBuffer) {
    let size = Vec2::splat(layer.tile_size);
    for (col, row, id) in layer.visible_tiles(view) {
        let pos = layer.tile_to_world(col, row);
        let cell = id - 1;
        buffer.push(RenderInstance {
            x: pos.x,
            y: pos.y,
            width: size.x,
            height: size.y,
            alpha: 1.0,
            textured: 1.0,
            atlas: TILE_ATLAS as f32,
            sprite_col: (cell % TILESET_COLUMNS) as f32,
            sprite_row: (cell / TILESET_COLUMNS) as f32,
            tint: WHITE,
            ..Default::default()
        });
    }
}

/// Build the frame's draw list: every layer back to front, objects in
/// z-index order, culled against the camera view.
///
/// Background tiles open the background layer, collision tiles the tiles
/// layer, and foreground tiles draw at the start of the effects layer.
pub fn build_render_buffer(world: &World, buffer: &mut RenderBuffer) {
    buffer.clear();
    let view = world.camera().view_rect();
    let level = world.level();

    for layer in WorldLayer::ALL {
        buffer.begin_layer(layer);
        match layer {
            WorldLayer::Background => push_tiles(&level.background, &view, buffer),
            WorldLayer::Tiles => push_tiles(&level.collision, &view, buffer),
            WorldLayer::Effects => push_tiles(&level.foreground, &view, buffer),
            _ => {}
        }
        for obj in world.objects_in_layer(layer) {
            if layer != WorldLayer::Ui && !world.camera().is_rect_visible(&obj.bounds()) {
                continue;
            }
            if let Some(inst) = object_instance(obj) {
                buffer.push(inst);
            }
        }
    }
    buffer.end_layer();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::sprite::{Appearance, AtlasId};
    use crate::world::level::LevelData;

    #[test]
    fn colored_and_sprite_objects() {
        let flat = GameObject::new("box")
            .with_pos(Vec2::new(10.0, 20.0))
            .with_size(Vec2::new(4.0, 8.0))
            .with_appearance(Appearance::color([1.0, 0.0, 0.0, 1.0]));
        let inst = object_instance(&flat).expect("drawable");
        assert_eq!((inst.x, inst.y, inst.width, inst.height), (10.0, 20.0, 4.0, 8.0));
        assert_eq!(inst.textured, 0.0);
        assert_eq!(inst.tint, [1.0, 0.0, 0.0, 1.0]);

        let mut sprite = GameObject::new("hero").with_appearance(Appearance::sprite(AtlasId(2), 3.0, 1.0));
        sprite.appearance.flip_x = true;
        sprite.appearance.scale = 2.0;
        let inst = object_instance(&sprite).expect("drawable");
        assert_eq!((inst.atlas, inst.sprite_col, inst.sprite_row, inst.flip_x), (2.0, 3.0, 1.0, 1.0));
        assert_eq!((inst.x, inst.width), (-16.0, 64.0));
    }

    #[test]
    fn hidden_and_collision_only_objects_are_skipped() {
        let mut hidden = GameObject::new("ghost").with_appearance(Appearance::color(WHITE));
        hidden.visible = false;
        assert!(object_instance(&hidden).is_none());
        assert!(object_instance(&GameObject::new("tile")).is_none());
    }

    #[test]
    fn frame_is_layered_and_culled() {
        let mut world = World::default();
        let mut level = LevelData::default();
        level.id = "r".into();
        level.properties.width = 100;
        level.properties.height = 4;
        level.properties.tile_size = 32.0;
        level.layers.collision = vec![0; 400];
        level.layers.collision[300] = 1;
        level.layers.collision[399] = 17;
        world.load_level(&level).expect("level loads");

        let near = GameObject::new("near")
            .with_pos(Vec2::new(50.0, 40.0))
            .with_layer(WorldLayer::Player)
            .with_appearance(Appearance::color(WHITE));
        let far = GameObject::new("far")
            .with_pos(Vec2::new(3000.0, 40.0))
            .with_layer(WorldLayer::Entities)
            .with_appearance(Appearance::color(WHITE));
        world.add_object(near);
        world.add_object(far);
        world.update(1.0 / 60.0, &crate::api::services::NullInput);

        let mut buffer = RenderBuffer::new();
        build_render_buffer(&world, &mut buffer);
        let layers: Vec<WorldLayer> = buffer.batches.iter().map(|b| b.layer).collect();
        assert_eq!(layers, vec![WorldLayer::Tiles, WorldLayer::Player]);
        // Only the tile near the origin is on screen.
        let tiles = buffer.batch(WorldLayer::Tiles).map(|b| buffer.slice(b)).unwrap_or_default();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].atlas, TILE_ATLAS as f32);
    }
}
