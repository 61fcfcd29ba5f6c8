use std::collections::HashMap;

use macroquad::prelude::*;
use tiled_layers::render::{camera_bounds, draw_layer_debug, tile_outline, visible_tiles};
use tiled_layers::{Map, MapConfig, MapGeometry, Orientation, StaggerAxis, StaggerParity, Tileset};

fn window_conf() -> Conf {
    Conf {
        window_title: "Layer debug grid".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

fn build_map() -> tiled_layers::Result<Map> {
    let geo = MapGeometry::new(Orientation::Hexagonal, 24, 16, 32, 28)?
        .with_stagger(StaggerAxis::X, StaggerParity::Odd)
        .with_hex_side_length(16);
    let mut map = Map::new(geo, MapConfig::default());
    map.add_tileset(Tileset::new("hex", 32, 28, 2, 2)?, 1)?;

    let attrs = HashMap::from([("name".to_owned(), "ground".to_owned())]);
    let layer = map.new_tile_layer(&attrs)?;
    map.add_layer(layer);

    let data: Vec<u32> = (0..24 * 16).map(|i| (i % 3 == 0) as u32).collect();
    map.set_layer_data("ground", &data)?;
    map.ensure_debug_overlay("ground")?.set_debug_draw(true);
    Ok(map)
}

#[macroquad::main(window_conf)]
async fn main() {
    let mut map = build_map().expect("Failed to build map");
    let camera = Camera2D::from_display_rect(Rect::new(0.0, 0.0, 1280.0, 720.0));

    loop {
        clear_background(DARKGRAY);

        let (x, y) = mouse_position();
        let world = camera.screen_to_world(vec2(x, y));
        let hovered = map.coordinate_for_point(world);

        set_camera(&camera);
        let (view_min, view_max) = camera_bounds(&camera);
        for layer in map.top_level_layers() {
            for tile in visible_tiles(layer, view_min, view_max) {
                let outline = tile_outline(layer.geometry(), tile.coord());
                for (a, b) in outline.iter().zip(outline.iter().cycle().skip(1)) {
                    draw_line(a.x, a.y, b.x, b.y, 1.0, SKYBLUE);
                }
                let at = layer.tile_position(tile);
                draw_circle(at.x, at.y, 2.0, ORANGE);
            }
            draw_layer_debug(layer);
        }
        if map.geometry().is_valid(hovered) {
            let outline = tile_outline(map.geometry(), hovered);
            for (a, b) in outline.iter().zip(outline.iter().cycle().skip(1)) {
                draw_line(a.x, a.y, b.x, b.y, 3.0, YELLOW);
            }
        }
        map.finish_rendering();

        set_default_camera();
        draw_text(&format!("tile {hovered}"), 20.0, 40.0, 30.0, WHITE);

        next_frame().await;
    }
}
