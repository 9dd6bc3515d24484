use spritereel_core::frame::FrameBuffer;
use spritereel_core::hash::hash_frame;
use spritereel_core::{AspectRatio, Color, Sprite};
use spritereel_render::renderer::GROUND_LINE;
use spritereel_render::{compose_sheet, find_floor, AnchorCache, Background, FrameRenderer, FrameSettings};

/// Opaque body on top, `pad` fully transparent rows underneath.
fn sprite_with_bottom_padding(w: u32, h: u32, pad: u32, color: Color) -> Sprite {
    let mut fb = FrameBuffer::new(w, h);
    fb.fill_rect(0, 0, w, h - pad, &color);
    Sprite::new(format!("pad{}", pad), fb)
}

fn render_hash(sprite: &Sprite, settings: &FrameSettings) -> String {
    let mut renderer = FrameRenderer::new(settings.aspect);
    let mut anchors = AnchorCache::new(settings.background.color());
    renderer.render(Some(sprite), settings, &mut anchors);
    hash_frame(renderer.surface().pixels()).to_hex()
}

#[test]
fn test_conformance_01_sheet_three_sprites_two_columns() {
    let sprites = vec![
        Sprite::new("a", FrameBuffer::solid(64, 64, &Color::RED)),
        Sprite::new("b", FrameBuffer::solid(64, 96, &Color::GREEN)),
        Sprite::new("c", FrameBuffer::solid(96, 64, &Color::BLUE)),
    ];
    let sheet = compose_sheet(&sprites, 2).expect("non-empty sheet");

    assert_eq!(sheet.image.width, 2 * 96);
    assert_eq!(sheet.image.height, 3u32.div_ceil(2) * 96);

    for (index, (sprite, placement)) in sprites.iter().zip(&sheet.layout.placements).enumerate() {
        assert_eq!(placement.id, sprite.id());
        let index = index as u32;
        let cell_x = (index % 2) * 96;
        let cell_y = (index / 2) * 96;
        // Equal margins on both sides of the sprite inside its cell.
        let left = placement.x - cell_x;
        let right = cell_x + 96 - (placement.x + sprite.width());
        let top = placement.y - cell_y;
        let bottom = cell_y + 96 - (placement.y + sprite.height());
        assert_eq!(left, right, "{} horizontally centered", sprite.name());
        assert_eq!(top, bottom, "{} vertically centered", sprite.name());
    }
}

#[test]
fn test_conformance_02_floor_ignores_transparent_bottom_rows() {
    let sprite = sprite_with_bottom_padding(32, 48, 10, Color::rgb(20, 120, 60));
    let background = Color::from_hex("#ffffff").unwrap();
    assert_eq!(find_floor(sprite.image(), &background), 48 - 10 - 1);
    assert_ne!(find_floor(sprite.image(), &background), 48 - 1);
}

#[test]
fn test_conformance_03_render_is_deterministic() {
    let sprite = sprite_with_bottom_padding(40, 40, 6, Color::rgb(240, 30, 30));
    let settings = FrameSettings {
        aspect: AspectRatio::PORTRAIT_9_16,
        background: Background::solid("#1e1e2e"),
        zoom_percent: 75,
    };
    assert_eq!(render_hash(&sprite, &settings), render_hash(&sprite, &settings));

    let zoomed = FrameSettings {
        zoom_percent: 40,
        ..settings.clone()
    };
    assert_ne!(render_hash(&sprite, &settings), render_hash(&sprite, &zoomed));
}

#[test]
fn test_conformance_04_different_padding_same_ground_line() {
    let settings = FrameSettings {
        aspect: AspectRatio::SQUARE,
        background: Background::solid("#ffffff"),
        zoom_percent: 100,
    };
    let tight = sprite_with_bottom_padding(64, 64, 0, Color::BLACK);
    let loose = sprite_with_bottom_padding(64, 64, 20, Color::BLACK);

    let mut anchors = AnchorCache::new(settings.background.color());
    let mut renderer = FrameRenderer::new(settings.aspect);

    let mut ground_rows = Vec::new();
    for sprite in [&tight, &loose] {
        renderer.render(Some(sprite), &settings, &mut anchors);
        let placement = renderer.last_placement().unwrap();
        assert!((placement.floor_y() - 320.0 * GROUND_LINE).abs() < 1e-9);

        // Lowest dark pixel in the center column of the captured frame.
        let pixels = renderer.surface().pixels();
        let x = pixels.width / 2;
        let lowest = (0..pixels.height)
            .rev()
            .find(|&y| pixels.get_pixel(x, y) == Some([0, 0, 0, 255]))
            .unwrap();
        ground_rows.push(lowest);
    }
    assert!(ground_rows[0].abs_diff(ground_rows[1]) <= 1, "{:?}", ground_rows);
}
