use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{ActorPose, Backdrop, FrameView, OverlayMode, WorldView};
use crate::asset_keys::validate_asset_key;
use crate::world::{Direction, EntityKind, TileGrid, TileKind, TileRect};

use super::{fit_grid_to_viewport, tile_to_screen_px, Viewport};

const CLEAR_COLOR_WORLD: [u8; 4] = [12, 18, 28, 255];
const CLEAR_COLOR_TITLE: [u8; 4] = [18, 32, 58, 255];
const CLEAR_COLOR_INTERSTITIAL: [u8; 4] = [0, 0, 0, 255];
const TILE_FALLBACK_GRASS_COLOR: [u8; 4] = [74, 112, 56, 255];
const TILE_FALLBACK_WATER_COLOR: [u8; 4] = [38, 86, 150, 255];
const TILE_FALLBACK_SAND_COLOR: [u8; 4] = [196, 176, 120, 255];
const TILE_FALLBACK_FLOOR_LIGHT_COLOR: [u8; 4] = [150, 140, 128, 255];
const TILE_FALLBACK_FLOOR_DARK_COLOR: [u8; 4] = [112, 104, 96, 255];
const TILE_FALLBACK_CARPET_EDGE_COLOR: [u8; 4] = [120, 20, 30, 255];
const TILE_FALLBACK_CARPET_COLOR: [u8; 4] = [160, 28, 40, 255];
const TILE_FALLBACK_DOOR_COLOR: [u8; 4] = [110, 72, 40, 255];
const DOOR_MARK_COLOR: [u8; 4] = [255, 210, 70, 255];
const ENTITY_OUTLINE_COLOR: [u8; 4] = [20, 20, 24, 255];
const ACTOR_COLOR: [u8; 4] = [220, 220, 240, 255];
const ACTOR_FACING_COLOR: [u8; 4] = [255, 120, 120, 255];
const MAP_ACTOR_COLOR: [u8; 4] = [255, 60, 60, 255];
const SETTINGS_DIM_NUMERATOR: u16 = 2;
const SETTINGS_DIM_DENOMINATOR: u16 = 5;
const TITLE_SPRITE_KEY: &str = "ui/title";
const INTERSTITIAL_SPRITE_KEY: &str = "ui/narrative";

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Lazily decoded sprites keyed by asset key. A key that fails to resolve is
/// cached as absent and warned about once; callers fall back to flat colors.
struct SpriteCache {
    asset_root: PathBuf,
    entries: HashMap<String, Option<LoadedSprite>>,
    warned_missing_keys: HashSet<String>,
}

impl SpriteCache {
    fn new(asset_root: PathBuf) -> Self {
        Self {
            asset_root,
            entries: HashMap::new(),
            warned_missing_keys: HashSet::new(),
        }
    }

    fn get(&mut self, key: &str) -> Option<&LoadedSprite> {
        if !self.entries.contains_key(key) {
            let sprite = match resolve_sprite_image_path(&self.asset_root, key) {
                Ok(path) => match load_sprite_rgba(&path) {
                    Ok(sprite) => Some(sprite),
                    Err(reason) => {
                        warn_sprite_load_once(
                            &mut self.warned_missing_keys,
                            key,
                            Some(path.as_path()),
                            reason.as_str(),
                        );
                        None
                    }
                },
                Err(reason) => {
                    warn_sprite_load_once(&mut self.warned_missing_keys, key, None, reason.as_str());
                    None
                }
            };
            self.entries.insert(key.to_string(), sprite);
        }
        self.entries.get(key).and_then(Option::as_ref)
    }
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    tile_size_px: u32,
    sprites: SpriteCache,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf, tile_size_px: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            tile_size_px: tile_size_px.max(1),
            sprites: SpriteCache::new(asset_root),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_frame(&mut self, view: &FrameView<'_>) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let viewport = self.viewport;
        let tile_size_px = self.tile_size_px;
        let sprites = &mut self.sprites;
        let frame = self.pixels.frame_mut();

        match view {
            FrameView::Backdrop(backdrop) => draw_backdrop(frame, viewport, *backdrop, sprites),
            FrameView::World(world) if world.overlay == OverlayMode::Map => {
                clear(frame, CLEAR_COLOR_WORLD);
                draw_scene_map(frame, viewport, world, sprites);
            }
            FrameView::World(world) => {
                clear(frame, CLEAR_COLOR_WORLD);
                draw_world(frame, viewport, tile_size_px, world, sprites);
                if world.overlay == OverlayMode::Settings {
                    dim_frame(frame);
                }
            }
        }

        self.pixels.render()
    }
}

fn draw_backdrop(frame: &mut [u8], viewport: Viewport, backdrop: Backdrop, sprites: &mut SpriteCache) {
    let (clear_color, key) = match backdrop {
        Backdrop::Title => (CLEAR_COLOR_TITLE, TITLE_SPRITE_KEY),
        Backdrop::Interstitial => (CLEAR_COLOR_INTERSTITIAL, INTERSTITIAL_SPRITE_KEY),
    };
    clear(frame, clear_color);
    if let Some(sprite) = sprites.get(key) {
        draw_sprite_fitted(
            frame,
            viewport,
            TileRect::new(0, 0, viewport.width as i32, viewport.height as i32),
            sprite,
        );
    }
}

fn draw_world(
    frame: &mut [u8],
    viewport: Viewport,
    tile_size_px: u32,
    view: &WorldView<'_>,
    sprites: &mut SpriteCache,
) {
    let grid = view.grid;
    let camera = view.camera;
    let tile = tile_size_px as i32;
    let visible = camera.visible_world_area();

    let background_drawn = match grid.background_key().and_then(|key| sprites.get(key)) {
        Some(sprite) => {
            let (left, top) = tile_to_screen_px(camera, 0, 0, tile_size_px);
            let dest = TileRect::new(left, top, grid.cols() * tile, grid.rows() * tile);
            draw_sprite_fitted(frame, viewport, dest, sprite);
            true
        }
        None => false,
    };

    for y in visible.y..visible.y + visible.height {
        for x in visible.x..visible.x + visible.width {
            let (left, top) = tile_to_screen_px(camera, x, y, tile_size_px);
            let dest = TileRect::new(left, top, tile, tile);
            if !background_drawn {
                if let Some(kind) = grid.get(x, y) {
                    match sprites.get(kind.asset_key()) {
                        Some(sprite) => draw_sprite_fitted(frame, viewport, dest, sprite),
                        None => draw_rect(frame, viewport, dest, tile_fallback_color(kind)),
                    }
                }
            }
            if grid.is_exit(x, y) {
                match sprites.get(TileKind::Door.asset_key()) {
                    Some(sprite) if background_drawn => {
                        draw_sprite_fitted(frame, viewport, dest, sprite)
                    }
                    _ => draw_rect_outline(frame, viewport, dest, DOOR_MARK_COLOR),
                }
            }
        }
    }

    for placement in &view.entities {
        let (width, height) = placement.kind.footprint();
        let footprint = TileRect::new(placement.pos.x, placement.pos.y, width, height);
        if !footprint.intersects(&visible) {
            continue;
        }
        let (left, top) = tile_to_screen_px(camera, placement.pos.x, placement.pos.y, tile_size_px);
        let dest = TileRect::new(left, top, width * tile, height * tile);
        match sprites.get(placement.kind.asset_key()) {
            Some(sprite) => draw_sprite_fitted(frame, viewport, dest, sprite),
            None => {
                draw_rect(frame, viewport, dest, entity_fallback_color(placement.kind));
                draw_rect_outline(frame, viewport, dest, ENTITY_OUTLINE_COLOR);
            }
        }
    }

    draw_actor(frame, viewport, tile_size_px, view, sprites);
}

fn draw_actor(
    frame: &mut [u8],
    viewport: Viewport,
    tile_size_px: u32,
    view: &WorldView<'_>,
    sprites: &mut SpriteCache,
) {
    let ActorPose { pos, facing } = view.actor;
    let tile = tile_size_px as i32;
    let (left, top) = tile_to_screen_px(view.camera, pos.x, pos.y, tile_size_px);
    let dest = TileRect::new(left, top, tile, tile);
    if let Some(sprite) = sprites.get(actor_sprite_key(facing)) {
        draw_sprite_fitted(frame, viewport, dest, sprite);
        return;
    }

    let inset = (tile / 8).max(1);
    let body = TileRect::new(left + inset, top + inset, tile - 2 * inset, tile - 2 * inset);
    draw_rect(frame, viewport, body, ACTOR_COLOR);
    let notch = (tile / 4).max(1);
    let center_x = left + tile / 2;
    let center_y = top + tile / 2;
    let (dx, dy) = facing.offset();
    let notch_rect = TileRect::new(
        center_x + dx * (tile / 2 - notch) - notch / 2,
        center_y + dy * (tile / 2 - notch) - notch / 2,
        notch,
        notch,
    );
    draw_rect(frame, viewport, notch_rect, ACTOR_FACING_COLOR);
}

fn draw_scene_map(
    frame: &mut [u8],
    viewport: Viewport,
    view: &WorldView<'_>,
    sprites: &mut SpriteCache,
) {
    let grid = view.grid;
    let (scale, origin_x, origin_y) = fit_grid_to_viewport(grid.cols(), grid.rows(), viewport);
    let cell = scale as i32;
    let cell_rect = |x: i32, y: i32, width: i32, height: i32| {
        TileRect::new(origin_x + x * cell, origin_y + y * cell, width * cell, height * cell)
    };

    match grid.background_key().and_then(|key| sprites.get(key)) {
        Some(sprite) => draw_sprite_fitted(frame, viewport, cell_rect(0, 0, grid.cols(), grid.rows()), sprite),
        None => draw_map_cells(frame, viewport, grid, &cell_rect),
    }

    for exit in grid.exit_cells() {
        draw_rect(frame, viewport, cell_rect(exit.x, exit.y, 1, 1), DOOR_MARK_COLOR);
    }
    for placement in &view.entities {
        let (width, height) = placement.kind.footprint();
        let dest = cell_rect(placement.pos.x, placement.pos.y, width, height);
        draw_rect(frame, viewport, dest, entity_fallback_color(placement.kind));
    }
    let actor = view.actor.pos;
    draw_rect(frame, viewport, cell_rect(actor.x, actor.y, 1, 1), MAP_ACTOR_COLOR);
}

fn draw_map_cells(
    frame: &mut [u8],
    viewport: Viewport,
    grid: &TileGrid,
    cell_rect: impl Fn(i32, i32, i32, i32) -> TileRect,
) {
    for y in 0..grid.rows() {
        for x in 0..grid.cols() {
            if let Some(kind) = grid.get(x, y) {
                draw_rect(frame, viewport, cell_rect(x, y, 1, 1), tile_fallback_color(kind));
            }
        }
    }
}

fn actor_sprite_key(facing: Direction) -> &'static str {
    match facing {
        Direction::Up => "player/up",
        Direction::Down => "player/down",
        Direction::Left => "player/left",
        Direction::Right => "player/right",
    }
}

fn tile_fallback_color(kind: TileKind) -> [u8; 4] {
    match kind {
        TileKind::Grass => TILE_FALLBACK_GRASS_COLOR,
        TileKind::Water => TILE_FALLBACK_WATER_COLOR,
        TileKind::Sand => TILE_FALLBACK_SAND_COLOR,
        TileKind::Tile1 => TILE_FALLBACK_FLOOR_LIGHT_COLOR,
        TileKind::Tile2 => TILE_FALLBACK_FLOOR_DARK_COLOR,
        TileKind::CarpetLeft | TileKind::CarpetRight => TILE_FALLBACK_CARPET_EDGE_COLOR,
        TileKind::CarpetMiddle => TILE_FALLBACK_CARPET_COLOR,
        TileKind::Door => TILE_FALLBACK_DOOR_COLOR,
    }
}

fn entity_fallback_color(kind: EntityKind) -> [u8; 4] {
    match kind {
        EntityKind::NpcKing => [200, 160, 40, 255],
        EntityKind::Charles => [190, 60, 60, 255],
        EntityKind::Kawal => [90, 90, 110, 255],
        EntityKind::Sailor1 => [70, 120, 200, 255],
        EntityKind::Sailor2 => [60, 160, 150, 255],
        EntityKind::Humabon => [170, 90, 190, 255],
    }
}

fn resolve_sprite_image_path(asset_root: &Path, key: &str) -> Result<PathBuf, String> {
    validate_asset_key(key).map_err(|error| format!("invalid_key:{error}"))?;
    Ok(asset_root.join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

fn clear(frame: &mut [u8], color: [u8; 4]) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&color);
    }
}

fn dim_frame(frame: &mut [u8]) {
    for chunk in frame.chunks_exact_mut(4) {
        for channel in &mut chunk[..3] {
            *channel = (*channel as u16 * SETTINGS_DIM_NUMERATOR / SETTINGS_DIM_DENOMINATOR) as u8;
        }
    }
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

/// Clips `rect` (screen pixels) to the viewport; `None` when nothing remains.
fn clip_to_viewport(rect: TileRect, viewport: Viewport) -> Option<(i32, i32, i32, i32)> {
    let left = rect.x.max(0);
    let top = rect.y.max(0);
    let right = (rect.x + rect.width).min(viewport.width as i32);
    let bottom = (rect.y + rect.height).min(viewport.height as i32);
    (left < right && top < bottom).then_some((left, top, right, bottom))
}

fn draw_rect(frame: &mut [u8], viewport: Viewport, rect: TileRect, color: [u8; 4]) {
    let Some((left, top, right, bottom)) = clip_to_viewport(rect, viewport) else {
        return;
    };
    for y in top..bottom {
        for x in left..right {
            write_pixel_rgba_clipped(frame, viewport.width as usize, x, y, color);
        }
    }
}

fn draw_rect_outline(frame: &mut [u8], viewport: Viewport, rect: TileRect, color: [u8; 4]) {
    if rect.is_empty() {
        return;
    }
    let width = viewport.width as usize;
    let right = rect.x + rect.width - 1;
    let bottom = rect.y + rect.height - 1;
    for x in rect.x..=right {
        write_pixel_rgba_clipped(frame, width, x, rect.y, color);
        write_pixel_rgba_clipped(frame, width, x, bottom, color);
    }
    for y in rect.y..=bottom {
        write_pixel_rgba_clipped(frame, width, rect.x, y, color);
        write_pixel_rgba_clipped(frame, width, right, y, color);
    }
}

/// Nearest-neighbour blit of `sprite` stretched over `dest`; fully
/// transparent source pixels are skipped.
fn draw_sprite_fitted(frame: &mut [u8], viewport: Viewport, dest: TileRect, sprite: &LoadedSprite) {
    if sprite.width == 0 || sprite.height == 0 || dest.is_empty() {
        return;
    }
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len {
        return;
    }
    let Some((left, top, right, bottom)) = clip_to_viewport(dest, viewport) else {
        return;
    };

    let frame_width = viewport.width as usize;
    let sprite_width = sprite.width as usize;

    for out_y in top..bottom {
        let dy = (out_y - dest.y) as u64;
        let src_y = (dy * sprite.height as u64 / dest.height as u64).min(sprite.height as u64 - 1);
        let src_row_offset = src_y as usize * sprite_width * 4;
        let dst_row_offset = out_y as usize * frame_width * 4;

        for out_x in left..right {
            let dx = (out_x - dest.x) as u64;
            let src_x = (dx * sprite.width as u64 / dest.width as u64).min(sprite.width as u64 - 1);
            let src_offset = src_row_offset + src_x as usize * 4;
            let alpha = sprite.rgba[src_offset + 3];
            if alpha == 0 {
                continue;
            }
            let dst_offset = dst_row_offset + out_x as usize * 4;
            if dst_offset + 4 > frame.len() {
                continue;
            }
            frame[dst_offset..dst_offset + 3].copy_from_slice(&sprite.rgba[src_offset..src_offset + 3]);
            frame[dst_offset + 3] = alpha;
        }
    }
}
