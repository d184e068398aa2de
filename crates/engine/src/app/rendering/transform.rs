use crate::world::Camera;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Top-left screen pixel of world tile `(x, y)` under `camera`.
pub fn tile_to_screen_px(camera: &Camera, x: i32, y: i32, tile_size_px: u32) -> (i32, i32) {
    let tile = tile_size_px as i32;
    (camera.viewport_x(x) * tile, camera.viewport_y(y) * tile)
}

/// Uniform scale and top-left origin that fit a `cols x rows` grid inside
/// `viewport`, centered. The scale is at least one pixel per tile.
pub fn fit_grid_to_viewport(cols: i32, rows: i32, viewport: Viewport) -> (u32, i32, i32) {
    let cols = cols.max(1) as u32;
    let rows = rows.max(1) as u32;
    let scale = (viewport.width / cols).min(viewport.height / rows).max(1);
    let left = (viewport.width as i32 - (cols * scale) as i32) / 2;
    let top = (viewport.height as i32 - (rows * scale) as i32) / 2;
    (scale, left, top)
}
