use super::TileRect;

/// Integer tile-space camera.
///
/// Per axis, a scene no larger than the viewport is centered (the offset may
/// go negative); a larger scene follows the target and is clamped to
/// `[0, scene - viewport]`.
///
/// Visibility is also decided per axis: a centered axis spans the whole scene
/// and a scrolling axis spans the viewport. One centered axis does not make
/// the whole scene visible, so `is_visible` always agrees with
/// `visible_world_area`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Camera {
    x: i32,
    y: i32,
    viewport_cols: i32,
    viewport_rows: i32,
    scene_cols: i32,
    scene_rows: i32,
}

impl Camera {
    pub fn new(viewport_cols: i32, viewport_rows: i32) -> Self {
        Self {
            x: 0,
            y: 0,
            viewport_cols: viewport_cols.max(1),
            viewport_rows: viewport_rows.max(1),
            scene_cols: 0,
            scene_rows: 0,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn viewport_size(&self) -> (i32, i32) {
        (self.viewport_cols, self.viewport_rows)
    }

    pub fn scene_size(&self) -> (i32, i32) {
        (self.scene_cols, self.scene_rows)
    }

    pub fn set_viewport(&mut self, cols: i32, rows: i32) {
        self.viewport_cols = cols.max(1);
        self.viewport_rows = rows.max(1);
    }

    pub fn update(&mut self, target_x: i32, target_y: i32, scene_cols: i32, scene_rows: i32) {
        self.scene_cols = scene_cols.max(0);
        self.scene_rows = scene_rows.max(0);
        self.x = axis_offset(target_x, self.scene_cols, self.viewport_cols);
        self.y = axis_offset(target_y, self.scene_rows, self.viewport_rows);
    }

    pub fn is_centered_x(&self) -> bool {
        self.scene_cols <= self.viewport_cols
    }

    pub fn is_centered_y(&self) -> bool {
        self.scene_rows <= self.viewport_rows
    }

    pub fn visible_world_area(&self) -> TileRect {
        let (x, width) = if self.is_centered_x() {
            (0, self.scene_cols)
        } else {
            (self.x, self.viewport_cols)
        };
        let (y, height) = if self.is_centered_y() {
            (0, self.scene_rows)
        } else {
            (self.y, self.viewport_rows)
        };
        TileRect::new(x, y, width, height)
    }

    pub fn is_visible(&self, world_x: i32, world_y: i32) -> bool {
        self.visible_world_area().contains(world_x, world_y)
    }

    pub fn viewport_x(&self, world_x: i32) -> i32 {
        world_x - self.x
    }

    pub fn viewport_y(&self, world_y: i32) -> i32 {
        world_y - self.y
    }
}

fn axis_offset(target: i32, scene_extent: i32, viewport_extent: i32) -> i32 {
    if scene_extent <= viewport_extent {
        -((viewport_extent - scene_extent) / 2)
    } else {
        let max_offset = scene_extent - viewport_extent;
        (target - viewport_extent / 2).clamp(0, max_offset)
    }
}
