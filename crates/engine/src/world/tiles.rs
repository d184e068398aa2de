use std::ops::RangeInclusive;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Half-open rectangle in tile units: `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl TileRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn intersects(&self, other: &TileRect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Grass,
    Water,
    Sand,
    Tile1,
    Tile2,
    CarpetLeft,
    CarpetMiddle,
    CarpetRight,
    Door,
}

impl TileKind {
    pub const ALL: [TileKind; 9] = [
        TileKind::Grass,
        TileKind::Water,
        TileKind::Sand,
        TileKind::Tile1,
        TileKind::Tile2,
        TileKind::CarpetLeft,
        TileKind::CarpetMiddle,
        TileKind::CarpetRight,
        TileKind::Door,
    ];

    pub const fn is_collidable(self) -> bool {
        matches!(self, TileKind::Water)
    }

    pub const fn asset_key(self) -> &'static str {
        match self {
            TileKind::Grass => "tiles/grass",
            TileKind::Water => "tiles/water",
            TileKind::Sand => "tiles/sand",
            TileKind::Tile1 => "tiles/tile1",
            TileKind::Tile2 => "tiles/tile2",
            TileKind::CarpetLeft => "tiles/carpet_left",
            TileKind::CarpetMiddle => "tiles/carpet_middle",
            TileKind::CarpetRight => "tiles/carpet_right",
            TileKind::Door => "tiles/door",
        }
    }
}

/// Per-scene cell storage with a parallel exit-flag layer.
///
/// Every coordinate accessor is total: reads outside `[0, cols) x [0, rows)`
/// return `None`/`false` and writes there are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    cols: i32,
    rows: i32,
    cells: Vec<Option<TileKind>>,
    exits: Vec<bool>,
    background_key: Option<&'static str>,
}

impl TileGrid {
    pub fn new(cols: i32, rows: i32) -> Self {
        let cols = cols.max(0);
        let rows = rows.max(0);
        let len = cols as usize * rows as usize;
        Self {
            cols,
            rows,
            cells: vec![None; len],
            exits: vec![false; len],
            background_key: None,
        }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.cols && y < self.rows
    }

    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if !self.contains(x, y) {
            return None;
        }
        Some(y as usize * self.cols as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<TileKind> {
        self.index_of(x, y)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    pub fn set(&mut self, x: i32, y: i32, kind: TileKind) {
        if let Some(index) = self.index_of(x, y) {
            self.cells[index] = Some(kind);
        }
    }

    pub fn is_collidable(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(TileKind::is_collidable)
    }

    pub fn set_exit(&mut self, x: i32, y: i32, is_exit: bool) {
        if let Some(index) = self.index_of(x, y) {
            self.exits[index] = is_exit;
        }
    }

    pub fn is_exit(&self, x: i32, y: i32) -> bool {
        self.index_of(x, y)
            .is_some_and(|index| self.exits[index])
    }

    pub fn has_exits(&self) -> bool {
        self.exits.iter().any(|is_exit| *is_exit)
    }

    pub fn exit_cells(&self) -> impl Iterator<Item = TilePos> + '_ {
        let cols = self.cols.max(1) as usize;
        self.exits
            .iter()
            .enumerate()
            .filter(|(_, is_exit)| **is_exit)
            .map(move |(index, _)| TilePos::new((index % cols) as i32, (index / cols) as i32))
    }

    pub fn fill(&mut self, kind: TileKind) {
        self.cells.iter_mut().for_each(|cell| *cell = Some(kind));
    }

    pub fn paint_row(&mut self, y: i32, columns: RangeInclusive<i32>, kind: TileKind) {
        for x in columns {
            self.set(x, y, kind);
        }
    }

    pub fn paint_column(&mut self, x: i32, rows: RangeInclusive<i32>, kind: TileKind) {
        for y in rows {
            self.set(x, y, kind);
        }
    }

    pub fn set_background(&mut self, key: &'static str) {
        self.background_key = Some(key);
    }

    pub fn background_key(&self) -> Option<&'static str> {
        self.background_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_reads_return_defaults() {
        let mut grid = TileGrid::new(4, 3);
        grid.fill(TileKind::Water);

        for (x, y) in [(-1, 0), (0, -1), (4, 0), (0, 3), (i32::MIN, i32::MAX)] {
            assert_eq!(grid.get(x, y), None, "get({x},{y})");
            assert!(!grid.is_collidable(x, y), "is_collidable({x},{y})");
            assert!(!grid.is_exit(x, y), "is_exit({x},{y})");
        }
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let mut grid = TileGrid::new(2, 2);
        let before = grid.clone();

        grid.set(2, 0, TileKind::Water);
        grid.set(-1, 1, TileKind::Water);
        grid.set_exit(0, 5, true);

        assert_eq!(grid, before);
    }

    #[test]
    fn unset_cells_are_not_collidable() {
        let grid = TileGrid::new(3, 3);
        assert_eq!(grid.get(1, 1), None);
        assert!(!grid.is_collidable(1, 1));
    }

    #[test]
    fn only_water_blocks_movement() {
        for kind in TileKind::ALL {
            assert_eq!(kind.is_collidable(), kind == TileKind::Water, "{kind:?}");
        }
    }

    #[test]
    fn exit_layer_is_independent_of_cells() {
        let mut grid = TileGrid::new(5, 5);
        grid.fill(TileKind::Grass);
        assert!(!grid.has_exits());

        grid.set_exit(3, 4, true);
        assert!(grid.is_exit(3, 4));
        assert_eq!(grid.get(3, 4), Some(TileKind::Grass));
        assert_eq!(grid.exit_cells().collect::<Vec<_>>(), vec![TilePos::new(3, 4)]);

        grid.set_exit(3, 4, false);
        assert!(!grid.has_exits());
    }

    #[test]
    fn paint_helpers_clip_to_grid() {
        let mut grid = TileGrid::new(6, 4);
        grid.fill(TileKind::Grass);
        grid.paint_row(1, 4..=10, TileKind::Water);
        grid.paint_column(0, -2..=1, TileKind::Water);

        assert!(grid.is_collidable(4, 1));
        assert!(grid.is_collidable(5, 1));
        assert!(grid.is_collidable(0, 0));
        assert!(grid.is_collidable(0, 1));
        assert!(!grid.is_collidable(0, 2));
        assert!(!grid.is_collidable(3, 1));
    }

    #[test]
    fn negative_dimensions_yield_empty_grid() {
        let grid = TileGrid::new(-3, 4);
        assert_eq!(grid.cols(), 0);
        assert_eq!(grid.index_of(0, 0), None);
    }

    #[test]
    fn rect_intersection_is_half_open() {
        let a = TileRect::new(0, 0, 4, 4);
        assert!(a.intersects(&TileRect::new(3, 3, 2, 2)));
        assert!(!a.intersects(&TileRect::new(4, 0, 2, 2)));
        assert!(!a.intersects(&TileRect::new(1, 1, 0, 3)));
    }

    #[test]
    fn tile_kinds_parse_from_snake_case() {
        let kind: TileKind = serde_json::from_str("\"carpet_middle\"").expect("kind");
        assert_eq!(kind, TileKind::CarpetMiddle);
    }
}
