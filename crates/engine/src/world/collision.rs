use super::{InteractiveEntity, TileGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Horizontal movement wins over vertical when both are present.
    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        if dx > 0 {
            Some(Direction::Right)
        } else if dx < 0 {
            Some(Direction::Left)
        } else if dy > 0 {
            Some(Direction::Down)
        } else if dy < 0 {
            Some(Direction::Up)
        } else {
            None
        }
    }

    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Read-only passability view over one scene's terrain and entities.
pub struct CollisionDetector<'a, C> {
    grid: &'a TileGrid,
    entities: &'a [InteractiveEntity<C>],
}

impl<'a, C: Clone> CollisionDetector<'a, C> {
    pub fn new(grid: &'a TileGrid, entities: &'a [InteractiveEntity<C>]) -> Self {
        Self { grid, entities }
    }

    pub fn is_valid_position(&self, x: i32, y: i32) -> bool {
        if !self.grid.contains(x, y) {
            return false;
        }
        if self.grid.is_collidable(x, y) {
            return false;
        }
        self.blocking_entity_index(x, y).is_none()
    }

    pub fn blocking_entity_index(&self, x: i32, y: i32) -> Option<usize> {
        self.entities
            .iter()
            .position(|entity| entity.is_collidable() && entity.occupies(x, y))
    }

    /// First entity, in creation order, occupying the cell adjacent to
    /// `(x, y)` in `direction`.
    pub fn facing_entity_index(&self, x: i32, y: i32, direction: Direction) -> Option<usize> {
        let (dx, dy) = direction.offset();
        let (front_x, front_y) = (x + dx, y + dy);
        self.entities
            .iter()
            .position(|entity| entity.occupies(front_x, front_y))
    }

    pub fn facing_entity(&self, x: i32, y: i32, direction: Direction) -> Option<&'a InteractiveEntity<C>> {
        self.facing_entity_index(x, y, direction)
            .map(|index| &self.entities[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{DialogueScript, EntityKind, TileKind, TilePos};

    fn open_grid(cols: i32, rows: i32) -> TileGrid {
        let mut grid = TileGrid::new(cols, rows);
        grid.fill(TileKind::Grass);
        grid
    }

    fn entity(name: &str, kind: EntityKind, x: i32, y: i32) -> InteractiveEntity<()> {
        InteractiveEntity::new(name, kind, TilePos::new(x, y), DialogueScript::single("..."))
    }

    #[test]
    fn entity_footprint_blocks_walkable_terrain() {
        let grid = open_grid(10, 10);
        let entities = vec![entity("Sailor", EntityKind::Sailor1, 4, 4)];
        let detector = CollisionDetector::new(&grid, &entities);

        assert!(!detector.is_valid_position(4, 4));
        assert!(!detector.is_valid_position(5, 5));
        assert!(!detector.is_valid_position(4, 5));
        assert!(detector.is_valid_position(6, 6));
        assert!(detector.is_valid_position(3, 4));
    }

    #[test]
    fn bounds_and_terrain_are_checked() {
        let mut grid = open_grid(5, 5);
        grid.set(2, 2, TileKind::Water);
        let entities: Vec<InteractiveEntity<()>> = Vec::new();
        let detector = CollisionDetector::new(&grid, &entities);

        assert!(!detector.is_valid_position(-1, 0));
        assert!(!detector.is_valid_position(5, 0));
        assert!(!detector.is_valid_position(2, 2));
        assert!(detector.is_valid_position(1, 2));
    }

    #[test]
    fn unset_cells_inside_grid_are_passable() {
        let grid = TileGrid::new(3, 3);
        let entities: Vec<InteractiveEntity<()>> = Vec::new();
        let detector = CollisionDetector::new(&grid, &entities);
        assert!(detector.is_valid_position(1, 1));
    }

    #[test]
    fn facing_requires_matching_direction() {
        let grid = open_grid(20, 20);
        let entities = vec![entity("King", EntityKind::NpcKing, 9, 2)];
        let detector = CollisionDetector::new(&grid, &entities);

        // Standing directly below the 3x3 footprint.
        assert_eq!(detector.facing_entity_index(10, 5, Direction::Up), Some(0));
        assert_eq!(detector.facing_entity_index(10, 5, Direction::Down), None);
        assert_eq!(detector.facing_entity_index(10, 5, Direction::Left), None);
        // Diagonal neighbours never count.
        assert_eq!(detector.facing_entity_index(12, 5, Direction::Up), None);
        assert_eq!(detector.facing_entity_index(8, 3, Direction::Right), Some(0));
        assert_eq!(detector.facing_entity_index(12, 4, Direction::Left), Some(0));
    }

    #[test]
    fn facing_picks_first_entity_in_creation_order() {
        let grid = open_grid(20, 20);
        let entities = vec![
            entity("First", EntityKind::Sailor1, 5, 5),
            entity("Second", EntityKind::Sailor2, 5, 6),
        ];
        let detector = CollisionDetector::new(&grid, &entities);

        let found = detector
            .facing_entity(4, 6, Direction::Right)
            .expect("facing entity");
        assert_eq!(found.name(), "First");
    }

    #[test]
    fn direction_from_delta_prefers_horizontal() {
        assert_eq!(Direction::from_delta(1, -1), Some(Direction::Right));
        assert_eq!(Direction::from_delta(-1, 1), Some(Direction::Left));
        assert_eq!(Direction::from_delta(0, 1), Some(Direction::Down));
        assert_eq!(Direction::from_delta(0, -1), Some(Direction::Up));
        assert_eq!(Direction::from_delta(0, 0), None);
    }
}
