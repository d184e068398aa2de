use voyage_engine::{ActorPose, Direction, TilePos};

/// The player-controlled explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Actor {
    pub(crate) pos: TilePos,
    pub(crate) facing: Direction,
}

impl Actor {
    pub(crate) fn spawn_at(pos: TilePos) -> Self {
        Self {
            pos,
            facing: Direction::default(),
        }
    }

    pub(crate) fn pose(&self) -> ActorPose {
        ActorPose {
            pos: self.pos,
            facing: self.facing,
        }
    }
}
