use std::time::Instant;

use crate::world::{Camera, Direction, Placement, TileGrid, TilePos};

use super::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    None,
    Map,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backdrop {
    Title,
    Interstitial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorPose {
    pub pos: TilePos,
    pub facing: Direction,
}

#[derive(Debug)]
pub struct WorldView<'a> {
    pub grid: &'a TileGrid,
    pub camera: &'a Camera,
    pub entities: Vec<Placement>,
    pub actor: ActorPose,
    pub overlay: OverlayMode,
}

/// Read-only snapshot handed to the renderer once per frame.
#[derive(Debug)]
pub enum FrameView<'a> {
    Backdrop(Backdrop),
    World(WorldView<'a>),
}

pub trait Game {
    fn start(&mut self);
    fn tick(&mut self, now: Instant, input: &InputSnapshot) -> TickOutcome;
    fn frame(&self) -> FrameView<'_>;
    /// Text surface for the window title; `None` keeps the configured title.
    fn title(&self) -> Option<String> {
        None
    }
    fn viewport_resized(&mut self, _cols: i32, _rows: i32) {}
    fn shutdown(&mut self) {}
}
