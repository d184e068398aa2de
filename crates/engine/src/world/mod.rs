mod camera;
mod collision;
mod entity;
mod tiles;

pub use camera::Camera;
pub use collision::{CollisionDetector, Direction};
pub use entity::{
    DialogueLine, DialogueScript, DialogueStep, EntityKind, InteractiveEntity, Placement,
    ScriptError,
};
pub use tiles::{TileGrid, TileKind, TilePos, TileRect};
