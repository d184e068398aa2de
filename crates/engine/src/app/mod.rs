mod game;
mod input;
mod loop_runner;
mod metrics;
mod pacing;
mod rendering;

pub use game::{ActorPose, Backdrop, FrameView, Game, OverlayMode, TickOutcome, WorldView};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use pacing::{StepThrottle, DEFAULT_STEP_DELAY};
pub use rendering::{fit_grid_to_viewport, tile_to_screen_px, Renderer, Viewport};
