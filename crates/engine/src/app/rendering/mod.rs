mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{fit_grid_to_viewport, tile_to_screen_px, Viewport};
