use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::{resolve_app_paths, StartupError};

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::{Game, InputAction, InputSnapshot, Renderer, TickOutcome};

pub const SLOW_FRAME_ENV_VAR: &str = "VOYAGE_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub tile_size_px: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Magellan's Journey".to_string(),
            window_width: 1280,
            window_height: 720,
            tile_size_px: 32,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, mut game: Box<dyn Game>) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        asset_dir = %app_paths.asset_dir.display(),
        "startup"
    );

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let tile_size_px = config.tile_size_px.max(1);
    let mut renderer = Renderer::new(Arc::clone(&window), app_paths.asset_dir, tile_size_px)
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::default();

    let initial_size = window.inner_size();
    let (viewport_cols, viewport_rows) =
        viewport_tiles(initial_size.width, initial_size.height, tile_size_px);
    game.viewport_resized(viewport_cols, viewport_rows);
    game.start();

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        tile_size_px,
        viewport_cols,
        viewport_rows,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut exit_requested = false;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                    let (cols, rows) =
                        viewport_tiles(new_size.width, new_size.height, tile_size_px);
                    game.viewport_resized(cols, rows);
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                    let (cols, rows) = viewport_tiles(size.width, size.height, tile_size_px);
                    game.viewport_resized(cols, rows);
                }
                WindowEvent::Focused(false) => {
                    input_collector.release_all();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    if exit_requested {
                        return;
                    }

                    if slow_frame_delay > Duration::ZERO {
                        // Explicit debug perturbation only; this is not the FPS cap.
                        thread::sleep(slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        let outcome = game.tick(Instant::now(), &input_snapshot);
                        metrics_accumulator.record_tick();
                        if outcome == TickOutcome::Exit {
                            exit_requested = true;
                            break;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if exit_requested {
                        info!(reason = "game_finished", "shutdown_requested");
                        window_target.exit();
                        return;
                    }

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    // Single authoritative FPS cap sleep point for render pacing.
                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    if let Err(error) = renderer.render_frame(&game.frame()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = game.title();
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(title),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                game.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    held: ActionStates,
    pressed_edges: ActionStates,
}

impl InputCollector {
    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        if let Some(action) = action_for_key(key_event.physical_key) {
            self.handle_action_state(action, key_event.state);
        }
    }

    fn handle_action_state(&mut self, action: InputAction, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.held.is_down(action) {
                    self.pressed_edges.set(action, true);
                }
                self.held.set(action, true);
            }
            ElementState::Released => self.held.set(action, false),
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(self.held, self.pressed_edges);
        self.pressed_edges.clear();
        snapshot
    }

    fn release_all(&mut self) {
        self.held.clear();
    }
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::MoveUp),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::MoveDown),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::KeyE => Some(InputAction::Interact),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(InputAction::Confirm),
        KeyCode::Escape => Some(InputAction::Back),
        KeyCode::KeyM => Some(InputAction::ToggleMap),
        KeyCode::KeyQ => Some(InputAction::ToggleInfo),
        _ => None,
    }
}

fn viewport_tiles(width_px: u32, height_px: u32, tile_size_px: u32) -> (i32, i32) {
    let tile = tile_size_px.max(1);
    let cols = (width_px / tile).max(1);
    let rows = (height_px / tile).max(1);
    (
        i32::try_from(cols).unwrap_or(i32::MAX),
        i32::try_from(rows).unwrap_or(i32::MAX),
    )
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn plan_sim_steps_keeps_sub_tick_remainder() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(20), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 1);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(4));
    }

    #[test]
    fn interact_press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.handle_action_state(InputAction::Interact, ElementState::Pressed);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.pressed(InputAction::Interact));
        assert!(!second.pressed(InputAction::Interact));
        assert!(second.is_down(InputAction::Interact));
    }

    #[test]
    fn no_retrigger_without_new_press() {
        let mut input = InputCollector::default();
        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        for action in InputAction::ALL {
            assert!(!first.pressed(action), "{action:?}");
            assert!(!second.pressed(action), "{action:?}");
        }
    }

    #[test]
    fn held_key_repeat_does_not_spam_press_edges() {
        let mut input = InputCollector::default();

        input.handle_action_state(InputAction::Confirm, ElementState::Pressed);
        let first = input.snapshot_for_tick();

        input.handle_action_state(InputAction::Confirm, ElementState::Pressed);
        let second = input.snapshot_for_tick();

        input.handle_action_state(InputAction::Confirm, ElementState::Released);
        input.handle_action_state(InputAction::Confirm, ElementState::Pressed);
        let third = input.snapshot_for_tick();

        assert!(first.pressed(InputAction::Confirm));
        assert!(!second.pressed(InputAction::Confirm));
        assert!(third.pressed(InputAction::Confirm));
    }

    #[test]
    fn press_and_release_within_one_tick_still_registers_edge() {
        let mut input = InputCollector::default();
        input.handle_action_state(InputAction::ToggleMap, ElementState::Pressed);
        input.handle_action_state(InputAction::ToggleMap, ElementState::Released);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.pressed(InputAction::ToggleMap));
        assert!(!snapshot.is_down(InputAction::ToggleMap));
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_actions() {
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::KeyW)),
            Some(InputAction::MoveUp)
        );
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::ArrowLeft)),
            Some(InputAction::MoveLeft)
        );
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::KeyD)),
            Some(InputAction::MoveRight)
        );
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::ArrowDown)),
            Some(InputAction::MoveDown)
        );
        assert_eq!(action_for_key(PhysicalKey::Code(KeyCode::KeyZ)), None);
    }

    #[test]
    fn command_keys_map_to_actions() {
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::KeyE)),
            Some(InputAction::Interact)
        );
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::Enter)),
            Some(InputAction::Confirm)
        );
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::Escape)),
            Some(InputAction::Back)
        );
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::KeyM)),
            Some(InputAction::ToggleMap)
        );
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::KeyQ)),
            Some(InputAction::ToggleInfo)
        );
    }

    #[test]
    fn focus_loss_releases_held_movement() {
        let mut input = InputCollector::default();
        input.handle_action_state(InputAction::MoveRight, ElementState::Pressed);
        input.release_all();

        let snapshot = input.snapshot_for_tick();
        assert_eq!(snapshot.movement_delta(), (0, 0));
    }

    #[test]
    fn viewport_tiles_floor_and_never_zero() {
        assert_eq!(viewport_tiles(1280, 720, 32), (40, 22));
        assert_eq!(viewport_tiles(10, 10, 32), (1, 1));
        assert_eq!(viewport_tiles(640, 480, 0), (640, 480));
    }

    #[test]
    fn target_frame_duration_none_when_cap_off() {
        assert_eq!(target_frame_duration(None), None);
    }

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(Some(60)).expect("duration");
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(Some(60)));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(Some(60)));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
    }
}
