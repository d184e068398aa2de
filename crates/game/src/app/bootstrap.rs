use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use voyage_engine::{Game, LoopConfig, DEFAULT_STEP_DELAY};

use super::story::{StoryContent, VoyageGame};

const MOVE_DELAY_ENV_VAR: &str = "VOYAGE_MOVE_DELAY_MS";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) game: Box<dyn Game>,
}

pub(crate) fn build_app() -> Result<AppWiring, ExitCode> {
    init_tracing();
    info!("=== Magellan's Journey Startup ===");

    let story = match StoryContent::embedded() {
        Ok(story) => story,
        Err(error) => {
            error!(error = %error, "story_load_failed");
            return Err(ExitCode::FAILURE);
        }
    };
    info!("story_loaded");

    let step_delay = resolve_step_delay(std::env::var(MOVE_DELAY_ENV_VAR).ok().as_deref());
    info!(step_delay_ms = step_delay.as_millis() as u64, "movement_config");

    Ok(AppWiring {
        config: LoopConfig::default(),
        game: Box::new(VoyageGame::new(story, step_delay)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn resolve_step_delay(raw: Option<&str>) -> Duration {
    let Some(raw) = raw else {
        return DEFAULT_STEP_DELAY;
    };
    match raw.trim().parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => {
            warn!(
                env_var = MOVE_DELAY_ENV_VAR,
                value = %raw,
                default_ms = DEFAULT_STEP_DELAY.as_millis() as u64,
                "invalid_move_delay_env_using_default"
            );
            DEFAULT_STEP_DELAY
        }
    }
}
