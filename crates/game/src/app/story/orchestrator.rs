use std::time::{Duration, Instant};

use tracing::{debug, info};
use voyage_engine::{
    Backdrop, Camera, DialogueStep, Direction, FrameView, Game, InputAction, InputSnapshot,
    OverlayMode, StepThrottle, TickOutcome, WorldView,
};

use super::content::StoryContent;
use super::manager::{NarrativeProgress, SceneManager, TransitionOutcome};
use super::mission::MissionFlag;

const NOTICE_TTL: Duration = Duration::from_millis(2500);
const NOTICE_SPEAKER: &str = "System";
const INITIAL_VIEWPORT_COLS: i32 = 40;
const INITIAL_VIEWPORT_ROWS: i32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Title,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DialogueSession {
    entity: usize,
    speaker: String,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Notice {
    text: &'static str,
    expires_at: Instant,
}

/// Per-tick sequencing: input, overlays, dialogue, throttled movement,
/// camera, then the exit check.
#[derive(Debug)]
pub(crate) struct VoyageGame {
    manager: SceneManager,
    camera: Camera,
    throttle: StepThrottle,
    screen: Screen,
    overlay: OverlayMode,
    dialogue: Option<DialogueSession>,
    notice: Option<Notice>,
    show_mission: bool,
}

impl VoyageGame {
    pub(crate) fn new(story: StoryContent, step_delay: Duration) -> Self {
        Self {
            manager: SceneManager::new(story),
            camera: Camera::new(INITIAL_VIEWPORT_COLS, INITIAL_VIEWPORT_ROWS),
            throttle: StepThrottle::new(step_delay),
            screen: Screen::Title,
            overlay: OverlayMode::None,
            dialogue: None,
            notice: None,
            show_mission: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn manager(&self) -> &SceneManager {
        &self.manager
    }

    #[cfg(test)]
    pub(crate) fn manager_mut(&mut self) -> &mut SceneManager {
        &mut self.manager
    }

    #[cfg(test)]
    pub(crate) fn camera(&self) -> &Camera {
        &self.camera
    }

    #[cfg(test)]
    pub(crate) fn overlay(&self) -> OverlayMode {
        self.overlay
    }

    pub(crate) fn dialogue_text(&self) -> Option<(&str, &str)> {
        self.dialogue
            .as_ref()
            .map(|session| (session.speaker.as_str(), session.text.as_str()))
    }

    pub(crate) fn notice_text(&self) -> Option<&'static str> {
        self.notice.map(|notice| notice.text)
    }

    fn set_overlay(&mut self, overlay: OverlayMode) {
        if self.overlay != overlay {
            info!(from = ?self.overlay, to = ?overlay, "overlay_changed");
            self.overlay = overlay;
        }
    }

    fn handle_back(&mut self) {
        match self.overlay {
            OverlayMode::Map | OverlayMode::Settings => self.set_overlay(OverlayMode::None),
            OverlayMode::None => {
                if let Some(session) = self.dialogue.take() {
                    debug!(entity = session.entity, "dialogue_closed_by_settings");
                }
                self.set_overlay(OverlayMode::Settings);
            }
        }
    }

    fn toggle_map(&mut self) {
        match self.overlay {
            OverlayMode::Map => self.set_overlay(OverlayMode::None),
            OverlayMode::None if self.dialogue.is_none() && self.manager.chapter().is_some() => {
                self.set_overlay(OverlayMode::Map)
            }
            _ => {}
        }
    }

    fn advance_narrative(&mut self) -> TickOutcome {
        match self.manager.advance_narrative() {
            NarrativeProgress::JourneyComplete => TickOutcome::Exit,
            NarrativeProgress::SceneBuilt(_) => {
                self.throttle.clear();
                self.notice = None;
                self.show_mission = false;
                self.recenter_camera();
                TickOutcome::Continue
            }
            NarrativeProgress::Page => {
                if let Some(narrative) = self.manager.narrative() {
                    debug!(
                        narrative = narrative.index(),
                        page = narrative.page_number(),
                        "narrative_page"
                    );
                }
                TickOutcome::Continue
            }
            NarrativeProgress::Idle => TickOutcome::Continue,
        }
    }

    fn open_dialogue(&mut self) {
        let Some(index) = self.manager.facing_entity_index() else {
            return;
        };
        let Some(entity) = self.manager.entity_mut(index) else {
            return;
        };
        entity.reset();
        let session = DialogueSession {
            entity: index,
            speaker: entity.current_speaker().to_string(),
            text: entity.current_line().text.clone(),
        };
        info!(entity = entity.name(), lines = entity.script().len(), "dialogue_opened");
        info!(speaker = %session.speaker, text = %session.text, "dialogue_line");
        self.dialogue = Some(session);
    }

    fn advance_dialogue(&mut self) {
        let Some(index) = self.dialogue.as_ref().map(|session| session.entity) else {
            return;
        };
        let Some(entity) = self.manager.entity_mut(index) else {
            self.dialogue = None;
            return;
        };

        let (next_text, effect) = match entity.advance() {
            DialogueStep::Continuing { line } => (Some(line.text.clone()), None),
            DialogueStep::Completed { effect, .. } => (None, effect),
        };

        match next_text {
            Some(text) => {
                let speaker = entity.current_speaker().to_string();
                info!(speaker = %speaker, text = %text, "dialogue_line");
                self.dialogue = Some(DialogueSession {
                    entity: index,
                    speaker,
                    text,
                });
            }
            None => {
                info!(entity = entity.name(), effect = ?effect, "dialogue_completed");
                self.dialogue = None;
                if let Some(flag) = effect {
                    self.manager.apply_completion(flag);
                }
            }
        }
    }

    fn handle_interact(&mut self) {
        if self.notice.take().is_some() {
            return;
        }
        if self.dialogue.is_some() {
            self.advance_dialogue();
        } else {
            self.open_dialogue();
        }
    }

    fn process_movement(&mut self, now: Instant, input: &InputSnapshot) {
        let (dx, dy) = input.movement_delta();
        let Some(direction) = Direction::from_delta(dx, dy) else {
            return;
        };
        self.manager.face(direction);
        if self.throttle.is_ready(now) && self.manager.try_step(dx, dy) {
            self.throttle.record_step(now);
        }
    }

    fn check_transition(&mut self, now: Instant) {
        match self.manager.request_transition() {
            TransitionOutcome::Refused { advisory } => {
                if self.notice.map(|notice| notice.text) != Some(advisory) {
                    info!(chapter = ?self.manager.chapter(), advisory, "transition_refused");
                }
                self.notice = Some(Notice {
                    text: advisory,
                    expires_at: now + NOTICE_TTL,
                });
            }
            TransitionOutcome::Interstitial { .. } => {
                self.notice = None;
                self.show_mission = false;
            }
            TransitionOutcome::Ignored => {}
        }
    }

    fn recenter_camera(&mut self) {
        let grid = self.manager.grid();
        let pos = self.manager.actor().pos;
        self.camera.update(pos.x, pos.y, grid.cols(), grid.rows());
    }

    fn expire_notice(&mut self, now: Instant) {
        if self.notice.is_some_and(|notice| now >= notice.expires_at) {
            self.notice = None;
        }
    }
}

impl Game for VoyageGame {
    fn start(&mut self) {
        info!("title_screen");
    }

    fn tick(&mut self, now: Instant, input: &InputSnapshot) -> TickOutcome {
        if self.screen == Screen::Title {
            if input.pressed(InputAction::Confirm) && self.manager.start() {
                self.screen = Screen::Playing;
                info!("game_started");
            }
            return TickOutcome::Continue;
        }

        if self.manager.is_completed() {
            return TickOutcome::Exit;
        }

        self.expire_notice(now);

        if self.manager.is_waiting_for_narrative() {
            if input.pressed(InputAction::Interact) || input.pressed(InputAction::Confirm) {
                return self.advance_narrative();
            }
            return TickOutcome::Continue;
        }

        if input.pressed(InputAction::Back) {
            self.handle_back();
            return TickOutcome::Continue;
        }
        if self.overlay == OverlayMode::Settings {
            if input.pressed(InputAction::Confirm) {
                info!(reason = "settings_quit", "shutdown_requested");
                return TickOutcome::Exit;
            }
            return TickOutcome::Continue;
        }
        if input.pressed(InputAction::ToggleMap) {
            self.toggle_map();
        }
        if self.overlay == OverlayMode::Map {
            return TickOutcome::Continue;
        }

        if input.pressed(InputAction::ToggleInfo) {
            self.show_mission = !self.show_mission;
        }
        if input.pressed(InputAction::Interact) {
            self.handle_interact();
        }

        if self.dialogue.is_none() {
            self.process_movement(now, input);
        }
        self.recenter_camera();
        if self.dialogue.is_none() {
            self.check_transition(now);
        }
        TickOutcome::Continue
    }

    fn frame(&self) -> FrameView<'_> {
        if self.screen == Screen::Title {
            return FrameView::Backdrop(Backdrop::Title);
        }
        if self.manager.is_waiting_for_narrative() || self.manager.chapter().is_none() {
            return FrameView::Backdrop(Backdrop::Interstitial);
        }
        FrameView::World(WorldView {
            grid: self.manager.grid(),
            camera: &self.camera,
            entities: self
                .manager
                .entities()
                .iter()
                .map(|entity| entity.placement())
                .collect(),
            actor: self.manager.actor().pose(),
            overlay: self.overlay,
        })
    }

    fn title(&self) -> Option<String> {
        if self.screen == Screen::Title {
            return Some("Magellan's Journey - press Enter to begin".to_string());
        }
        if let Some(narrative) = self.manager.narrative() {
            return Some(format!(
                "{} ({}/{}, E to continue)",
                narrative.current_page(),
                narrative.page_number() + 1,
                narrative.page_count()
            ));
        }
        let chapter = self.manager.chapter()?;
        if self.overlay == OverlayMode::Settings {
            return Some("Paused - Esc to resume, Enter to quit".to_string());
        }

        let mut title = chapter.label().to_string();
        if self.overlay == OverlayMode::Map {
            title.push_str(" | Map (M or Esc to close)");
        }
        if let Some((speaker, text)) = self.dialogue_text() {
            title.push_str(&format!(" | {speaker}: {text}"));
        }
        if let Some(text) = self.notice_text() {
            title.push_str(&format!(" | {NOTICE_SPEAKER}: {text}"));
        }
        if self.show_mission {
            if let Some(mission) = self.manager.mission_text() {
                title.push_str(&format!(" | Current Mission: {mission}"));
            }
        }
        Some(title)
    }

    fn viewport_resized(&mut self, cols: i32, rows: i32) {
        self.camera.set_viewport(cols, rows);
        self.recenter_camera();
    }

    fn shutdown(&mut self) {
        info!(
            stage = ?self.manager.stage(),
            flags_set = MissionFlag::ALL
                .iter()
                .filter(|flag| self.manager.ledger().get(**flag))
                .count(),
            "game_shutdown"
        );
    }
}
