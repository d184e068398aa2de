use tracing::info;
use voyage_engine::{CollisionDetector, Direction, TileGrid};

use super::actor::Actor;
use super::cast::{build_cast, StoryEntity};
use super::chapters::Chapter;
use super::content::{StoryContent, FINALE_NARRATIVE};
use super::mission::{MissionFlag, MissionLedger};
use super::narrative::Interstitial;

const OPENING_NARRATIVE: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Pre,
    Active(Chapter),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransitionOutcome {
    /// No active chapter, the actor is off the exit cell, or an interstitial
    /// is already up.
    Ignored,
    Refused { advisory: &'static str },
    Interstitial { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NarrativeProgress {
    Idle,
    Page,
    SceneBuilt(Chapter),
    JourneyComplete,
}

/// Owns the chapter sequence, the active grid and cast, the actor, and the
/// mission ledger.
#[derive(Debug)]
pub(crate) struct SceneManager {
    story: StoryContent,
    stage: Stage,
    grid: TileGrid,
    entities: Vec<StoryEntity>,
    actor: Actor,
    ledger: MissionLedger,
    narrative: Option<Interstitial>,
}

impl SceneManager {
    pub(crate) fn new(story: StoryContent) -> Self {
        let ledger = MissionLedger::default();
        let first = Chapter::ThroneRoom;
        Self {
            story,
            stage: Stage::Pre,
            grid: first.build_grid(&ledger),
            entities: Vec::new(),
            actor: Actor::spawn_at(first.spawn()),
            ledger,
            narrative: None,
        }
    }

    pub(crate) fn start(&mut self) -> bool {
        if self.stage != Stage::Pre || self.narrative.is_some() {
            return false;
        }
        self.ledger.reset_all();
        self.show_narrative(OPENING_NARRATIVE);
        true
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn chapter(&self) -> Option<Chapter> {
        match self.stage {
            Stage::Active(chapter) => Some(chapter),
            Stage::Pre | Stage::Completed => None,
        }
    }

    pub(crate) fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub(crate) fn entities(&self) -> &[StoryEntity] {
        &self.entities
    }

    pub(crate) fn entity_mut(&mut self, index: usize) -> Option<&mut StoryEntity> {
        self.entities.get_mut(index)
    }

    pub(crate) fn actor(&self) -> &Actor {
        &self.actor
    }

    pub(crate) fn ledger(&self) -> &MissionLedger {
        &self.ledger
    }

    #[cfg(test)]
    pub(crate) fn ledger_mut(&mut self) -> &mut MissionLedger {
        &mut self.ledger
    }

    #[cfg(test)]
    pub(crate) fn place_actor(&mut self, pos: voyage_engine::TilePos) {
        self.actor.pos = pos;
    }

    pub(crate) fn narrative(&self) -> Option<&Interstitial> {
        self.narrative.as_ref()
    }

    pub(crate) fn is_waiting_for_narrative(&self) -> bool {
        self.narrative.is_some()
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.stage == Stage::Completed
    }

    pub(crate) fn mission_text(&self) -> Option<&'static str> {
        self.chapter()
            .map(|chapter| chapter.current_mission(&self.ledger))
    }

    pub(crate) fn is_on_exit(&self) -> bool {
        self.grid.is_exit(self.actor.pos.x, self.actor.pos.y)
    }

    pub(crate) fn face(&mut self, direction: Direction) {
        self.actor.facing = direction;
    }

    pub(crate) fn try_step(&mut self, dx: i32, dy: i32) -> bool {
        let target = self.actor.pos.offset(dx, dy);
        let passable =
            CollisionDetector::new(&self.grid, &self.entities).is_valid_position(target.x, target.y);
        if passable {
            self.actor.pos = target;
        }
        passable
    }

    pub(crate) fn facing_entity_index(&self) -> Option<usize> {
        let Actor { pos, facing } = self.actor;
        CollisionDetector::new(&self.grid, &self.entities).facing_entity_index(pos.x, pos.y, facing)
    }

    pub(crate) fn refresh_exit(&mut self) -> bool {
        match self.chapter() {
            Some(chapter) => chapter.update_exit(&mut self.grid, &self.ledger),
            None => false,
        }
    }

    pub(crate) fn apply_completion(&mut self, flag: MissionFlag) {
        self.ledger.set(flag, true);
        self.refresh_exit();
    }

    /// Leaves the active chapter when the actor stands on a flagged exit and
    /// the gate holds. The following chapter is built once the interstitial
    /// ends.
    pub(crate) fn request_transition(&mut self) -> TransitionOutcome {
        if self.narrative.is_some() {
            return TransitionOutcome::Ignored;
        }
        let Some(chapter) = self.chapter() else {
            return TransitionOutcome::Ignored;
        };
        if !self.is_on_exit() {
            return TransitionOutcome::Ignored;
        }
        if !chapter.is_open(&self.ledger) {
            return TransitionOutcome::Refused {
                advisory: chapter.advisory(),
            };
        }

        let index = match chapter.next() {
            Some(next) => next.index(),
            None => FINALE_NARRATIVE,
        };
        self.show_narrative(index);
        TransitionOutcome::Interstitial { index }
    }

    pub(crate) fn advance_narrative(&mut self) -> NarrativeProgress {
        let Some(narrative) = self.narrative.as_mut() else {
            return NarrativeProgress::Idle;
        };
        if !narrative.advance() {
            return NarrativeProgress::Page;
        }
        self.narrative = None;

        let next = match self.stage {
            Stage::Pre => Some(Chapter::ThroneRoom),
            Stage::Active(chapter) => chapter.next(),
            Stage::Completed => None,
        };
        match next {
            Some(chapter) => {
                self.enter(chapter);
                NarrativeProgress::SceneBuilt(chapter)
            }
            None => {
                self.stage = Stage::Completed;
                info!("journey_completed");
                NarrativeProgress::JourneyComplete
            }
        }
    }

    fn show_narrative(&mut self, index: usize) {
        let interstitial = Interstitial::new(index, self.story.narrative(index));
        info!(
            narrative = index,
            pages = interstitial.page_count(),
            "narrative_shown"
        );
        self.narrative = Some(interstitial);
    }

    fn enter(&mut self, chapter: Chapter) {
        self.grid = chapter.build_grid(&self.ledger);
        self.entities = build_cast(chapter, &self.story);
        self.actor = Actor::spawn_at(chapter.spawn());
        self.stage = Stage::Active(chapter);
        info!(
            chapter = ?chapter,
            cols = self.grid.cols(),
            rows = self.grid.rows(),
            entity_count = self.entities.len(),
            "scene_built"
        );
    }
}
