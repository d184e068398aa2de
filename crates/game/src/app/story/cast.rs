use voyage_engine::{DialogueScript, EntityKind, InteractiveEntity, TilePos};

use super::chapters::{carpet_center_x, Chapter};
use super::content::StoryContent;
use super::mission::MissionFlag;

pub(crate) type StoryEntity = InteractiveEntity<MissionFlag>;

const HONOR_GUARD_ROWS: [i32; 5] = [5, 9, 13, 17, 21];
const HONOR_GUARD_LINE: &str = "...";

/// Entities for `chapter` in creation order: authored cast first, then any
/// generated extras.
pub(crate) fn build_cast(chapter: Chapter, story: &StoryContent) -> Vec<StoryEntity> {
    let mut entities: Vec<StoryEntity> = story
        .cast(chapter)
        .iter()
        .map(|member| {
            let entity = InteractiveEntity::new(
                member.name.clone(),
                member.kind,
                member.at,
                member.script.clone(),
            );
            match member.completes {
                Some(flag) => entity.with_completion(flag),
                None => entity,
            }
        })
        .collect();

    if chapter == Chapter::ThroneRoom {
        entities.extend(honor_guard(chapter.dimensions().0));
    }
    entities
}

/// Guards flanking the carpet, one pair per guard row, clear of the carpet lanes.
fn honor_guard(cols: i32) -> Vec<StoryEntity> {
    let center = carpet_center_x(cols);
    let (guard_width, _) = EntityKind::Kawal.footprint();
    let left_x = center - 1 - guard_width;
    let right_x = center + 2;

    HONOR_GUARD_ROWS
        .iter()
        .flat_map(|&y| {
            [
                InteractiveEntity::new(
                    "Kawal",
                    EntityKind::Kawal,
                    TilePos::new(left_x, y),
                    DialogueScript::single(HONOR_GUARD_LINE),
                ),
                InteractiveEntity::new(
                    "Soldado",
                    EntityKind::Kawal,
                    TilePos::new(right_x, y),
                    DialogueScript::single(HONOR_GUARD_LINE),
                ),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use voyage_engine::TileKind;

    use crate::app::story::mission::MissionLedger;

    #[test]
    fn throne_room_guard_flanks_the_carpet() {
        let story = StoryContent::embedded().expect("story");
        let cast = build_cast(Chapter::ThroneRoom, &story);
        let guards: Vec<&StoryEntity> = cast
            .iter()
            .filter(|entity| entity.kind() == EntityKind::Kawal)
            .collect();
        assert_eq!(guards.len(), 10);

        let grid = Chapter::ThroneRoom.build_grid(&MissionLedger::default());
        for guard in guards {
            let footprint = guard.footprint();
            for y in footprint.y..footprint.y + footprint.height {
                for x in footprint.x..footprint.x + footprint.width {
                    let kind = grid.get(x, y).expect("guard inside the room");
                    assert!(
                        !matches!(
                            kind,
                            TileKind::CarpetLeft | TileKind::CarpetMiddle | TileKind::CarpetRight
                        ),
                        "{} at ({x},{y}) stands on the carpet",
                        guard.name()
                    );
                }
            }
            assert!(guard.completion().is_none());
        }
        assert_eq!(cast[1].position(), TilePos::new(7, 5));
        assert_eq!(cast[2].position(), TilePos::new(12, 5));
    }

    #[test]
    fn each_chapter_has_exactly_one_gate_carrier() {
        let story = StoryContent::embedded().expect("story");
        for chapter in Chapter::ALL {
            let carriers = build_cast(chapter, &story)
                .into_iter()
                .filter(|entity| entity.completion() == Some(&chapter.gate()))
                .count();
            assert_eq!(carriers, 1, "{chapter:?}");
        }
    }

    #[test]
    fn king_speaks_first_line_as_magellan() {
        let story = StoryContent::embedded().expect("story");
        let cast = build_cast(Chapter::ThroneRoom, &story);
        let mut king = cast[0].clone();
        assert_eq!(king.kind(), EntityKind::NpcKing);
        assert_eq!(king.current_speaker(), "Magellan");
        king.advance();
        assert_eq!(king.current_speaker(), "King Manuel I");
    }

    #[test]
    fn emperor_alternates_with_magellan_on_every_line() {
        let story = StoryContent::embedded().expect("story");
        let cast = build_cast(Chapter::SevilleDock, &story);
        let mut emperor = cast[0].clone();
        assert_eq!(emperor.name(), "Emperor Charles V");

        let mut speakers = vec![emperor.current_speaker().to_string()];
        while !emperor.is_last_line() {
            emperor.advance();
            speakers.push(emperor.current_speaker().to_string());
        }
        assert_eq!(
            speakers,
            ["Magellan", "King Charles V", "Magellan", "King Charles V"]
        );
    }
}
