use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use voyage_engine::{DialogueScript, EntityKind, TilePos};

use super::chapters::Chapter;
use super::mission::MissionFlag;

const EMBEDDED_STORY: &str = include_str!("story.json");

/// Interstitials: one before each chapter plus the closing one.
pub(crate) const NARRATIVE_COUNT: usize = Chapter::ALL.len() + 1;
pub(crate) const FINALE_NARRATIVE: usize = NARRATIVE_COUNT - 1;

#[derive(Debug, Error)]
pub(crate) enum ContentError {
    #[error("parse story content at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("story content declares {found} narratives, expected {expected}")]
    NarrativeCount { expected: usize, found: usize },
    #[error("narrative {index} has no pages")]
    EmptyNarrative { index: usize },
    #[error("chapter {chapter:?} has no cast entry")]
    MissingChapter { chapter: Chapter },
    #[error("chapter {chapter:?} cast is declared more than once")]
    DuplicateChapter { chapter: Chapter },
    #[error(
        "chapter {chapter:?} needs exactly one cast member completing {gate:?}, found {found}"
    )]
    GateNotCarried {
        chapter: Chapter,
        gate: MissionFlag,
        found: usize,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CastMember {
    pub(crate) name: String,
    pub(crate) kind: EntityKind,
    pub(crate) at: TilePos,
    #[serde(default)]
    pub(crate) completes: Option<MissionFlag>,
    pub(crate) script: DialogueScript,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChapterCast {
    chapter: Chapter,
    cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoryDocument {
    narratives: Vec<Vec<String>>,
    chapters: Vec<ChapterCast>,
}

/// Validated narrative pages and per-chapter casts.
#[derive(Debug, Clone)]
pub(crate) struct StoryContent {
    narratives: Vec<Vec<String>>,
    casts: HashMap<Chapter, Vec<CastMember>>,
}

impl StoryContent {
    pub(crate) fn embedded() -> Result<Self, ContentError> {
        Self::from_json(EMBEDDED_STORY)
    }

    pub(crate) fn from_json(raw: &str) -> Result<Self, ContentError> {
        let document = parse_story_json(raw)?;
        Self::validate(document)
    }

    fn validate(document: StoryDocument) -> Result<Self, ContentError> {
        if document.narratives.len() != NARRATIVE_COUNT {
            return Err(ContentError::NarrativeCount {
                expected: NARRATIVE_COUNT,
                found: document.narratives.len(),
            });
        }
        if let Some(index) = document.narratives.iter().position(Vec::is_empty) {
            return Err(ContentError::EmptyNarrative { index });
        }

        let mut casts = HashMap::new();
        for entry in document.chapters {
            if casts.contains_key(&entry.chapter) {
                return Err(ContentError::DuplicateChapter {
                    chapter: entry.chapter,
                });
            }
            casts.insert(entry.chapter, entry.cast);
        }

        for chapter in Chapter::ALL {
            let cast = casts
                .get(&chapter)
                .ok_or(ContentError::MissingChapter { chapter })?;
            let gate = chapter.gate();
            let found = cast
                .iter()
                .filter(|member| member.completes == Some(gate))
                .count();
            if found != 1 {
                return Err(ContentError::GateNotCarried {
                    chapter,
                    gate,
                    found,
                });
            }
        }

        Ok(Self {
            narratives: document.narratives,
            casts,
        })
    }

    pub(crate) fn narrative(&self, index: usize) -> &[String] {
        self.narratives.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn cast(&self, chapter: Chapter) -> &[CastMember] {
        self.casts.get(&chapter).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn parse_story_json(raw: &str) -> Result<StoryDocument, ContentError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, StoryDocument>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let message = error.into_inner().to_string();
        ContentError::Parse { path, message }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_cast_json(chapter: &str, gate: &str) -> String {
        format!(
            r#"{{ "chapter": "{chapter}", "cast": [{{ "name": "N", "kind": "sailor1",
            "at": {{ "x": 1, "y": 1 }}, "completes": "{gate}", "script": [{{ "text": "hi" }}] }}] }}"#
        )
    }

    fn document_json(narratives: usize, chapters: &[String]) -> String {
        let narratives = vec![r#"["page"]"#; narratives].join(",");
        format!(
            r#"{{ "narratives": [{narratives}], "chapters": [{}] }}"#,
            chapters.join(",")
        )
    }

    fn all_chapters() -> Vec<String> {
        vec![
            minimal_cast_json("throne_room", "talked_to_king_manuel"),
            minimal_cast_json("seville_dock", "talked_to_king_charles"),
            minimal_cast_json("atlantic_coast", "talked_to_sailor"),
            minimal_cast_json("port_saint_julian", "dealt_with_mutineers"),
            minimal_cast_json("pacific_crossing", "talked_to_all_sailors"),
            minimal_cast_json("cebu", "talked_to_humabon"),
        ]
    }

    #[test]
    fn embedded_story_is_valid() {
        let story = StoryContent::embedded().expect("embedded story");
        for index in 0..NARRATIVE_COUNT {
            assert!(!story.narrative(index).is_empty());
        }
        for chapter in Chapter::ALL {
            assert!(!story.cast(chapter).is_empty(), "{chapter:?}");
        }
    }

    #[test]
    fn embedded_cast_fits_inside_each_chapter() {
        let story = StoryContent::embedded().expect("embedded story");
        for chapter in Chapter::ALL {
            let (cols, rows) = chapter.dimensions();
            for member in story.cast(chapter) {
                let (width, height) = member.kind.footprint();
                assert!(member.at.x >= 0 && member.at.x + width <= cols, "{}", member.name);
                assert!(member.at.y >= 0 && member.at.y + height <= rows, "{}", member.name);
            }
        }
    }

    #[test]
    fn minimal_document_parses() {
        let story = StoryContent::from_json(&document_json(NARRATIVE_COUNT, &all_chapters()))
            .expect("valid document");
        assert_eq!(story.narrative(FINALE_NARRATIVE), ["page".to_string()]);
        assert!(story.narrative(NARRATIVE_COUNT).is_empty());
    }

    #[test]
    fn wrong_narrative_count_is_rejected() {
        let error = StoryContent::from_json(&document_json(3, &all_chapters()))
            .expect_err("count mismatch");
        assert!(matches!(
            error,
            ContentError::NarrativeCount {
                expected: NARRATIVE_COUNT,
                found: 3
            }
        ));
    }

    #[test]
    fn missing_and_duplicate_chapters_are_rejected() {
        let mut chapters = all_chapters();
        chapters.pop();
        let error = StoryContent::from_json(&document_json(NARRATIVE_COUNT, &chapters))
            .expect_err("missing chapter");
        assert!(matches!(
            error,
            ContentError::MissingChapter {
                chapter: Chapter::Cebu
            }
        ));

        let mut chapters = all_chapters();
        chapters.push(minimal_cast_json("cebu", "talked_to_humabon"));
        let error = StoryContent::from_json(&document_json(NARRATIVE_COUNT, &chapters))
            .expect_err("duplicate chapter");
        assert!(matches!(error, ContentError::DuplicateChapter { .. }));
    }

    #[test]
    fn gate_must_be_carried_by_its_own_chapter() {
        let mut chapters = all_chapters();
        chapters[0] = minimal_cast_json("throne_room", "talked_to_sailor");
        let error = StoryContent::from_json(&document_json(NARRATIVE_COUNT, &chapters))
            .expect_err("gate not carried");
        assert!(matches!(
            error,
            ContentError::GateNotCarried {
                chapter: Chapter::ThroneRoom,
                found: 0,
                ..
            }
        ));
    }

    #[test]
    fn empty_script_reports_its_json_path() {
        let mut chapters = all_chapters();
        chapters[2] = r#"{ "chapter": "atlantic_coast", "cast": [{ "name": "N", "kind": "sailor1",
            "at": { "x": 1, "y": 1 }, "completes": "talked_to_sailor", "script": [] }] }"#
            .to_string();
        let error = StoryContent::from_json(&document_json(NARRATIVE_COUNT, &chapters))
            .expect_err("empty script");
        match error {
            ContentError::Parse { path, message } => {
                assert_eq!(path, "chapters[2].cast[0].script");
                assert!(message.contains("at least one line"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
