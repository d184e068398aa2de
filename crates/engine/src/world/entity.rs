use serde::Deserialize;
use thiserror::Error;

use super::{TilePos, TileRect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    NpcKing,
    Charles,
    Kawal,
    Sailor1,
    Sailor2,
    Humabon,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::NpcKing,
        EntityKind::Charles,
        EntityKind::Kawal,
        EntityKind::Sailor1,
        EntityKind::Sailor2,
        EntityKind::Humabon,
    ];

    /// Width and height in tiles.
    pub const fn footprint(self) -> (i32, i32) {
        match self {
            EntityKind::NpcKing => (3, 3),
            EntityKind::Charles
            | EntityKind::Kawal
            | EntityKind::Sailor1
            | EntityKind::Sailor2
            | EntityKind::Humabon => (2, 2),
        }
    }

    pub const fn is_collidable(self) -> bool {
        true
    }

    pub const fn asset_key(self) -> &'static str {
        match self {
            EntityKind::NpcKing => "objects/manuel",
            EntityKind::Charles => "objects/charles",
            EntityKind::Kawal => "objects/kawal",
            EntityKind::Sailor1 => "objects/sailor1",
            EntityKind::Sailor2 => "objects/sailor2",
            EntityKind::Humabon => "objects/rajah",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            EntityKind::NpcKing => "M",
            EntityKind::Charles => "C",
            EntityKind::Kawal => "K",
            EntityKind::Sailor1 => "S1",
            EntityKind::Sailor2 => "S2",
            EntityKind::Humabon => "H",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DialogueLine {
    #[serde(default)]
    pub speaker: Option<String>,
    pub text: String,
}

impl DialogueLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            speaker: None,
            text: text.into(),
        }
    }

    pub fn spoken_by(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: Some(speaker.into()),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("dialogue script must contain at least one line")]
    Empty,
}

/// Ordered, non-empty list of dialogue lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<DialogueLine>")]
pub struct DialogueScript {
    lines: Vec<DialogueLine>,
}

impl DialogueScript {
    pub fn new(lines: Vec<DialogueLine>) -> Result<Self, ScriptError> {
        if lines.is_empty() {
            return Err(ScriptError::Empty);
        }
        Ok(Self { lines })
    }

    pub fn single(text: impl Into<String>) -> Self {
        Self {
            lines: vec![DialogueLine::new(text)],
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[DialogueLine] {
        &self.lines
    }

    fn last_index(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }
}

impl TryFrom<Vec<DialogueLine>> for DialogueScript {
    type Error = ScriptError;

    fn try_from(lines: Vec<DialogueLine>) -> Result<Self, Self::Error> {
        Self::new(lines)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub pos: TilePos,
    pub kind: EntityKind,
}

/// Result of one `advance` call. `effect` is `Some` only on the first
/// completion of a session; repeated calls at the final line keep returning
/// that line with no effect until `reset`.
#[derive(Debug, PartialEq, Eq)]
pub enum DialogueStep<'a, C> {
    Continuing {
        line: &'a DialogueLine,
    },
    Completed {
        line: &'a DialogueLine,
        effect: Option<C>,
    },
}

#[derive(Debug, Clone)]
pub struct InteractiveEntity<C> {
    name: String,
    kind: EntityKind,
    pos: TilePos,
    script: DialogueScript,
    line_index: usize,
    completion: Option<C>,
    completion_fired: bool,
}

impl<C: Clone> InteractiveEntity<C> {
    pub fn new(name: impl Into<String>, kind: EntityKind, pos: TilePos, script: DialogueScript) -> Self {
        Self {
            name: name.into(),
            kind,
            pos,
            script,
            line_index: 0,
            completion: None,
            completion_fired: false,
        }
    }

    pub fn with_completion(mut self, effect: C) -> Self {
        self.completion = Some(effect);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn position(&self) -> TilePos {
        self.pos
    }

    pub fn placement(&self) -> Placement {
        Placement {
            pos: self.pos,
            kind: self.kind,
        }
    }

    pub fn completion(&self) -> Option<&C> {
        self.completion.as_ref()
    }

    pub fn script(&self) -> &DialogueScript {
        &self.script
    }

    pub fn footprint(&self) -> TileRect {
        let (width, height) = self.kind.footprint();
        TileRect::new(self.pos.x, self.pos.y, width, height)
    }

    pub fn occupies(&self, x: i32, y: i32) -> bool {
        self.footprint().contains(x, y)
    }

    pub fn is_collidable(&self) -> bool {
        self.kind.is_collidable()
    }

    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn is_last_line(&self) -> bool {
        self.line_index >= self.script.last_index()
    }

    pub fn current_line(&self) -> &DialogueLine {
        &self.script.lines[self.line_index]
    }

    pub fn current_speaker(&self) -> &str {
        self.current_line()
            .speaker
            .as_deref()
            .unwrap_or(self.name.as_str())
    }

    pub fn advance(&mut self) -> DialogueStep<'_, C> {
        if self.line_index < self.script.last_index() {
            self.line_index += 1;
            return DialogueStep::Continuing {
                line: &self.script.lines[self.line_index],
            };
        }

        let effect = if self.completion_fired {
            None
        } else {
            self.completion_fired = true;
            self.completion.clone()
        };
        DialogueStep::Completed {
            line: &self.script.lines[self.line_index],
            effect,
        }
    }

    pub fn reset(&mut self) {
        self.line_index = 0;
        self.completion_fired = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_line_script() -> DialogueScript {
        DialogueScript::new(vec![
            DialogueLine::spoken_by("Magellan", "one"),
            DialogueLine::new("two"),
            DialogueLine::spoken_by("Magellan", "three"),
        ])
        .expect("script")
    }

    #[test]
    fn empty_script_is_rejected() {
        assert_eq!(DialogueScript::new(Vec::new()), Err(ScriptError::Empty));
        let parsed = serde_json::from_str::<DialogueScript>("[]");
        assert!(parsed.is_err());
    }

    #[test]
    fn advance_walks_lines_then_completes_once() {
        let mut entity =
            InteractiveEntity::new("King", EntityKind::NpcKing, TilePos::new(0, 0), three_line_script())
                .with_completion(7u8);

        assert_eq!(entity.current_line().text, "one");
        assert!(matches!(entity.advance(), DialogueStep::Continuing { line } if line.text == "two"));
        assert!(matches!(entity.advance(), DialogueStep::Continuing { line } if line.text == "three"));
        assert!(entity.is_last_line());

        match entity.advance() {
            DialogueStep::Completed { line, effect } => {
                assert_eq!(line.text, "three");
                assert_eq!(effect, Some(7));
            }
            other => panic!("expected completion, got {other:?}"),
        }
        for _ in 0..5 {
            match entity.advance() {
                DialogueStep::Completed { line, effect } => {
                    assert_eq!(line.text, "three");
                    assert_eq!(effect, None);
                }
                other => panic!("expected idempotent completion, got {other:?}"),
            }
        }
        assert_eq!(entity.line_index(), 2);
    }

    #[test]
    fn reset_rearms_completion() {
        let mut entity = InteractiveEntity::new(
            "Sailor",
            EntityKind::Sailor1,
            TilePos::new(0, 0),
            DialogueScript::single("..."),
        )
        .with_completion("flag");

        assert!(matches!(
            entity.advance(),
            DialogueStep::Completed { effect: Some("flag"), .. }
        ));
        assert!(matches!(entity.advance(), DialogueStep::Completed { effect: None, .. }));

        entity.reset();
        assert_eq!(entity.line_index(), 0);
        assert!(matches!(
            entity.advance(),
            DialogueStep::Completed { effect: Some("flag"), .. }
        ));
    }

    #[test]
    fn speaker_falls_back_to_entity_name() {
        let mut entity: InteractiveEntity<()> =
            InteractiveEntity::new("King", EntityKind::NpcKing, TilePos::new(0, 0), three_line_script());
        assert_eq!(entity.current_speaker(), "Magellan");
        let _ = entity.advance();
        assert_eq!(entity.current_speaker(), "King");
    }

    #[test]
    fn footprint_is_anchored_at_position() {
        let entity: InteractiveEntity<()> = InteractiveEntity::new(
            "King",
            EntityKind::NpcKing,
            TilePos::new(9, 2),
            DialogueScript::single("..."),
        );
        assert_eq!(entity.footprint(), TileRect::new(9, 2, 3, 3));
        assert!(entity.occupies(11, 4));
        assert!(!entity.occupies(12, 4));
        assert!(!entity.occupies(9, 5));
    }

    #[test]
    fn catalog_footprints_are_positive() {
        for kind in EntityKind::ALL {
            let (width, height) = kind.footprint();
            assert!(width > 0 && height > 0, "{kind:?}");
            assert!(kind.is_collidable(), "{kind:?}");
        }
    }

    #[test]
    fn script_lines_parse_with_optional_speaker() {
        let script: DialogueScript = serde_json::from_str(
            r#"[{"speaker": "Magellan", "text": "a"}, {"text": "b"}]"#,
        )
        .expect("script");
        assert_eq!(script.len(), 2);
        assert_eq!(script.lines()[1].speaker, None);
    }
}
