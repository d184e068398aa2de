use serde::Deserialize;
use tracing::info;

/// Story flags gating each chapter's exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum MissionFlag {
    TalkedToKingManuel,
    TalkedToKingCharles,
    TalkedToSailor,
    DealtWithMutineers,
    TalkedToAllSailors,
    TalkedToHumabon,
}

const FLAG_COUNT: usize = 6;

impl MissionFlag {
    pub(crate) const ALL: [MissionFlag; FLAG_COUNT] = [
        MissionFlag::TalkedToKingManuel,
        MissionFlag::TalkedToKingCharles,
        MissionFlag::TalkedToSailor,
        MissionFlag::DealtWithMutineers,
        MissionFlag::TalkedToAllSailors,
        MissionFlag::TalkedToHumabon,
    ];

    const fn index(self) -> usize {
        match self {
            MissionFlag::TalkedToKingManuel => 0,
            MissionFlag::TalkedToKingCharles => 1,
            MissionFlag::TalkedToSailor => 2,
            MissionFlag::DealtWithMutineers => 3,
            MissionFlag::TalkedToAllSailors => 4,
            MissionFlag::TalkedToHumabon => 5,
        }
    }
}

/// Owned flag store. Setters never notify; callers re-derive exits themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MissionLedger {
    flags: [bool; FLAG_COUNT],
}

impl MissionLedger {
    pub(crate) fn get(&self, flag: MissionFlag) -> bool {
        self.flags[flag.index()]
    }

    pub(crate) fn set(&mut self, flag: MissionFlag, value: bool) {
        let slot = &mut self.flags[flag.index()];
        if *slot != value {
            *slot = value;
            info!(flag = ?flag, value, "mission_flag_set");
        }
    }

    pub(crate) fn reset_all(&mut self) {
        self.flags = [false; FLAG_COUNT];
    }
}
