use serde::Deserialize;
use tracing::debug;
use voyage_engine::{TileGrid, TileKind, TilePos};

use super::mission::{MissionFlag, MissionLedger};

/// The six scenes of the voyage, in play order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Chapter {
    ThroneRoom,
    SevilleDock,
    AtlanticCoast,
    PortSaintJulian,
    PacificCrossing,
    Cebu,
}

#[derive(Debug, Clone, Copy)]
enum Strip {
    Row { y: i32, from_x: i32, to_x: i32 },
    Column { x: i32, from_y: i32, to_y: i32 },
}

const fn row(y: i32, from_x: i32, to_x: i32) -> Strip {
    Strip::Row { y, from_x, to_x }
}

const fn column(x: i32, from_y: i32, to_y: i32) -> Strip {
    Strip::Column { x, from_y, to_y }
}

const DOCK_PIER: &[Strip] = &[
    row(41, 20, 60),
    row(48, 20, 60),
    column(20, 41, 49),
    column(60, 41, 49),
];

const SHIP_DECK_HULL: &[Strip] = &[
    row(10, 0, 20),
    row(11, 20, 44),
    row(10, 44, 61),
    row(22, 0, 8),
    row(23, 8, 20),
    row(24, 19, 20),
    row(25, 22, 44),
    row(24, 44, 45),
    row(23, 45, 61),
    row(13, 42, 50),
    column(42, 14, 18),
    column(43, 14, 18),
    column(44, 14, 18),
    row(19, 42, 50),
];

const PORT_JULIAN_SHORE: &[Strip] = &[
    row(5, 15, 40),
    column(17, 5, 15),
    row(17, 8, 15),
    row(35, 35, 40),
    row(40, 0, 40),
    row(30, 35, 40),
    column(35, 32, 40),
    column(8, 0, 40),
    column(40, 0, 40),
];

const CEBU_SHORE: &[Strip] = &[column(50, 0, 64)];

const CARPET_START_ROW: i32 = 4;

impl Chapter {
    pub(crate) const ALL: [Chapter; 6] = [
        Chapter::ThroneRoom,
        Chapter::SevilleDock,
        Chapter::AtlanticCoast,
        Chapter::PortSaintJulian,
        Chapter::PacificCrossing,
        Chapter::Cebu,
    ];

    pub(crate) const fn index(self) -> usize {
        match self {
            Chapter::ThroneRoom => 0,
            Chapter::SevilleDock => 1,
            Chapter::AtlanticCoast => 2,
            Chapter::PortSaintJulian => 3,
            Chapter::PacificCrossing => 4,
            Chapter::Cebu => 5,
        }
    }

    pub(crate) fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub(crate) fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub(crate) const fn label(self) -> &'static str {
        match self {
            Chapter::ThroneRoom => "Throne Room of Portugal",
            Chapter::SevilleDock => "Dock of Seville",
            Chapter::AtlanticCoast => "Atlantic Coast",
            Chapter::PortSaintJulian => "Port Saint Julian",
            Chapter::PacificCrossing => "Pacific Crossing",
            Chapter::Cebu => "Cebu",
        }
    }

    /// Scene size in tiles, `(cols, rows)`.
    pub(crate) const fn dimensions(self) -> (i32, i32) {
        match self {
            Chapter::ThroneRoom => (21, 30),
            Chapter::SevilleDock => (64, 64),
            Chapter::AtlanticCoast => (61, 32),
            Chapter::PortSaintJulian => (48, 48),
            Chapter::PacificCrossing => (61, 32),
            Chapter::Cebu => (64, 64),
        }
    }

    pub(crate) const fn spawn(self) -> TilePos {
        match self {
            Chapter::ThroneRoom => TilePos::new(10, 15),
            Chapter::SevilleDock => TilePos::new(25, 45),
            Chapter::AtlanticCoast => TilePos::new(25, 20),
            Chapter::PortSaintJulian => TilePos::new(24, 24),
            Chapter::PacificCrossing => TilePos::new(15, 15),
            Chapter::Cebu => TilePos::new(9, 9),
        }
    }

    pub(crate) const fn exit_cell(self) -> TilePos {
        match self {
            Chapter::ThroneRoom => TilePos::new(10, 29),
            Chapter::SevilleDock => TilePos::new(59, 45),
            Chapter::AtlanticCoast => TilePos::new(45, 17),
            Chapter::PortSaintJulian => TilePos::new(24, 20),
            Chapter::PacificCrossing => TilePos::new(45, 17),
            Chapter::Cebu => TilePos::new(0, 32),
        }
    }

    pub(crate) const fn gate(self) -> MissionFlag {
        match self {
            Chapter::ThroneRoom => MissionFlag::TalkedToKingManuel,
            Chapter::SevilleDock => MissionFlag::TalkedToKingCharles,
            Chapter::AtlanticCoast => MissionFlag::TalkedToSailor,
            Chapter::PortSaintJulian => MissionFlag::DealtWithMutineers,
            Chapter::PacificCrossing => MissionFlag::TalkedToAllSailors,
            Chapter::Cebu => MissionFlag::TalkedToHumabon,
        }
    }

    /// Kind painted on the exit cell while the gate is closed. The dock
    /// blocks it with water; every other chapter leaves plain floor.
    pub(crate) const fn disabled_exit_kind(self) -> TileKind {
        match self {
            Chapter::ThroneRoom => TileKind::CarpetMiddle,
            Chapter::SevilleDock => TileKind::Water,
            Chapter::AtlanticCoast
            | Chapter::PortSaintJulian
            | Chapter::PacificCrossing
            | Chapter::Cebu => TileKind::Grass,
        }
    }

    pub(crate) const fn background_key(self) -> Option<&'static str> {
        match self {
            Chapter::ThroneRoom => None,
            Chapter::SevilleDock => Some("backgrounds/seville_dock"),
            Chapter::AtlanticCoast | Chapter::PacificCrossing => Some("backgrounds/ship_deck"),
            Chapter::PortSaintJulian => Some("backgrounds/port_julian"),
            Chapter::Cebu => Some("backgrounds/cebu"),
        }
    }

    pub(crate) fn is_open(self, ledger: &MissionLedger) -> bool {
        ledger.get(self.gate())
    }

    /// Fresh grid for this chapter with the exit already derived from `ledger`.
    pub(crate) fn build_grid(self, ledger: &MissionLedger) -> TileGrid {
        let (cols, rows) = self.dimensions();
        let mut grid = TileGrid::new(cols, rows);
        self.paint(&mut grid);
        self.update_exit(&mut grid, ledger);
        grid
    }

    fn paint(self, grid: &mut TileGrid) {
        match self {
            Chapter::ThroneRoom => paint_throne_room(grid),
            Chapter::SevilleDock => paint_overlay(grid, DOCK_PIER),
            Chapter::AtlanticCoast | Chapter::PacificCrossing => {
                paint_overlay(grid, SHIP_DECK_HULL)
            }
            Chapter::PortSaintJulian => paint_overlay(grid, PORT_JULIAN_SHORE),
            Chapter::Cebu => paint_overlay(grid, CEBU_SHORE),
        }
        if let Some(key) = self.background_key() {
            grid.set_background(key);
        }
    }

    /// Re-derives the exit cell's kind and flag together from the gate.
    /// Returns whether the exit is open.
    pub(crate) fn update_exit(self, grid: &mut TileGrid, ledger: &MissionLedger) -> bool {
        let exit = self.exit_cell();
        let open = self.is_open(ledger);
        let kind = if open {
            TileKind::Door
        } else {
            self.disabled_exit_kind()
        };
        grid.set(exit.x, exit.y, kind);
        grid.set_exit(exit.x, exit.y, open);
        debug!(chapter = ?self, x = exit.x, y = exit.y, open, "exit_updated");
        open
    }

    pub(crate) const fn mission_text(self, gate_open: bool) -> &'static str {
        match (self, gate_open) {
            (Chapter::ThroneRoom, false) => {
                "Present your westward route proposal to King Manuel I of Portugal."
            }
            (Chapter::ThroneRoom, true) => {
                "King Manuel has rejected your proposal. Travel to Spain to seek support from King Charles V."
            }
            (Chapter::SevilleDock, false) => {
                "Find King Charles V and convince him to support your westward voyage to the Spice Islands."
            }
            (Chapter::SevilleDock, true) => {
                "King Charles has granted you ships and crew! Sail from the eastern dock to begin your historic journey."
            }
            (Chapter::AtlanticCoast, false) => {
                "Navigate south along the American coastline and search for the passage to the Pacific Ocean. Talk to your crew member for updates."
            }
            (Chapter::AtlanticCoast, true) => {
                "Continue sailing south. The crew is concerned about finding the passage, but you must press on toward the southern tip of the continent."
            }
            (Chapter::PortSaintJulian, false) => {
                "Confront the mutineers who are plotting against your command. The fate of the expedition depends on your leadership."
            }
            (Chapter::PortSaintJulian, true) => {
                "The mutiny has been crushed. Continue your journey with a more unified, if smaller, fleet."
            }
            (Chapter::PacificCrossing, false) => {
                "Check on your crew members. They are suffering from hunger and losing hope after the long Pacific crossing."
            }
            (Chapter::PacificCrossing, true) => {
                "Land has been sighted! Continue to Guam for much-needed provisions and rest."
            }
            (Chapter::Cebu, false) => {
                "Meet with Rajah Humabon to establish an alliance and perform the blood compact ritual."
            }
            (Chapter::Cebu, true) => {
                "The blood compact is complete. Your historic journey has reached its conclusion."
            }
        }
    }

    pub(crate) fn current_mission(self, ledger: &MissionLedger) -> &'static str {
        self.mission_text(self.is_open(ledger))
    }

    /// Shown when the player reaches the exit before the gate is satisfied.
    pub(crate) const fn advisory(self) -> &'static str {
        match self {
            Chapter::ThroneRoom => "You should talk to King Manuel before leaving.",
            Chapter::SevilleDock => "You should talk to King Charles before sailing.",
            Chapter::AtlanticCoast => "You should talk to your crew member before continuing.",
            Chapter::PortSaintJulian => "You must confront the mutineers before continuing.",
            Chapter::PacificCrossing => {
                "You should check on all your crew members before continuing."
            }
            Chapter::Cebu => "You must speak with Rajah Humabon to complete your journey.",
        }
    }
}

/// Column of the carpet's middle lane; the carpet spans one tile either side.
pub(crate) fn carpet_center_x(cols: i32) -> i32 {
    cols / 2
}

fn paint_throne_room(grid: &mut TileGrid) {
    for y in 0..grid.rows() {
        for x in 0..grid.cols() {
            let kind = if (x + y) % 2 == 0 {
                TileKind::Tile1
            } else {
                TileKind::Tile2
            };
            grid.set(x, y, kind);
        }
    }
    let center = carpet_center_x(grid.cols());
    let last_row = grid.rows() - 1;
    grid.paint_column(center - 1, CARPET_START_ROW..=last_row, TileKind::CarpetLeft);
    grid.paint_column(center, CARPET_START_ROW..=last_row, TileKind::CarpetMiddle);
    grid.paint_column(center + 1, CARPET_START_ROW..=last_row, TileKind::CarpetRight);
}

fn paint_overlay(grid: &mut TileGrid, strips: &[Strip]) {
    grid.fill(TileKind::Grass);
    for strip in strips {
        match *strip {
            Strip::Row { y, from_x, to_x } => grid.paint_row(y, from_x..=to_x, TileKind::Water),
            Strip::Column { x, from_y, to_y } => {
                grid.paint_column(x, from_y..=to_y, TileKind::Water)
            }
        }
    }
}
