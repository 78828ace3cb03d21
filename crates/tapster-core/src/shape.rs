use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Semantic category assigned to a classified on-screen region.
///
/// Categories are heuristic guesses about what tapping the region does;
/// [`ActionShape::Unknown`] is a valid outcome, not an error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionShape {
    MenuExit,
    ConfirmOk,
    MoneyChoice,
    TalkChoice,
    MaybeTalkChoice,
    Collectable,
    AreaEntry,
    RoomExit,
    ImportantMarker,
    #[default]
    Unknown,
}

impl ActionShape {
    pub const ALL: [Self; 10] = [
        Self::MenuExit,
        Self::ConfirmOk,
        Self::MoneyChoice,
        Self::TalkChoice,
        Self::MaybeTalkChoice,
        Self::Collectable,
        Self::AreaEntry,
        Self::RoomExit,
        Self::ImportantMarker,
        Self::Unknown,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MenuExit => "menu_exit",
            Self::ConfirmOk => "confirm_ok",
            Self::MoneyChoice => "money_choice",
            Self::TalkChoice => "talk_choice",
            Self::MaybeTalkChoice => "maybe_talk_choice",
            Self::Collectable => "collectable",
            Self::AreaEntry => "area_entry",
            Self::RoomExit => "room_exit",
            Self::ImportantMarker => "important_marker",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ActionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified region in a single frame, in source-frame coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeObservation {
    pub category: ActionShape,
    pub color_label: String,
    pub centroid: Point,
    pub bounds: Rect,
    /// Raw contour area (not the bounding-box area).
    pub contour_area: f64,
    pub vertex_count: usize,
    /// Bounding-box area.
    pub bounds_area: f64,
    /// Bounding-box area divided by contour area; how "solid" the region is.
    pub area_ratio: f64,
}

impl ShapeObservation {
    /// Friendly polygon name for the approximated vertex count.
    #[must_use]
    pub const fn shape_name(&self) -> &'static str {
        match self.vertex_count {
            3 => "triangle",
            4 => "rectangle",
            5 => "pentagon",
            6 => "hexagon",
            7 | 8 => "octagon",
            _ => "contour",
        }
    }
}
