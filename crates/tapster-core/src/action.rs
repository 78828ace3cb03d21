use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{geometry::Point, state::ObservedObject};

/// The discriminant of an [`Action`], used as a weight-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Pass,
    SwipeLeft,
    SwipeRight,
    Tap,
    DoubleTap,
    Reset,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
            Self::Tap => "tap",
            Self::DoubleTap => "double_tap",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a tap candidate is aimed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TapKind {
    /// A fixed menu location (e.g. a back button).
    Menu,
    /// A fixed always-worth-trying screen region.
    HotRegion,
    /// An observed on-screen object.
    Object(ObservedObject),
}

impl TapKind {
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::HotRegion => "hot_region",
            Self::Object(_) => "object",
        }
    }
}

/// Target of a tap or double-tap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapTarget {
    pub point: Point,
    pub kind: TapKind,
}

/// One executable game action.
///
/// Modeled as a sum type so the weighting and dispatch code is exhaustively
/// matched; the argument payload travels inside the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Pass,
    SwipeLeft,
    SwipeRight,
    Tap(TapTarget),
    DoubleTap(TapTarget),
    Reset,
}

impl Action {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Pass => ActionKind::Pass,
            Self::SwipeLeft => ActionKind::SwipeLeft,
            Self::SwipeRight => ActionKind::SwipeRight,
            Self::Tap(_) => ActionKind::Tap,
            Self::DoubleTap(_) => ActionKind::DoubleTap,
            Self::Reset => ActionKind::Reset,
        }
    }

    #[must_use]
    pub const fn tap_target(&self) -> Option<&TapTarget> {
        match self {
            Self::Tap(target) | Self::DoubleTap(target) => Some(target),
            _ => None,
        }
    }

    /// Whether this is a tap or double-tap on an observed object.
    #[must_use]
    pub fn is_object_tap(&self) -> bool {
        self.tap_target().is_some_and(|t| t.kind.is_object())
    }

    /// Canonical representation string for in-room selection tracking.
    ///
    /// Non-tap actions collapse to their kind name. Menu and hot-region taps
    /// collapse to `tap_<type>`. Object taps keep the object type plus a
    /// coarse x/y bucket so visually distinct taps are tracked separately.
    #[must_use]
    pub fn representation(&self) -> String {
        let Some(target) = self.tap_target() else {
            return self.kind().as_str().to_owned();
        };
        let name = self.kind().as_str();
        match &target.kind {
            TapKind::Menu | TapKind::HotRegion => format!("{name}_{}", target.kind.type_str()),
            TapKind::Object(obj) => {
                let rough_x = target.point.x / 10;
                let rough_y = target.point.y / 10;
                format!(
                    "{name}_object_{}_x{rough_x}_y{rough_y}",
                    obj.object_type().to_lowercase()
                )
            }
        }
    }
}
