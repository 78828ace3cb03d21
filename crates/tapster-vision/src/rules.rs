use serde::{Deserialize, Serialize};
use tapster_core::{ActionShape, ShapeObservation};

use crate::hsv::Hsv;

/// Hue interval in OpenCV's `0..180` hue space.
///
/// Hue is circular and "red" straddles the origin, so a rule may need the
/// union of two sub-ranges. That case is an explicit variant rather than a
/// sentinel encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HueRange {
    /// Matches `lo..=hi`.
    Span { lo: u8, hi: u8 },
    /// Matches `lo..180` union `0..=hi` (wraps the hue origin).
    Wrap { lo: u8, hi: u8 },
}

impl HueRange {
    /// Builds a range from possibly-negative degrees-over-2 bounds, the
    /// convention used by hand-written rule tables: a negative `lo` means
    /// the range wraps the origin, e.g. `(-2, 1)` covers `178..180` and
    /// `0..=1`.
    #[must_use]
    pub fn new(lo: i16, hi: i16) -> Self {
        let hi = hi.clamp(0, 179) as u8;
        if lo < 0 {
            Self::Wrap {
                lo: (180 + lo.max(-180)) as u8,
                hi,
            }
        } else {
            Self::Span {
                lo: lo.min(179) as u8,
                hi,
            }
        }
    }

    #[must_use]
    pub fn contains(self, h: u8) -> bool {
        match self {
            Self::Span { lo, hi } => (lo..=hi).contains(&h),
            Self::Wrap { lo, hi } => h >= lo || h <= hi,
        }
    }
}

/// One classification rule: a color band plus geometric filters, tagged
/// with the category assigned to surviving contours.
///
/// Rules are evaluated as an unordered set; a region may match several
/// rules and produce one observation per match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRule {
    pub category: ActionShape,
    pub color_label: String,
    pub hue: HueRange,
    /// Saturation bounds, inclusive.
    pub sat: (u8, u8),
    /// Value bounds, inclusive.
    pub val: (u8, u8),
    /// Bounding-box area bounds in source-frame pixels.
    pub min_area: f64,
    pub max_area: f64,
    /// Approximated-polygon vertex-count bounds.
    pub min_verts: usize,
    pub max_verts: usize,
    /// Bounds-area : contour-area ratio bounds.
    pub min_area_ratio: f64,
    pub max_area_ratio: f64,
    /// Minimum centroid y, e.g. to skip a fixed HUD strip.
    #[serde(default)]
    pub min_y: Option<i32>,
    /// Bounding-box width/height ratio bounds.
    #[serde(default)]
    pub wh_ratio: Option<(f64, f64)>,
}

impl ColorRule {
    pub(crate) fn matches_pixel(&self, hsv: Hsv) -> bool {
        self.hue.contains(hsv.h)
            && (self.sat.0..=self.sat.1).contains(&hsv.s)
            && (self.val.0..=self.val.1).contains(&hsv.v)
    }

    /// Geometric filter applied to a candidate observation.
    pub(crate) fn accepts(&self, obs: &ShapeObservation) -> bool {
        if !(self.min_area..=self.max_area).contains(&obs.bounds_area) {
            return false;
        }
        if !(self.min_verts..=self.max_verts).contains(&obs.vertex_count) {
            return false;
        }
        if !(self.min_area_ratio..=self.max_area_ratio).contains(&obs.area_ratio) {
            return false;
        }
        if let Some(min_y) = self.min_y {
            if obs.centroid.y < min_y {
                return false;
            }
        }
        if let Some((lo, hi)) = self.wh_ratio {
            if !(lo..=hi).contains(&obs.bounds.aspect_ratio()) {
                return false;
            }
        }
        true
    }
}

/// The full rule table, loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRuleSet {
    pub rules: Vec<ColorRule>,
}

impl Default for ColorRuleSet {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

fn default_rules() -> Vec<ColorRule> {
    let rule = |category: ActionShape,
                label: &str,
                hue: HueRange,
                sat: (u8, u8),
                val: (u8, u8),
                area: (f64, f64)| ColorRule {
        category,
        color_label: label.to_owned(),
        hue,
        sat,
        val,
        min_area: area.0,
        max_area: area.1,
        min_verts: 3,
        max_verts: 10,
        min_area_ratio: 1.0,
        max_area_ratio: 3.0,
        min_y: None,
        wh_ratio: None,
    };

    vec![
        rule(
            ActionShape::TalkChoice,
            "Light Blue",
            HueRange::new(100, 120),
            (160, 255),
            (50, 255),
            (2000.0, 250_000.0),
        ),
        rule(
            ActionShape::MoneyChoice,
            "Light Green",
            HueRange::new(40, 65),
            (100, 255),
            (50, 255),
            (2000.0, 250_000.0),
        ),
        rule(
            ActionShape::MaybeTalkChoice,
            "Light Gray",
            HueRange::new(100, 105),
            (50, 100),
            (200, 255),
            (2000.0, 250_000.0),
        ),
        // Red close buttons are small; hue wraps the origin.
        ColorRule {
            min_verts: 3,
            max_verts: 12,
            min_area_ratio: 1.0,
            max_area_ratio: 4.0,
            ..rule(
                ActionShape::MenuExit,
                "Red",
                HueRange::new(-5, 5),
                (110, 255),
                (180, 255),
                (60.0, 2000.0),
            )
        },
        rule(
            ActionShape::ConfirmOk,
            "Gold",
            HueRange::new(10, 30),
            (120, 255),
            (50, 255),
            (2000.0, 250_000.0),
        ),
        ColorRule {
            wh_ratio: Some((0.5, 2.0)),
            ..rule(
                ActionShape::Collectable,
                "Bright Yellow",
                HueRange::new(25, 35),
                (150, 255),
                (150, 255),
                (300.0, 5000.0),
            )
        },
        ColorRule {
            wh_ratio: Some((0.6, 3.5)),
            ..rule(
                ActionShape::AreaEntry,
                "Teal",
                HueRange::new(85, 100),
                (100, 255),
                (80, 255),
                (1500.0, 250_000.0),
            )
        },
        ColorRule {
            min_y: Some(40),
            ..rule(
                ActionShape::RoomExit,
                "Purple",
                HueRange::new(125, 150),
                (80, 255),
                (60, 255),
                (1200.0, 250_000.0),
            )
        },
        ColorRule {
            max_area_ratio: 5.0,
            ..rule(
                ActionShape::ImportantMarker,
                "Magenta",
                HueRange::new(150, 170),
                (120, 255),
                (120, 255),
                (400.0, 100_000.0),
            )
        },
    ]
}
