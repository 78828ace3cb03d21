use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tapster_core::{ActionKind, ActionShape, BlobColor};

/// Base weight per action kind. Reset keeps a tiny non-zero weight so it
/// stays reachable by chance even without stagnation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseActionWeights {
    pub pass: f64,
    pub swipe_left: f64,
    pub swipe_right: f64,
    pub tap: f64,
    pub double_tap: f64,
    pub reset: f64,
}

impl Default for BaseActionWeights {
    fn default() -> Self {
        Self {
            pass: 50.0,
            swipe_left: 200.0,
            swipe_right: 200.0,
            tap: 500.0,
            double_tap: 150.0,
            reset: 1.0,
        }
    }
}

impl BaseActionWeights {
    #[must_use]
    pub const fn get(&self, kind: ActionKind) -> f64 {
        match kind {
            ActionKind::Pass => self.pass,
            ActionKind::SwipeLeft => self.swipe_left,
            ActionKind::SwipeRight => self.swipe_right,
            ActionKind::Tap => self.tap,
            ActionKind::DoubleTap => self.double_tap,
            ActionKind::Reset => self.reset,
        }
    }
}

/// Multipliers for fixed (non-object) tap targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapTypeWeights {
    pub menu: f64,
    pub hot_region: f64,
}

impl Default for TapTypeWeights {
    fn default() -> Self {
        Self {
            menu: 0.5,
            hot_region: 1.5,
        }
    }
}

/// Weights for blob taps keyed by the blob's dominant color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobColorWeights {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub black: f64,
    pub white: f64,
    pub other: f64,
}

impl Default for BlobColorWeights {
    fn default() -> Self {
        Self {
            red: 300.0,
            green: 600.0,
            blue: 1000.0,
            black: 200.0,
            white: 1000.0,
            other: 50.0,
        }
    }
}

impl BlobColorWeights {
    #[must_use]
    pub const fn get(&self, color: BlobColor) -> f64 {
        match color {
            BlobColor::Red => self.red,
            BlobColor::Green => self.green,
            BlobColor::Blue => self.blue,
            BlobColor::Black => self.black,
            BlobColor::White => self.white,
        }
    }
}

/// Tap type of a configured fixed tap location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedTapKind {
    Menu,
    HotRegion,
}

/// A fixed tap location expressed as a fraction of the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedTap {
    pub fx: f64,
    pub fy: f64,
    pub kind: FixedTapKind,
}

/// Every tunable of the room tracker and decision engine.
///
/// Injected by value at construction; components never read globals, so
/// several engines can coexist (e.g. in tests) without interference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Heuristic toggles.
    pub repeat_action_depress: bool,
    pub recent_room_memory: bool,
    pub color_action_detect: bool,

    pub room_history_capacity: usize,
    /// Consecutive identical screen hashes tolerated before a forced reset.
    pub stagnation_limit: u32,
    /// Capacity of each room's rolling reward-component log.
    pub reward_log_capacity: usize,

    pub base_weights: BaseActionWeights,
    pub tap_type_weights: TapTypeWeights,
    /// Ratio applied to an object tap's weight when it is a double-tap.
    pub double_tap_ratio: f64,

    pub action_shape_weights: BTreeMap<ActionShape, f64>,
    pub blob_color_weights: BlobColorWeights,
    pub large_blob_threshold: f64,
    pub large_blob_weight_mult: f64,
    /// Weights for other object types (circles, external detections).
    pub object_type_weights: BTreeMap<String, f64>,
    /// Floor weight so unrecognized object types stay reachable.
    pub unknown_object_weight: f64,
    /// Object-type labels that probably lead out of the current room.
    pub likely_exit_types: Vec<String>,

    /// "Visited again soon" threshold, in rooms.
    pub recent_room_threshold: usize,
    /// "Been here too long" threshold, in actions.
    pub same_room_threshold: u64,
    pub recent_room_exit_weight: f64,
    pub same_room_exit_weight: f64,
    pub no_money_exit_weight: f64,
    pub default_exit_weight: f64,

    pub object_tap_max_sel_count: u64,
    pub object_tap_sel_denom: f64,
    pub other_action_max_sel_count: u64,
    pub other_action_sel_denom: f64,
    pub depress_exponent: f64,

    /// Tap jitter as a fraction of the target object's size.
    pub tap_jitter_frac: f64,
    pub fixed_taps: Vec<FixedTap>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            repeat_action_depress: true,
            recent_room_memory: true,
            color_action_detect: true,
            room_history_capacity: 100,
            stagnation_limit: 12,
            reward_log_capacity: 64,
            base_weights: BaseActionWeights::default(),
            tap_type_weights: TapTypeWeights::default(),
            double_tap_ratio: 0.3,
            action_shape_weights: default_action_shape_weights(),
            blob_color_weights: BlobColorWeights::default(),
            large_blob_threshold: 200.0,
            large_blob_weight_mult: 2.0,
            object_type_weights: default_object_type_weights(),
            unknown_object_weight: 25.0,
            likely_exit_types: vec![
                "door".to_owned(),
                "exit".to_owned(),
                "stairs".to_owned(),
                "arrow".to_owned(),
            ],
            recent_room_threshold: 6,
            same_room_threshold: 300,
            recent_room_exit_weight: 2500.0,
            same_room_exit_weight: 2500.0,
            no_money_exit_weight: 100.0,
            default_exit_weight: 500.0,
            object_tap_max_sel_count: 10,
            object_tap_sel_denom: 15.0,
            other_action_max_sel_count: 2,
            other_action_sel_denom: 8.0,
            depress_exponent: 1.0,
            tap_jitter_frac: 0.15,
            fixed_taps: vec![
                FixedTap {
                    fx: 0.06,
                    fy: 0.06,
                    kind: FixedTapKind::Menu,
                },
                FixedTap {
                    fx: 0.5,
                    fy: 0.5,
                    kind: FixedTapKind::HotRegion,
                },
                FixedTap {
                    fx: 0.5,
                    fy: 0.85,
                    kind: FixedTapKind::HotRegion,
                },
            ],
        }
    }
}

fn default_action_shape_weights() -> BTreeMap<ActionShape, f64> {
    BTreeMap::from([
        (ActionShape::MenuExit, 300.0),
        (ActionShape::ConfirmOk, 2000.0),
        (ActionShape::MoneyChoice, 1500.0),
        (ActionShape::TalkChoice, 1200.0),
        (ActionShape::MaybeTalkChoice, 600.0),
        (ActionShape::Collectable, 1000.0),
        (ActionShape::AreaEntry, 700.0),
        (ActionShape::RoomExit, 500.0),
        (ActionShape::ImportantMarker, 900.0),
        (ActionShape::Unknown, 50.0),
    ])
}

fn default_object_type_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("circle".to_owned(), 200.0),
        ("blob".to_owned(), 150.0),
        ("person".to_owned(), 500.0),
    ])
}

impl EngineConfig {
    #[must_use]
    pub fn action_shape_weight(&self, shape: ActionShape) -> f64 {
        self.action_shape_weights
            .get(&shape)
            .or_else(|| self.action_shape_weights.get(&ActionShape::Unknown))
            .copied()
            .unwrap_or(self.unknown_object_weight)
    }

    #[must_use]
    pub fn object_type_weight(&self, object_type: &str) -> f64 {
        self.object_type_weights
            .get(object_type)
            .copied()
            .unwrap_or(self.unknown_object_weight)
    }

    #[must_use]
    pub fn is_likely_exit_type(&self, object_type: &str) -> bool {
        self.likely_exit_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(object_type))
    }

    #[must_use]
    pub fn blob_weight(&self, color: BlobColor, size: f64) -> f64 {
        let size_mult = if size > self.large_blob_threshold {
            self.large_blob_weight_mult
        } else {
            1.0
        };
        self.blob_color_weights.get(color) * size_mult
    }
}
