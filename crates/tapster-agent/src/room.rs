use std::collections::HashMap;

use tapster_core::{Action, BoundedHistory, ObservedObject, StateSnapshot, TapKind};

use crate::config::EngineConfig;

/// Money/star readings logged while a room is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardComponents {
    pub money: i64,
    pub stars: i64,
}

/// One tracked visit to a screen context, identified by its color
/// signature.
///
/// A room accumulates per-representation selection counts (feeding the
/// anti-repetition multiplier), watches the screen hash for stagnation,
/// and remembers how long ago a room with the same signature was last
/// active. Returning to a signature creates a fresh `Room`; the old one
/// only survives in the tracker history for the visit-statistics scan.
#[derive(Debug, Clone)]
pub struct Room {
    color_sig: String,
    time_since_last_visit: u64,
    rooms_since_last_visit: usize,

    action_count: u64,
    selection_counts: HashMap<String, u64>,

    cur_screen_hash: Option<u64>,
    stagnation_run: u32,
    needs_reset: bool,

    reward_log: BoundedHistory<RewardComponents>,
    first_money: Option<i64>,
    has_gained_money: bool,
}

impl Room {
    pub(crate) fn new(
        color_sig: String,
        time_since_last_visit: u64,
        rooms_since_last_visit: usize,
        reward_log_capacity: usize,
    ) -> Self {
        Self {
            color_sig,
            time_since_last_visit,
            rooms_since_last_visit,
            action_count: 0,
            selection_counts: HashMap::new(),
            cur_screen_hash: None,
            stagnation_run: 0,
            needs_reset: false,
            reward_log: BoundedHistory::new(reward_log_capacity),
            first_money: None,
            has_gained_money: false,
        }
    }

    #[must_use]
    pub fn color_sig(&self) -> &str {
        &self.color_sig
    }

    #[must_use]
    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    #[must_use]
    pub fn rooms_since_last_visit(&self) -> usize {
        self.rooms_since_last_visit
    }

    #[must_use]
    pub fn time_since_last_visit(&self) -> u64 {
        self.time_since_last_visit
    }

    #[must_use]
    pub fn has_gained_money(&self) -> bool {
        self.has_gained_money
    }

    #[must_use]
    pub fn needs_reset(&self) -> bool {
        self.needs_reset
    }

    /// Rolling log of the money/star readings seen while this room was
    /// active, oldest first.
    pub fn reward_log(&self) -> impl Iterator<Item = &RewardComponents> {
        self.reward_log.iter()
    }

    #[must_use]
    pub fn selection_count(&self, representation: &str) -> u64 {
        self.selection_counts
            .get(representation)
            .copied()
            .unwrap_or(0)
    }

    /// Folds one state snapshot into the room: stagnation watch plus the
    /// reward log.
    pub(crate) fn ingest_state(&mut self, state: &StateSnapshot, stagnation_limit: u32) {
        self.ingest_screen_hash(state.screen_hash, stagnation_limit);

        self.reward_log.push(RewardComponents {
            money: state.money,
            stars: state.stars,
        });
        let first_money = *self.first_money.get_or_insert(state.money);
        if !self.has_gained_money && state.money > first_money {
            self.has_gained_money = true;
        }
    }

    fn ingest_screen_hash(&mut self, hash: u64, limit: u32) {
        if self.cur_screen_hash == Some(hash) {
            self.stagnation_run += 1;
            if self.stagnation_run >= limit {
                // Stuck on the same screen too long; force a reset and
                // re-arm the counter.
                self.needs_reset = true;
                self.stagnation_run = 0;
            }
        } else {
            self.cur_screen_hash = Some(hash);
            self.stagnation_run = 0;
        }
    }

    /// Consumes the pending reset request, if any.
    pub(crate) fn take_needs_reset(&mut self) -> bool {
        std::mem::take(&mut self.needs_reset)
    }

    pub(crate) fn record_selection(&mut self, representation: String) {
        *self.selection_counts.entry(representation).or_insert(0) += 1;
        self.action_count += 1;
    }

    /// Heuristic weight of one candidate action in this room.
    #[must_use]
    pub fn action_weight(&self, action: &Action, config: &EngineConfig) -> f64 {
        let depression = if config.repeat_action_depress {
            self.depression_mult(action, config)
        } else {
            1.0
        };

        let base = match action {
            Action::Pass | Action::SwipeLeft | Action::SwipeRight | Action::Reset => {
                config.base_weights.get(action.kind())
            }
            Action::Tap(target) | Action::DoubleTap(target) => match &target.kind {
                TapKind::Menu => {
                    config.base_weights.get(action.kind()) * config.tap_type_weights.menu
                }
                TapKind::HotRegion => {
                    config.base_weights.get(action.kind()) * config.tap_type_weights.hot_region
                }
                TapKind::Object(obj) => {
                    let ratio = if action.is_double_tap() {
                        config.double_tap_ratio
                    } else {
                        1.0
                    };
                    self.object_tap_weight(obj, config) * ratio
                }
            },
        };

        (base * depression).max(0.0)
    }

    /// The more a representation was selected here, the less likely it is
    /// picked again; the ratio saturates so the weight approaches but
    /// never reaches zero.
    fn depression_mult(&self, action: &Action, config: &EngineConfig) -> f64 {
        let sel_count = self.selection_count(&action.representation());
        let sel_p = if action.is_object_tap() {
            let capped = sel_count.min(config.object_tap_max_sel_count);
            capped as f64 / config.object_tap_sel_denom
        } else {
            let capped = sel_count.min(config.other_action_max_sel_count);
            capped as f64 / config.other_action_sel_denom
        };
        (1.0 - sel_p.powf(config.depress_exponent)).max(0.0)
    }

    fn object_tap_weight(&self, obj: &ObservedObject, config: &EngineConfig) -> f64 {
        match obj {
            ObservedObject::Shape(shape) if config.color_action_detect => {
                if shape.category == tapster_core::ActionShape::RoomExit {
                    self.exit_weight(true, config)
                } else {
                    config.action_shape_weight(shape.category)
                }
            }
            ObservedObject::Blob(blob) if config.color_action_detect => {
                config.blob_weight(blob.dom_color, blob.size)
            }
            other if config.is_likely_exit_type(other.object_type()) => {
                self.exit_weight(false, config)
            }
            other => config.object_type_weight(other.object_type()),
        }
    }

    /// Weight of leaving this room: emphasized when we keep coming back
    /// here, have lingered too long, or never made money here.
    fn exit_weight(&self, certain: bool, config: &EngineConfig) -> f64 {
        if !config.recent_room_memory {
            return config.default_exit_weight;
        }
        let mult = if certain { 1.0 } else { 0.5 };
        if self.rooms_since_last_visit < config.recent_room_threshold {
            mult * config.recent_room_exit_weight
        } else if self.action_count >= config.same_room_threshold {
            mult * config.same_room_exit_weight
        } else if !self.has_gained_money {
            mult * config.no_money_exit_weight
        } else {
            config.default_exit_weight
        }
    }
}
