//! Step scoring for the learning loop.
//!
//! The calculator keeps bounded memories of recent money/star readings and
//! recent actions, and scores each `(state, action)` step: long-term value
//! increases, a bonus for discovering a new screen, swipe pacing, and
//! anti-thrash penalties for hammering the same object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tapster_core::{
    Action, ActionKind, ActionShape, BoundedHistory, ObservedObject, Point, StateSnapshot,
    TapKind, TapTarget,
};
use tracing::debug;

/// Reward tuning. All values are per-step contributions unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub money_mult: f64,
    pub stars_mult: f64,
    /// Window sizes for the bounded memories.
    pub money_memory: usize,
    pub stars_memory: usize,
    pub action_memory: usize,

    /// One-shot bonus when the color signature changes between steps.
    pub new_room_bonus: f64,

    /// A swipe is rewarded while fewer than this many identical swipes sit
    /// in the recent-action memory, and penalized afterwards.
    pub recent_swipe_limit: usize,
    pub swipe_reward: f64,
    pub swipe_penalty: f64,

    /// Distance under which a repeated same-kind object tap counts as
    /// thrash.
    pub tap_distance_threshold: f64,
    pub tap_thrash_penalty: f64,
    pub shape_tap_rewards: BTreeMap<ActionShape, f64>,
    pub object_type_rewards: BTreeMap<String, f64>,
    pub unknown_tap_penalty: f64,

    pub pass_penalty: f64,
    pub reset_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            money_mult: 1.0,
            stars_mult: 1.0,
            money_memory: 10,
            stars_memory: 10,
            action_memory: 20,
            new_room_bonus: 500.0,
            recent_swipe_limit: 3,
            swipe_reward: 150.0,
            swipe_penalty: -50.0,
            tap_distance_threshold: 60.0,
            tap_thrash_penalty: -25.0,
            shape_tap_rewards: default_shape_tap_rewards(),
            object_type_rewards: BTreeMap::from([
                ("blob".to_owned(), 50.0),
                ("circle".to_owned(), 50.0),
            ]),
            unknown_tap_penalty: -10.0,
            pass_penalty: -5.0,
            reset_penalty: -300.0,
        }
    }
}

fn default_shape_tap_rewards() -> BTreeMap<ActionShape, f64> {
    BTreeMap::from([
        (ActionShape::MenuExit, 20.0),
        (ActionShape::ConfirmOk, 200.0),
        (ActionShape::MoneyChoice, 300.0),
        (ActionShape::TalkChoice, 150.0),
        (ActionShape::MaybeTalkChoice, 50.0),
        (ActionShape::Collectable, 250.0),
        (ActionShape::AreaEntry, 100.0),
        (ActionShape::RoomExit, 100.0),
        (ActionShape::ImportantMarker, 150.0),
        (ActionShape::Unknown, -10.0),
    ])
}

#[derive(Debug, Clone)]
struct RecentAction {
    kind: ActionKind,
    point: Option<Point>,
    object_type: Option<String>,
}

impl RecentAction {
    fn from_action(action: &Action) -> Self {
        let target = action.tap_target();
        Self {
            kind: action.kind(),
            point: target.map(|t| t.point),
            object_type: target.and_then(|t| match &t.kind {
                TapKind::Object(obj) => Some(obj.object_type().to_owned()),
                _ => None,
            }),
        }
    }
}

/// Scores state transitions; owns every bounded memory it needs.
///
/// Not safe for concurrent invocation: drive it from the single sequential
/// step loop, and call [`RewardCalculator::mark_reset`] whenever the
/// environment is reset.
#[derive(Debug)]
pub struct RewardCalculator {
    config: RewardConfig,
    money_memory: BoundedHistory<i64>,
    stars_memory: BoundedHistory<i64>,
    recent_actions: BoundedHistory<RecentAction>,
    last_color_sig: Option<String>,
}

impl RewardCalculator {
    #[must_use]
    pub fn new(config: RewardConfig) -> Self {
        let money_memory = BoundedHistory::new(config.money_memory);
        let stars_memory = BoundedHistory::new(config.stars_memory);
        let recent_actions = BoundedHistory::new(config.action_memory);
        Self {
            config,
            money_memory,
            stars_memory,
            recent_actions,
            last_color_sig: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Clears every memory; call after the environment resets.
    pub fn mark_reset(&mut self) {
        self.money_memory.clear();
        self.stars_memory.clear();
        self.recent_actions.clear();
        self.last_color_sig = None;
    }

    /// Scores one completed step.
    pub fn score(&mut self, step_num: u64, state: &StateSnapshot, action: &Action) -> f64 {
        let money_gain = long_term_gain(&self.money_memory, state.money);
        let stars_gain = long_term_gain(&self.stars_memory, state.stars);
        let mut reward = money_gain as f64 * self.config.money_mult
            + stars_gain as f64 * self.config.stars_mult;
        self.money_memory.push(state.money);
        self.stars_memory.push(state.stars);

        if let Some(last_sig) = &self.last_color_sig {
            if *last_sig != state.color_sig {
                reward += self.config.new_room_bonus;
            }
        }
        self.last_color_sig = Some(state.color_sig.clone());

        let action_part = self.action_component(action);
        reward += action_part;
        self.recent_actions.push(RecentAction::from_action(action));

        debug!(step_num, reward, money_gain, stars_gain, action_part, "scored step");
        reward
    }

    fn action_component(&self, action: &Action) -> f64 {
        match action {
            Action::Pass => self.config.pass_penalty,
            Action::Reset => self.config.reset_penalty,
            Action::SwipeLeft | Action::SwipeRight => {
                let identical = self
                    .recent_actions
                    .iter()
                    .filter(|recent| recent.kind == action.kind())
                    .count();
                if identical < self.config.recent_swipe_limit {
                    self.config.swipe_reward
                } else {
                    self.config.swipe_penalty
                }
            }
            Action::Tap(target) | Action::DoubleTap(target) => self.tap_component(target),
        }
    }

    fn tap_component(&self, target: &TapTarget) -> f64 {
        let TapKind::Object(obj) = &target.kind else {
            // Fixed menu/hot-region taps are neutral; their value shows up
            // through the state they produce.
            return 0.0;
        };

        if self.has_recent_nearby_tap(target.point, obj.object_type()) {
            return self.config.tap_thrash_penalty;
        }

        match obj {
            ObservedObject::Shape(shape) => self
                .config
                .shape_tap_rewards
                .get(&shape.category)
                .copied()
                .unwrap_or(self.config.unknown_tap_penalty),
            other => self
                .config
                .object_type_rewards
                .get(other.object_type())
                .copied()
                .unwrap_or(self.config.unknown_tap_penalty),
        }
    }

    fn has_recent_nearby_tap(&self, point: Point, object_type: &str) -> bool {
        let threshold_sq =
            (self.config.tap_distance_threshold * self.config.tap_distance_threshold) as i64;
        self.recent_actions.iter().any(|recent| {
            matches!(recent.kind, ActionKind::Tap | ActionKind::DoubleTap)
                && recent.object_type.as_deref() == Some(object_type)
                && recent
                    .point
                    .is_some_and(|p| p.distance_squared(point) <= threshold_sq)
        })
    }
}

/// Long-term increase of a noisy counter: rewarded only when the new value
/// is absent from the recent window *and* above the window maximum, which
/// keeps re-reads and momentary mis-reads from being double-counted.
fn long_term_gain(memory: &BoundedHistory<i64>, value: i64) -> i64 {
    if memory.iter().any(|&seen| seen == value) {
        return 0;
    }
    match memory.iter().max() {
        Some(&max) if value > max => value - max,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapster_core::{CircleObservation, ShapeObservation};

    fn state(money: i64, stars: i64, sig: &str) -> StateSnapshot {
        StateSnapshot {
            image_shape: (1280, 720),
            money,
            stars,
            color_sig: sig.to_owned(),
            screen_hash: 0,
            objects: Vec::new(),
        }
    }

    fn object_tap(x: i32, y: i32) -> Action {
        Action::Tap(TapTarget {
            point: Point::new(x, y),
            kind: TapKind::Object(ObservedObject::Circle(CircleObservation {
                center: Point::new(x, y),
                radius: 20,
            })),
        })
    }

    fn shape_tap(category: ActionShape, x: i32, y: i32) -> Action {
        Action::Tap(TapTarget {
            point: Point::new(x, y),
            kind: TapKind::Object(ObservedObject::Shape(ShapeObservation {
                category,
                color_label: "Gold".to_owned(),
                centroid: Point::new(x, y),
                bounds: tapster_core::Rect::new(x - 20, y - 20, 40, 40),
                contour_area: 1500.0,
                vertex_count: 4,
                bounds_area: 1600.0,
                area_ratio: 1.07,
            })),
        })
    }

    fn calculator() -> RewardCalculator {
        RewardCalculator::new(RewardConfig::default())
    }

    #[test]
    fn test_money_already_in_window_scores_zero() {
        let mut calc = calculator();
        for money in [100, 100, 150] {
            calc.score(0, &state(money, 0, "a"), &Action::Pass);
        }

        // 100 is still in the window: no money reward. Pass penalty only.
        let reward = calc.score(3, &state(100, 0, "a"), &Action::Pass);
        assert_eq!(reward, calc.config().pass_penalty);
    }

    #[test]
    fn test_money_increase_rewards_delta_over_window_max() {
        let mut calc = calculator();
        for money in [100, 100, 150] {
            calc.score(0, &state(money, 0, "a"), &Action::Pass);
        }

        let reward = calc.score(3, &state(200, 0, "a"), &Action::Pass);
        assert_eq!(reward, 50.0 + calc.config().pass_penalty);
    }

    #[test]
    fn test_dip_below_window_max_is_not_rewarded() {
        let mut calc = calculator();
        calc.score(0, &state(300, 0, "a"), &Action::Pass);
        // A mis-read of 120 is below the max; no reward either way.
        let reward = calc.score(1, &state(120, 0, "a"), &Action::Pass);
        assert_eq!(reward, calc.config().pass_penalty);
    }

    #[test]
    fn test_first_reading_is_baseline_not_reward() {
        let mut calc = calculator();
        let reward = calc.score(0, &state(10_000, 0, "a"), &Action::Pass);
        assert_eq!(reward, calc.config().pass_penalty);
    }

    #[test]
    fn test_signature_change_bonus_once() {
        let mut calc = calculator();
        calc.score(0, &state(0, 0, "a"), &Action::Pass);
        let changed = calc.score(1, &state(0, 0, "b"), &Action::Pass);
        assert_eq!(changed, calc.config().new_room_bonus + calc.config().pass_penalty);
        let unchanged = calc.score(2, &state(0, 0, "b"), &Action::Pass);
        assert_eq!(unchanged, calc.config().pass_penalty);
    }

    #[test]
    fn test_swipe_rewarded_until_limit_then_penalized() {
        let mut calc = calculator();
        for step in 0..3 {
            let reward = calc.score(step, &state(0, 0, "a"), &Action::SwipeLeft);
            assert_eq!(reward, calc.config().swipe_reward, "step {step}");
        }
        let reward = calc.score(3, &state(0, 0, "a"), &Action::SwipeLeft);
        assert_eq!(reward, calc.config().swipe_penalty);

        // The opposite direction has its own budget.
        let reward = calc.score(4, &state(0, 0, "a"), &Action::SwipeRight);
        assert_eq!(reward, calc.config().swipe_reward);
    }

    #[test]
    fn test_nearby_repeat_tap_is_thrash() {
        let mut calc = calculator();
        let first = calc.score(0, &state(0, 0, "a"), &object_tap(400, 400));
        assert_eq!(first, 50.0);

        // Ten pixels away, same object kind: thrash.
        let second = calc.score(1, &state(0, 0, "a"), &object_tap(410, 400));
        assert_eq!(second, calc.config().tap_thrash_penalty);

        // Far away is a fresh tap again.
        let third = calc.score(2, &state(0, 0, "a"), &object_tap(900, 200));
        assert_eq!(third, 50.0);
    }

    #[test]
    fn test_shape_taps_use_category_table() {
        let mut calc = calculator();
        let reward = calc.score(0, &state(0, 0, "a"), &shape_tap(ActionShape::ConfirmOk, 100, 100));
        assert_eq!(reward, 200.0);

        let reward = calc.score(1, &state(0, 0, "a"), &shape_tap(ActionShape::Unknown, 600, 600));
        assert_eq!(reward, -10.0);
    }

    #[test]
    fn test_reset_and_pass_penalties() {
        let mut calc = calculator();
        assert_eq!(
            calc.score(0, &state(0, 0, "a"), &Action::Reset),
            calc.config().reset_penalty
        );
        assert_eq!(
            calc.score(1, &state(0, 0, "a"), &Action::Pass),
            calc.config().pass_penalty
        );
    }

    #[test]
    fn test_mark_reset_clears_memories() {
        let mut calc = calculator();
        calc.score(0, &state(100, 0, "a"), &Action::SwipeLeft);
        calc.score(1, &state(200, 0, "a"), &Action::SwipeLeft);
        calc.mark_reset();

        // Signature bonus does not fire on the first post-reset step, and
        // the money baseline restarts.
        let reward = calc.score(2, &state(500, 0, "b"), &Action::Pass);
        assert_eq!(reward, calc.config().pass_penalty);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = RewardConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RewardConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_money_window_is_bounded() {
        let config = RewardConfig {
            money_memory: 3,
            ..RewardConfig::default()
        };
        let mut calc = RewardCalculator::new(config);
        for (step, money) in [500, 10, 20, 30].into_iter().enumerate() {
            calc.score(step as u64, &state(money, 0, "a"), &Action::Pass);
        }
        // 500 has been evicted from the 3-entry window; the max is now 30.
        let reward = calc.score(4, &state(40, 0, "a"), &Action::Pass);
        assert_eq!(reward, 10.0 + calc.config().pass_penalty);
    }
}
