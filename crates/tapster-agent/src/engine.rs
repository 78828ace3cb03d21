use rand::{Rng, SeedableRng as _, distr::weighted::WeightedIndex};
use rand_pcg::Pcg32;
use serde::Serialize;
use tapster_core::{Action, Point, StateSnapshot, TapKind, TapTarget};
use tracing::{debug, warn};

use crate::{
    config::{EngineConfig, FixedTapKind},
    room::Room,
};

/// A chosen action together with the probability it was sampled at.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub action: Action,
    pub probability: f64,
}

/// Status record published to dashboards: the candidate list and the
/// probability assigned to each entry. Fire-and-forget; no acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub actions: Vec<Action>,
    pub action_probs: Vec<f64>,
}

/// Weighted-random action selection over the current candidates.
///
/// Two states: NORMAL, and a stagnation-reset state entered when the
/// active room reports `needs_reset` - there the engine unconditionally
/// returns [`Action::Reset`] and drops back to NORMAL.
#[derive(Debug)]
pub struct DecisionEngine {
    config: EngineConfig,
    rng: Pcg32,
}

impl DecisionEngine {
    /// Creates an engine seeded from the OS random source.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            rng: Pcg32::from_os_rng(),
        }
    }

    /// Creates an engine with a deterministic RNG, for reproducible runs
    /// and tests.
    #[must_use]
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the candidate list for one state: pass, both swipes, reset,
    /// the configured fixed taps, and a tap plus double-tap per observed
    /// object. Object tap points get a small random jitter so repeated
    /// taps on the same object are not pixel-identical.
    pub fn build_candidates(&mut self, state: &StateSnapshot) -> Vec<Action> {
        let mut candidates = vec![
            Action::Pass,
            Action::SwipeLeft,
            Action::SwipeRight,
            Action::Reset,
        ];

        let (width, height) = state.image_shape;
        for fixed in &self.config.fixed_taps {
            let point = Point::new(
                (fixed.fx * f64::from(width)).round() as i32,
                (fixed.fy * f64::from(height)).round() as i32,
            );
            let kind = match fixed.kind {
                FixedTapKind::Menu => TapKind::Menu,
                FixedTapKind::HotRegion => TapKind::HotRegion,
            };
            candidates.push(Action::Tap(TapTarget { point, kind }));
        }

        for obj in &state.objects {
            let center = obj.center();
            let bounds = obj.bounds();
            let jitter = self.config.tap_jitter_frac * f64::from(bounds.width.max(bounds.height));

            let tap_point = self.jitter_point(center, jitter, state.image_shape);
            candidates.push(Action::Tap(TapTarget {
                point: tap_point,
                kind: TapKind::Object(obj.clone()),
            }));

            let double_tap_point = self.jitter_point(center, jitter, state.image_shape);
            candidates.push(Action::DoubleTap(TapTarget {
                point: double_tap_point,
                kind: TapKind::Object(obj.clone()),
            }));
        }

        candidates
    }

    fn jitter_point(&mut self, center: Point, jitter: f64, image_shape: (u32, u32)) -> Point {
        let (width, height) = image_shape;
        let mut coord = |value: i32, max: u32| {
            let offset = if jitter > 0.0 {
                self.rng.random_range(-jitter..=jitter).round() as i32
            } else {
                0
            };
            (value + offset).clamp(0, max.saturating_sub(1) as i32)
        };
        Point::new(coord(center.x, width), coord(center.y, height))
    }

    /// Probability assigned to each candidate in the given room.
    ///
    /// Weights are normalized to sum to 1; if every weight is zero (for
    /// example a zeroed-out weight table) the engine falls back to a
    /// uniform distribution rather than failing the step.
    #[must_use]
    pub fn action_probabilities(&self, candidates: &[Action], room: &Room) -> Vec<f64> {
        let weights: Vec<f64> = candidates
            .iter()
            .map(|action| room.action_weight(action, &self.config))
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            warn!(
                candidates = candidates.len(),
                "all candidate weights are zero; using a uniform distribution"
            );
            let uniform = 1.0 / candidates.len().max(1) as f64;
            return vec![uniform; candidates.len()];
        }
        weights.into_iter().map(|w| w / total).collect()
    }

    /// Selects one candidate by weighted-random choice and records the
    /// selection in the room's bookkeeping.
    ///
    /// If the room has a pending stagnation reset, that request is
    /// consumed and [`Action::Reset`] is returned with probability 1.
    pub fn select_from_actions(&mut self, candidates: &[Action], room: &mut Room) -> Selection {
        if room.take_needs_reset() {
            debug!(sig = %room.color_sig(), "stagnation reset");
            return Selection {
                action: Action::Reset,
                probability: 1.0,
            };
        }

        if candidates.is_empty() {
            return Selection {
                action: Action::Pass,
                probability: 1.0,
            };
        }

        let probs = self.action_probabilities(candidates, room);
        let index = match WeightedIndex::new(probs.iter().copied()) {
            Ok(dist) => self.rng.sample(dist),
            Err(_) => self.rng.random_range(0..candidates.len()),
        };

        let action = candidates[index].clone();
        room.record_selection(action.representation());

        Selection {
            action,
            probability: probs[index],
        }
    }

    /// One-way status record for external dashboards.
    #[must_use]
    pub fn status(&self, candidates: &[Action], room: &Room) -> EngineStatus {
        EngineStatus {
            actions: candidates.to_vec(),
            action_probs: self.action_probabilities(candidates, room),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::RoomTracker;
    use tapster_core::{CircleObservation, ObservedObject};

    fn state_with_objects(sig: &str, hash: u64) -> StateSnapshot {
        StateSnapshot {
            image_shape: (1280, 720),
            money: 0,
            stars: 0,
            color_sig: sig.to_owned(),
            screen_hash: hash,
            objects: vec![
                ObservedObject::Circle(CircleObservation {
                    center: Point::new(300, 300),
                    radius: 25,
                }),
                ObservedObject::Circle(CircleObservation {
                    center: Point::new(800, 500),
                    radius: 30,
                }),
            ],
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let mut engine = DecisionEngine::with_seed(EngineConfig::default(), 7);
        let mut tracker = RoomTracker::new(EngineConfig::default());
        let state = state_with_objects("a", 1);
        let room = tracker.ingest(&state);
        let candidates = engine.build_candidates(&state);

        let probs = engine.action_probabilities(&candidates, room);
        assert_eq!(probs.len(), candidates.len());
        assert!(probs.iter().all(|&p| p >= 0.0));
        let total: f64 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-6, "total = {total}");
    }

    #[test]
    fn test_candidate_list_shape() {
        let mut engine = DecisionEngine::with_seed(EngineConfig::default(), 7);
        let state = state_with_objects("a", 1);
        let candidates = engine.build_candidates(&state);

        // pass + 2 swipes + reset + 3 fixed taps + (tap + double-tap) x 2.
        assert_eq!(candidates.len(), 4 + 3 + 4);
        assert!(candidates.contains(&Action::Pass));
        assert!(candidates.contains(&Action::Reset));
        let object_taps = candidates.iter().filter(|a| a.is_object_tap()).count();
        assert_eq!(object_taps, 4);
    }

    #[test]
    fn test_jittered_points_stay_in_frame() {
        let mut engine = DecisionEngine::with_seed(EngineConfig::default(), 11);
        let mut state = state_with_objects("a", 1);
        // An object at the very edge of a small frame.
        state.image_shape = (320, 200);
        state.objects = vec![ObservedObject::Circle(CircleObservation {
            center: Point::new(319, 199),
            radius: 30,
        })];

        for _ in 0..50 {
            for action in engine.build_candidates(&state) {
                if let Some(target) = action.tap_target() {
                    assert!((0..320).contains(&target.point.x));
                    assert!((0..200).contains(&target.point.y));
                }
            }
        }
    }

    #[test]
    fn test_repeated_selection_lowers_probability() {
        let config = EngineConfig::default();
        let mut engine = DecisionEngine::with_seed(config.clone(), 3);
        let mut tracker = RoomTracker::new(config);
        let state = state_with_objects("a", 1);
        let room = tracker.ingest(&state);
        let candidates = engine.build_candidates(&state);

        let rep = candidates[1].representation();
        let before = engine.action_probabilities(&candidates, room)[1];
        room.record_selection(rep.clone());
        let after_one = engine.action_probabilities(&candidates, room)[1];
        room.record_selection(rep);
        let after_two = engine.action_probabilities(&candidates, room)[1];

        assert!(after_one < before);
        assert!(after_two < after_one);
        assert!(after_two > 0.0);
    }

    #[test]
    fn test_zero_weights_fall_back_to_uniform() {
        let config = EngineConfig {
            base_weights: crate::config::BaseActionWeights {
                pass: 0.0,
                swipe_left: 0.0,
                swipe_right: 0.0,
                tap: 0.0,
                double_tap: 0.0,
                reset: 0.0,
            },
            fixed_taps: Vec::new(),
            ..EngineConfig::default()
        };
        let mut engine = DecisionEngine::with_seed(config.clone(), 5);
        let mut tracker = RoomTracker::new(config);
        let state = StateSnapshot {
            objects: Vec::new(),
            ..state_with_objects("a", 1)
        };
        let room = tracker.ingest(&state);
        let candidates = engine.build_candidates(&state);

        let probs = engine.action_probabilities(&candidates, room);
        let uniform = 1.0 / candidates.len() as f64;
        assert!(probs.iter().all(|&p| (p - uniform).abs() < 1e-12));

        // Selection still succeeds.
        let selection = engine.select_from_actions(&candidates, room);
        assert!((selection.probability - uniform).abs() < 1e-12);
    }

    #[test]
    fn test_stagnation_forces_reset_once() {
        let config = EngineConfig {
            stagnation_limit: 5,
            // Zero the by-chance reset weight so the only reset in this
            // test can come from the stagnation path.
            base_weights: crate::config::BaseActionWeights {
                reset: 0.0,
                ..crate::config::BaseActionWeights::default()
            },
            ..EngineConfig::default()
        };
        let mut engine = DecisionEngine::with_seed(config.clone(), 9);
        let mut tracker = RoomTracker::new(config);

        // Six consecutive identical screen hashes: the sixth select call
        // must return the reset action.
        let mut last_selection = None;
        for _ in 0..6 {
            let state = state_with_objects("a", 42);
            let room = tracker.ingest(&state);
            let candidates = engine.build_candidates(&state);
            last_selection = Some(engine.select_from_actions(&candidates, room));
        }
        let selection = last_selection.unwrap();
        assert_eq!(selection.action, Action::Reset);
        assert_eq!(selection.probability, 1.0);

        // The seventh call, after the reset was consumed, must not reset.
        let state = state_with_objects("a", 42);
        let room = tracker.ingest(&state);
        let candidates = engine.build_candidates(&state);
        let selection = engine.select_from_actions(&candidates, room);
        assert_ne!(selection.action, Action::Reset);
    }

    #[test]
    fn test_selection_records_bookkeeping() {
        let mut engine = DecisionEngine::with_seed(EngineConfig::default(), 21);
        let mut tracker = RoomTracker::new(EngineConfig::default());
        let state = state_with_objects("a", 1);
        let room = tracker.ingest(&state);
        let candidates = engine.build_candidates(&state);

        assert_eq!(room.action_count(), 0);
        let selection = engine.select_from_actions(&candidates, room);
        assert_eq!(room.action_count(), 1);
        assert_eq!(room.selection_count(&selection.action.representation()), 1);
    }

    #[test]
    fn test_status_record_serializes() {
        let mut engine = DecisionEngine::with_seed(EngineConfig::default(), 2);
        let mut tracker = RoomTracker::new(EngineConfig::default());
        let state = state_with_objects("a", 1);
        let room = tracker.ingest(&state);
        let candidates = engine.build_candidates(&state);

        let status = engine.status(&candidates, room);
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("action_probs"));
        assert_eq!(status.actions.len(), status.action_probs.len());
    }
}
