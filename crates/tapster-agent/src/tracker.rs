use tapster_core::{BoundedHistory, StateSnapshot};
use tracing::debug;

use crate::{config::EngineConfig, room::Room};

/// Bounded history of visited rooms, newest last.
///
/// Rooms are keyed by color signature: whenever the incoming signature
/// differs from the active room's, a new room is created and appended
/// (evicting the oldest entry once the history is full). Returning to a
/// previously seen signature still creates a fresh room, but the
/// constructor scan gives it `rooms_since_last_visit` / `time_since_last_visit`
/// relative to the most recent room with the same signature.
#[derive(Debug)]
pub struct RoomTracker {
    config: EngineConfig,
    rooms: BoundedHistory<Room>,
    state_idx: u64,
}

impl RoomTracker {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let rooms = BoundedHistory::new(config.room_history_capacity);
        Self {
            config,
            rooms,
            state_idx: 0,
        }
    }

    /// Folds a state snapshot into the active room, creating a new room on
    /// signature change. Returns the active room.
    pub fn ingest(&mut self, state: &StateSnapshot) -> &mut Room {
        let changed = self.state_idx == 0
            || self
                .rooms
                .newest()
                .is_none_or(|room| room.color_sig() != state.color_sig);
        if changed {
            let (time_since, rooms_since) = self.visit_stats(&state.color_sig);
            debug!(
                sig = %state.color_sig,
                rooms_since,
                time_since,
                "entered room"
            );
            self.rooms.push(Room::new(
                state.color_sig.clone(),
                time_since,
                rooms_since,
                self.config.reward_log_capacity,
            ));
        }
        self.state_idx += 1;

        let stagnation_limit = self.config.stagnation_limit;
        let room = self
            .rooms
            .newest_mut()
            .expect("room history is never empty after an ingest");
        room.ingest_state(state, stagnation_limit);
        room
    }

    /// Scans the history newest-to-oldest for the last room with this
    /// signature, summing the action counts of the rooms in between.
    /// `(0, 0)` when the signature has never been seen.
    fn visit_stats(&self, color_sig: &str) -> (u64, usize) {
        let mut time_since = 0;
        let mut rooms_since = 0;
        for room in self.rooms.iter_newest_first() {
            if room.color_sig() == color_sig {
                return (time_since, rooms_since);
            }
            rooms_since += 1;
            time_since += room.action_count();
        }
        (0, 0)
    }

    #[must_use]
    pub fn active_room(&self) -> Option<&Room> {
        self.rooms.newest()
    }

    pub fn active_room_mut(&mut self) -> Option<&mut Room> {
        self.rooms.newest_mut()
    }

    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(sig: &str, hash: u64) -> StateSnapshot {
        StateSnapshot {
            image_shape: (1280, 720),
            money: 0,
            stars: 0,
            color_sig: sig.to_owned(),
            screen_hash: hash,
            objects: Vec::new(),
        }
    }

    #[test]
    fn test_same_signature_reuses_room() {
        let mut tracker = RoomTracker::new(EngineConfig::default());
        tracker.ingest(&state("a", 1));
        tracker.ingest(&state("a", 2));
        assert_eq!(tracker.room_count(), 1);
    }

    #[test]
    fn test_revisit_creates_room_with_visit_stats() {
        let mut tracker = RoomTracker::new(EngineConfig::default());

        // A, A, B, A: the A -> A transition creates no room, so exactly 3
        // rooms exist at the end.
        tracker.ingest(&state("a", 1));
        tracker.ingest(&state("a", 2));

        let room_b = tracker.ingest(&state("b", 3));
        room_b.record_selection("pass".to_owned());
        room_b.record_selection("pass".to_owned());

        let room_a = tracker.ingest(&state("a", 4));
        assert_eq!(room_a.rooms_since_last_visit(), 1);
        assert_eq!(room_a.time_since_last_visit(), 2);
        assert_eq!(tracker.room_count(), 3);
    }

    #[test]
    fn test_unseen_signature_has_zero_visit_stats() {
        let mut tracker = RoomTracker::new(EngineConfig::default());
        tracker.ingest(&state("a", 1));
        tracker.ingest(&state("b", 2));
        let room_c = tracker.ingest(&state("c", 3));
        assert_eq!(room_c.rooms_since_last_visit(), 0);
        assert_eq!(room_c.time_since_last_visit(), 0);
    }

    #[test]
    fn test_history_capacity_is_bounded() {
        let config = EngineConfig {
            room_history_capacity: 3,
            ..EngineConfig::default()
        };
        let mut tracker = RoomTracker::new(config);
        for i in 0..10 {
            tracker.ingest(&state(&format!("room{i}"), i));
        }
        assert_eq!(tracker.room_count(), 3);
        assert_eq!(tracker.active_room().unwrap().color_sig(), "room9");
    }

    #[test]
    fn test_evicted_rooms_no_longer_count_as_visited() {
        let config = EngineConfig {
            room_history_capacity: 2,
            ..EngineConfig::default()
        };
        let mut tracker = RoomTracker::new(config);
        tracker.ingest(&state("a", 1));
        tracker.ingest(&state("b", 2));
        tracker.ingest(&state("c", 3));
        // "a" has been evicted; returning to it looks like a first visit.
        let room_a = tracker.ingest(&state("a", 4));
        assert_eq!(room_a.rooms_since_last_visit(), 0);
        assert_eq!(room_a.time_since_last_visit(), 0);
    }
}
