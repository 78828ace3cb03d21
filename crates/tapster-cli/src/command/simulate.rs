use std::{collections::BTreeMap, path::PathBuf};

use chrono::Utc;
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;
use tapster_agent::{DecisionEngine, RoomTracker};
use tapster_core::{
    Action, BlobColor, BlobObservation, CircleObservation, ExternalDetection, ObservedObject,
    Point, Rect, StateSnapshot,
};
use tapster_reward::RewardCalculator;
use tracing::info;

use crate::command::AppConfig;

#[derive(Debug, Clone, clap::Args)]
pub struct SimulateArg {
    /// Number of steps to run
    #[arg(long, default_value_t = 100)]
    steps: u64,
    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    /// Optional JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Emit a `{actions, action_probs}` status record per step
    #[arg(long)]
    emit_status: bool,
}

/// Action record mirroring what the live agent publishes for dashboards.
#[derive(Debug, Serialize)]
struct ActionRecord {
    r#type: &'static str,
    time: i64,
    label: String,
    prob: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    p: Option<[i32; 2]>,
}

impl ActionRecord {
    fn from_selection(action: &Action, prob: f64) -> Self {
        let label = match action.tap_target() {
            Some(target) => match &target.kind {
                tapster_core::TapKind::Object(obj) => obj.object_type().to_owned(),
                other => other.type_str().to_owned(),
            },
            None => action.kind().as_str().to_owned(),
        };
        Self {
            r#type: action.kind().as_str(),
            time: Utc::now().timestamp_millis(),
            label,
            prob,
            p: action.tap_target().map(|t| [t.point.x, t.point.y]),
        }
    }
}

const IMAGE_SHAPE: (u32, u32) = (1280, 720);
const ROOM_SIGS: [&str; 4] = ["12-4-4-10", "3-9-14-8", "20-18-6-7", "7-7-7-9"];
const EXTERNAL_LABELS: [&str; 5] = ["person", "clock", "tvmonitor", "laptop", "door"];

/// A tiny stand-in environment producing plausible state snapshots, in the
/// shape the device pipeline would deliver them.
struct SyntheticEnv {
    rng: Pcg32,
    money: i64,
    stars: i64,
    sig_idx: usize,
    screen_hash: u64,
}

impl SyntheticEnv {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            money: 1000,
            stars: 10,
            sig_idx: 0,
            screen_hash: 1,
        }
    }

    fn reset(&mut self) {
        self.sig_idx = 0;
        self.screen_hash = self.rng.random();
    }

    /// Advances the environment in response to an executed action.
    fn apply(&mut self, action: &Action) {
        match action {
            Action::SwipeLeft | Action::SwipeRight => {
                if self.rng.random_bool(0.6) {
                    self.sig_idx = (self.sig_idx + 1) % ROOM_SIGS.len();
                }
            }
            Action::Tap(_) | Action::DoubleTap(_) => {
                if self.rng.random_bool(0.25) {
                    self.money += i64::from(self.rng.random_range(5u32..80));
                }
                if self.rng.random_bool(0.05) {
                    self.stars += 1;
                }
                if self.rng.random_bool(0.15) {
                    self.sig_idx = (self.sig_idx + 1) % ROOM_SIGS.len();
                }
            }
            Action::Pass | Action::Reset => {}
        }
        // Most actions visibly change the screen; sometimes it freezes.
        if self.rng.random_bool(0.9) {
            self.screen_hash = self.rng.random();
        }
    }

    fn random_object(&mut self) -> ObservedObject {
        let (width, height) = IMAGE_SHAPE;
        let x = self.rng.random_range(0..width as i32 - 100);
        let y = self.rng.random_range(0..height as i32 - 100);
        match self.rng.random_range(0u32..3) {
            0 => ObservedObject::Circle(CircleObservation {
                center: Point::new(x, y),
                radius: self.rng.random_range(20..40),
            }),
            1 => {
                let colors = [
                    BlobColor::Red,
                    BlobColor::Green,
                    BlobColor::Blue,
                    BlobColor::Black,
                    BlobColor::White,
                ];
                ObservedObject::Blob(BlobObservation {
                    center: Point::new(x, y),
                    size: self.rng.random_range(50.0..400.0),
                    dom_color: colors[self.rng.random_range(0..colors.len())],
                })
            }
            _ => {
                let label = EXTERNAL_LABELS[self.rng.random_range(0..EXTERNAL_LABELS.len())];
                ObservedObject::External(ExternalDetection {
                    label: label.to_owned(),
                    confidence: self.rng.random_range(0.3..1.0),
                    rect: Rect::new(x, y, 80, 60),
                })
            }
        }
    }

    fn snapshot(&mut self) -> StateSnapshot {
        let object_count = self.rng.random_range(1..=6);
        let objects = (0..object_count).map(|_| self.random_object()).collect();
        StateSnapshot {
            image_shape: IMAGE_SHAPE,
            money: self.money,
            stars: self.stars,
            color_sig: ROOM_SIGS[self.sig_idx].to_owned(),
            screen_hash: self.screen_hash,
            objects,
        }
    }
}

pub fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let config = AppConfig::load(arg.config.as_deref())?;
    let seed = arg.seed.unwrap_or_else(rand::random);
    info!(seed, steps = arg.steps, "starting simulation");

    let mut env = SyntheticEnv::new(seed);
    let mut tracker = RoomTracker::new(config.engine.clone());
    let mut engine = DecisionEngine::with_seed(config.engine, seed.wrapping_add(1));
    let mut calculator = RewardCalculator::new(config.reward);

    let mut total_reward = 0.0;
    let mut kind_counts: BTreeMap<&'static str, u64> = BTreeMap::new();

    for step in 0..arg.steps {
        let state = env.snapshot();
        let room = tracker.ingest(&state);
        let candidates = engine.build_candidates(&state);

        if arg.emit_status {
            let status = engine.status(&candidates, room);
            println!("{}", serde_json::to_string(&status)?);
        }

        let selection = engine.select_from_actions(&candidates, room);
        let reward = calculator.score(step, &state, &selection.action);
        total_reward += reward;
        *kind_counts.entry(selection.action.kind().as_str()).or_insert(0) += 1;

        info!(
            step,
            action = %selection.action.kind(),
            prob = selection.probability,
            reward,
            room = %room.color_sig(),
            "step"
        );
        let record = ActionRecord::from_selection(&selection.action, selection.probability);
        println!("{}", serde_json::to_string(&record)?);

        if selection.action.is_reset() {
            calculator.mark_reset();
            env.reset();
        }
        env.apply(&selection.action);
    }

    info!(
        total_reward,
        rooms = tracker.room_count(),
        "simulation finished"
    );
    for (kind, count) in &kind_counts {
        info!(kind = *kind, count = *count, "action histogram");
    }
    Ok(())
}
