use std::thread;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tapster_core::{ExternalDetection, ObservedObject, ShapeObservation, StateSnapshot};
use tracing::warn;

use crate::{
    blob::{BlobParams, detect_blobs},
    circle::{CircleParams, detect_circles},
    classifier::classify,
    rules::ColorRuleSet,
    signature::{SignatureConfig, color_signature, screen_hash},
};

/// Configuration for the whole perception pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    pub rules: ColorRuleSet,
    pub blobs: BlobParams,
    pub circles: CircleParams,
    pub signature: SignatureConfig,
}

/// Combined output of the perception sub-tasks. A `None` slot means that
/// sub-task failed; the step proceeds with whatever is present.
#[derive(Debug, Clone, Default)]
pub struct Perception {
    pub shapes: Option<Vec<ShapeObservation>>,
    pub blobs: Option<Vec<tapster_core::BlobObservation>>,
    pub circles: Option<Vec<tapster_core::CircleObservation>>,
    pub color_sig: Option<String>,
    pub screen_hash: Option<u64>,
}

/// Runs the perception sub-tasks in parallel over one frame and joins the
/// results. Each sub-task is a pure function of the frame; one failing
/// does not abort the others.
#[must_use]
pub fn perceive(frame: &RgbImage, config: &PerceptionConfig) -> Perception {
    thread::scope(|scope| {
        let shapes = scope.spawn(|| classify(frame, &config.rules));
        let blobs = scope.spawn(|| detect_blobs(frame, &config.blobs));
        let circles = scope.spawn(|| detect_circles(frame, &config.circles));
        let fingerprint = scope.spawn(|| {
            (
                color_signature(frame, &config.signature),
                screen_hash(frame),
            )
        });

        let fingerprint = join_task("fingerprint", fingerprint);
        let (color_sig, screen_hash) = match fingerprint {
            Some((sig, hash)) => (Some(sig), Some(hash)),
            None => (None, None),
        };
        Perception {
            shapes: join_task("shape classification", shapes),
            blobs: join_task("blob detection", blobs),
            circles: join_task("circle detection", circles),
            color_sig,
            screen_hash,
        }
    })
}

fn join_task<T>(name: &str, handle: thread::ScopedJoinHandle<'_, T>) -> Option<T> {
    match handle.join() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(task = name, "perception sub-task failed; continuing without it");
            None
        }
    }
}

impl Perception {
    /// Merges the perception results and any externally supplied
    /// detections into a per-step state snapshot.
    #[must_use]
    pub fn into_snapshot(
        self,
        image_shape: (u32, u32),
        money: i64,
        stars: i64,
        external: Vec<ExternalDetection>,
    ) -> StateSnapshot {
        let mut objects = Vec::new();
        objects.extend(self.shapes.into_iter().flatten().map(ObservedObject::Shape));
        objects.extend(self.blobs.into_iter().flatten().map(ObservedObject::Blob));
        objects.extend(self.circles.into_iter().flatten().map(ObservedObject::Circle));
        objects.extend(external.into_iter().map(ObservedObject::External));

        StateSnapshot {
            image_shape,
            money,
            stars,
            color_sig: self.color_sig.unwrap_or_else(|| "none".to_owned()),
            screen_hash: self.screen_hash.unwrap_or(0),
            objects,
        }
    }
}
