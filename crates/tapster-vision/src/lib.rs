//! Perception pipeline: turns a raw frame into typed observations.
//!
//! The pipeline is a fan-out of independent pure sub-tasks over one frame:
//!
//! - [`classifier`] - color-rule shape classification (the main detector)
//! - [`blob`] - solid-color blob keypoints
//! - [`circle`] - near-circular regions
//! - [`signature`] - coarse color signature and content-sensitive screen hash
//!
//! [`perception::perceive`] runs all of them on scoped threads and joins the
//! results into a [`tapster_core::StateSnapshot`]; a failing sub-task is
//! logged and leaves its slot empty rather than failing the frame.

pub use self::{
    blob::{BlobParams, detect_blobs},
    circle::{CircleParams, detect_circles},
    classifier::classify,
    perception::{Perception, PerceptionConfig, perceive},
    rules::{ColorRule, ColorRuleSet, HueRange},
    signature::{SignatureConfig, color_signature, screen_hash},
};

mod blob;
mod circle;
mod classifier;
mod contour_math;
mod hsv;
mod perception;
mod rules;
mod signature;
