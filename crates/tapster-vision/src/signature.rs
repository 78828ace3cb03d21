use image::{RgbImage, imageops};
use serde::{Deserialize, Serialize};

/// Tuning for the dominant-color signature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Number of k-means clusters.
    pub k: usize,
    /// Multiplier applied to a cluster's population share before it is
    /// folded into the signature; coarser values make the signature more
    /// stable across frames of the same room.
    pub pct_factor: f64,
    /// Multiplier squashing each 0-255 channel before quantization.
    pub squash_factor: f64,
    /// Width of the thumbnail the clustering runs on.
    pub thumb_width: u32,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            k: 3,
            pct_factor: 0.1,
            squash_factor: 0.1,
            thumb_width: 40,
        }
    }
}

const HASH_SIZE: u32 = 8;

/// Difference hash of the frame: the horizontal-gradient sign pattern of a
/// tiny grayscale thumbnail, packed into 64 bits. Sensitive to any visible
/// change, which is exactly what the stagnation detector needs.
#[must_use]
pub fn screen_hash(frame: &RgbImage) -> u64 {
    if frame.width() == 0 || frame.height() == 0 {
        return 0;
    }
    let gray = imageops::grayscale(frame);
    let resized = imageops::resize(
        &gray,
        HASH_SIZE + 1,
        HASH_SIZE,
        imageops::FilterType::Triangle,
    );

    let mut hash = 0u64;
    for y in 0..HASH_SIZE {
        for x in 0..HASH_SIZE {
            let left = resized.get_pixel(x, y).0[0];
            let right = resized.get_pixel(x + 1, y).0[0];
            if right > left {
                hash |= 1 << (y * HASH_SIZE + x);
            }
        }
    }
    hash
}

/// Coarse fingerprint of the frame's dominant colors.
///
/// The frame is shrunk to a thumbnail, clustered with k-means, and each
/// cluster reduced to a `r-g-b-pct` component with heavily quantized
/// values; sorted components joined with `__` form the signature. Frames
/// of the same room produce the same string despite small animations.
#[must_use]
pub fn color_signature(frame: &RgbImage, config: &SignatureConfig) -> String {
    let clusters = dominant_colors(frame, config);
    let mut components: Vec<String> = clusters
        .iter()
        .map(|&(color, pct)| {
            let spct = (pct * config.pct_factor * 100.0) as i64;
            let squashed = color.map(|c| (c * config.squash_factor) as i64);
            format!("{}-{}-{}-{}", squashed[0], squashed[1], squashed[2], spct)
        })
        .collect();
    components.sort();
    components.join("__")
}

/// Dominant colors as `([r, g, b], population_share)` pairs, most common
/// first. Deterministic: centers are seeded from evenly spaced thumbnail
/// pixels rather than random draws.
fn dominant_colors(frame: &RgbImage, config: &SignatureConfig) -> Vec<([f64; 3], f64)> {
    if frame.width() == 0 || frame.height() == 0 || config.k == 0 {
        return Vec::new();
    }

    let thumb_width = config.thumb_width.max(1);
    let thumb_height =
        ((f64::from(frame.height()) / f64::from(frame.width())) * f64::from(thumb_width))
            .round()
            .max(1.0) as u32;
    let thumb = imageops::resize(
        frame,
        thumb_width,
        thumb_height,
        imageops::FilterType::Triangle,
    );

    let pixels: Vec<[f64; 3]> = thumb
        .pixels()
        .map(|p| [f64::from(p.0[0]), f64::from(p.0[1]), f64::from(p.0[2])])
        .collect();
    let k = config.k.min(pixels.len());

    let mut centers: Vec<[f64; 3]> = (0..k).map(|i| pixels[i * pixels.len() / k]).collect();
    let mut assignments = vec![0usize; pixels.len()];

    for _ in 0..10 {
        for (pixel, slot) in pixels.iter().zip(assignments.iter_mut()) {
            *slot = nearest_center(&centers, *pixel);
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (pixel, &cluster) in pixels.iter().zip(&assignments) {
            for c in 0..3 {
                sums[cluster][c] += pixel[c];
            }
            counts[cluster] += 1;
        }
        for (center, (sum, &count)) in centers.iter_mut().zip(sums.iter().zip(&counts)) {
            if count > 0 {
                *center = sum.map(|s| s / count as f64);
            }
        }
    }

    let mut counts = vec![0usize; k];
    for &cluster in &assignments {
        counts[cluster] += 1;
    }
    let total = pixels.len() as f64;

    let mut clusters: Vec<([f64; 3], f64)> = centers
        .into_iter()
        .zip(counts)
        .map(|(center, count)| (center, count as f64 / total))
        .collect();
    clusters.sort_by(|a, b| b.1.total_cmp(&a.1));
    clusters
}

fn nearest_center(centers: &[[f64; 3]], pixel: [f64; 3]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (i, center) in centers.iter().enumerate() {
        let dist = (0..3)
            .map(|c| (pixel[c] - center[c]).powi(2))
            .sum::<f64>();
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}
