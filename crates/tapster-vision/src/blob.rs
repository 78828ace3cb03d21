use image::{RgbImage, imageops};
use imageproc::contours::{BorderType, find_contours};
use serde::{Deserialize, Serialize};
use tapster_core::{BlobColor, BlobObservation, Point};

use crate::contour_math::{circularity, contour_perimeter, measure_contour};

/// Filters for the solid-color blob pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobParams {
    /// Gray level separating blob pixels from background.
    pub threshold: u8,
    /// Foreground is darker than the threshold when true, brighter when
    /// false.
    pub dark_blobs: bool,
    pub min_area: f64,
    pub min_circularity: f64,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            threshold: 105,
            dark_blobs: true,
            min_area: 100.0,
            min_circularity: 0.1,
        }
    }
}

/// Finds solid-color keypoints and tags each with a coarse dominant color
/// sampled at its center.
#[must_use]
pub fn detect_blobs(frame: &RgbImage, params: &BlobParams) -> Vec<BlobObservation> {
    if frame.width() == 0 || frame.height() == 0 {
        return Vec::new();
    }

    let gray = imageops::grayscale(frame);
    let mask = image::GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y).0[0];
        let foreground = if params.dark_blobs {
            value < params.threshold
        } else {
            value >= params.threshold
        };
        image::Luma([if foreground { 255u8 } else { 0u8 }])
    });

    let mut blobs = Vec::new();
    for contour in find_contours::<i32>(&mask) {
        if contour.border_type != BorderType::Outer {
            continue;
        }
        let Some(m) = measure_contour(&contour.points) else {
            continue;
        };
        if m.area < params.min_area {
            continue;
        }
        let perimeter = contour_perimeter(&contour.points);
        if circularity(m.area, perimeter) < params.min_circularity {
            continue;
        }

        let center = Point::new(m.centroid_x.round() as i32, m.centroid_y.round() as i32);
        let size = 2.0 * (m.area / std::f64::consts::PI).sqrt();
        let dom_color = dominant_color_at(frame, center);
        blobs.push(BlobObservation {
            center,
            size,
            dom_color,
        });
    }
    blobs
}

fn dominant_color_at(frame: &RgbImage, center: Point) -> BlobColor {
    let x = center.x.clamp(0, frame.width() as i32 - 1) as u32;
    let y = center.y.clamp(0, frame.height() as i32 - 1) as u32;
    let [r, g, b] = frame.get_pixel(x, y).0;
    classify_dominant_color(r, g, b)
}

fn classify_dominant_color(r: u8, g: u8, b: u8) -> BlobColor {
    if g > r && g > b {
        BlobColor::Green
    } else if r > g && r > b {
        BlobColor::Red
    } else if b > g && b > r {
        BlobColor::Blue
    } else if r < 100 && g < 100 && b < 100 {
        BlobColor::Black
    } else {
        BlobColor::White
    }
}
