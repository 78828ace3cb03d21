use image::{RgbImage, imageops};
use imageproc::contours::{BorderType, find_contours};
use imageproc::filter::gaussian_blur_f32;
use tapster_core::{Point, Rect, ShapeObservation};

use crate::{
    contour_math::{ContourMeasure, measure_contour},
    hsv::HsvImage,
    rules::{ColorRule, ColorRuleSet},
};

/// Frames taller than this are downscaled (aspect-preserving) before any
/// per-pixel work; results are mapped back to source coordinates.
const PROCESSING_HEIGHT: u32 = 320;

/// Light blur to suppress compression and anti-aliasing noise before
/// thresholding.
const BLUR_SIGMA: f32 = 1.2;

/// Classifies a frame against a rule table.
///
/// Each rule is evaluated independently over the same frame: pixels inside
/// the rule's HSV band form a binary mask, the mask's external contours are
/// measured, and contours surviving the rule's geometric filters become
/// observations tagged with the rule's category. A region that satisfies
/// several rules appears once per matching rule; no deduplication happens
/// here.
#[must_use]
pub fn classify(frame: &RgbImage, rules: &ColorRuleSet) -> Vec<ShapeObservation> {
    if frame.width() == 0 || frame.height() == 0 {
        return Vec::new();
    }

    let (processed, ratio) = downscale(frame);
    let blurred = gaussian_blur_f32(&processed, BLUR_SIGMA);
    let hsv = HsvImage::from_rgb(&blurred);

    let mut observations = Vec::new();
    for rule in &rules.rules {
        let mask = rule_mask(&hsv, rule);
        for contour in find_contours::<i32>(&mask) {
            if contour.border_type != BorderType::Outer {
                continue;
            }
            // Degenerate contours are measured with substituted moments or
            // skipped; neither case fails the frame.
            let Some(measure) = measure_contour(&contour.points) else {
                continue;
            };
            let observation = build_observation(rule, &measure, ratio);
            if rule.accepts(&observation) {
                observations.push(observation);
            }
        }
    }
    observations
}

fn downscale(frame: &RgbImage) -> (RgbImage, f64) {
    let (width, height) = frame.dimensions();
    if height <= PROCESSING_HEIGHT {
        return (frame.clone(), 1.0);
    }
    let ratio = f64::from(height) / f64::from(PROCESSING_HEIGHT);
    let new_width = ((f64::from(width) / ratio).round() as u32).max(1);
    let resized = imageops::resize(
        frame,
        new_width,
        PROCESSING_HEIGHT,
        imageops::FilterType::Triangle,
    );
    (resized, ratio)
}

fn rule_mask(hsv: &HsvImage, rule: &ColorRule) -> image::GrayImage {
    image::GrayImage::from_fn(hsv.width, hsv.height, |x, y| {
        if rule.matches_pixel(hsv.get(x, y)) {
            image::Luma([255u8])
        } else {
            image::Luma([0u8])
        }
    })
}

fn build_observation(rule: &ColorRule, m: &ContourMeasure, ratio: f64) -> ShapeObservation {
    let centroid = Point::new(
        (m.centroid_x * ratio).round() as i32,
        (m.centroid_y * ratio).round() as i32,
    );
    let x = (f64::from(m.min_x) * ratio).round() as i32;
    let y = (f64::from(m.min_y) * ratio).round() as i32;
    let width = ((f64::from(m.max_x - m.min_x + 1) * ratio).round() as u32).max(1);
    let height = ((f64::from(m.max_y - m.min_y + 1) * ratio).round() as u32).max(1);
    let bounds = Rect::new(x, y, width, height);

    let contour_area = m.area * ratio * ratio;
    let bounds_area = bounds.area();
    // Zero-area contours are a designed edge case: ratio against 1 instead
    // of dividing by zero.
    let area_denom = if contour_area == 0.0 { 1.0 } else { contour_area };

    ShapeObservation {
        category: rule.category,
        color_label: rule.color_label.clone(),
        centroid,
        bounds,
        contour_area,
        vertex_count: m.vertex_count,
        bounds_area,
        area_ratio: bounds_area / area_denom,
    }
}
