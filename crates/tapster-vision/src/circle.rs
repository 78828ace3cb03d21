use image::{RgbImage, imageops};
use imageproc::contours::{BorderType, find_contours};
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};
use tapster_core::{CircleObservation, Point};

use crate::contour_math::{circularity, contour_perimeter, measure_contour};

/// Filters for the bright-circle pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleParams {
    /// Gray level above which a pixel counts as part of a bright region.
    pub threshold: u8,
    pub min_radius: u32,
    pub max_radius: u32,
    pub min_circularity: f64,
}

impl Default for CircleParams {
    fn default() -> Self {
        Self {
            threshold: 200,
            min_radius: 20,
            max_radius: 40,
            min_circularity: 0.75,
        }
    }
}

/// Finds bright, near-circular regions within the configured radius band.
#[must_use]
pub fn detect_circles(frame: &RgbImage, params: &CircleParams) -> Vec<CircleObservation> {
    if frame.width() == 0 || frame.height() == 0 {
        return Vec::new();
    }

    let gray = gaussian_blur_f32(&imageops::grayscale(frame), 1.5);
    let mask = image::GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y).0[0];
        image::Luma([if value >= params.threshold { 255u8 } else { 0u8 }])
    });

    let mut circles = Vec::new();
    for contour in find_contours::<i32>(&mask) {
        if contour.border_type != BorderType::Outer {
            continue;
        }
        let Some(m) = measure_contour(&contour.points) else {
            continue;
        };
        let perimeter = contour_perimeter(&contour.points);
        if circularity(m.area, perimeter) < params.min_circularity {
            continue;
        }
        let radius = (m.area / std::f64::consts::PI).sqrt().round() as u32;
        if !(params.min_radius..=params.max_radius).contains(&radius) {
            continue;
        }
        circles.push(CircleObservation {
            center: Point::new(m.centroid_x.round() as i32, m.centroid_y.round() as i32),
            radius,
        });
    }
    circles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_disc(radius: i32) -> RgbImage {
        let mut frame = RgbImage::from_pixel(200, 200, image::Rgb([15, 15, 15]));
        for y in 0..200i32 {
            for x in 0..200i32 {
                let dx = x - 100;
                let dy = y - 100;
                if dx * dx + dy * dy <= radius * radius {
                    frame.put_pixel(x as u32, y as u32, image::Rgb([250, 250, 250]));
                }
            }
        }
        frame
    }

    #[test]
    fn test_detects_bright_circle_in_band() {
        let circles = detect_circles(&frame_with_disc(30), &CircleParams::default());
        assert_eq!(circles.len(), 1);
        let c = circles[0];
        assert!((c.center.x - 100).abs() <= 2);
        assert!((c.center.y - 100).abs() <= 2);
        assert!((20..=40).contains(&c.radius), "radius = {}", c.radius);
    }

    #[test]
    fn test_radius_band_is_enforced() {
        // Radius 60 is well above the default band of 20..=40.
        let circles = detect_circles(&frame_with_disc(60), &CircleParams::default());
        assert!(circles.is_empty());
    }

    #[test]
    fn test_square_region_is_rejected() {
        let mut frame = RgbImage::from_pixel(200, 200, image::Rgb([15, 15, 15]));
        // A long bright bar has low circularity.
        for y in 90..110 {
            for x in 20..180 {
                frame.put_pixel(x, y, image::Rgb([250, 250, 250]));
            }
        }
        let circles = detect_circles(&frame, &CircleParams::default());
        assert!(circles.is_empty());
    }
}
