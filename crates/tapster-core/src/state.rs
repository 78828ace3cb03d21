use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    geometry::{Point, Rect},
    shape::ShapeObservation,
};

/// Coarse dominant-color label attached to a detected blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobColor {
    Red,
    Green,
    Blue,
    Black,
    White,
}

impl BlobColor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Black => "black",
            Self::White => "white",
        }
    }
}

impl fmt::Display for BlobColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A solid-color keypoint found by the blob detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobObservation {
    pub center: Point,
    /// Approximate blob diameter in source pixels.
    pub size: f64,
    pub dom_color: BlobColor,
}

/// A near-circular region found by the circle detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleObservation {
    pub center: Point,
    pub radius: u32,
}

/// A detection supplied by an external object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDetection {
    pub label: String,
    pub confidence: f64,
    pub rect: Rect,
}

/// One interactive thing observed on screen, from any of the perception
/// sub-tasks or from an external detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObservedObject {
    Shape(ShapeObservation),
    Blob(BlobObservation),
    Circle(CircleObservation),
    External(ExternalDetection),
}

impl ObservedObject {
    /// Coarse object-type string used for action representations and
    /// weight-table lookups. External detections use their own label.
    #[must_use]
    pub fn object_type(&self) -> &str {
        match self {
            Self::Shape(_) => "action_shape",
            Self::Blob(_) => "blob",
            Self::Circle(_) => "circle",
            Self::External(d) => &d.label,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Shape(s) => s.bounds,
            Self::Blob(b) => {
                let r = (b.size / 2.0).max(0.0) as i32;
                let diameter = u32::try_from(2 * r).unwrap_or(0);
                Rect::new(b.center.x - r, b.center.y - r, diameter, diameter)
            }
            Self::Circle(c) => {
                let r = i32::try_from(c.radius).unwrap_or(0);
                Rect::new(c.center.x - r, c.center.y - r, 2 * c.radius, 2 * c.radius)
            }
            Self::External(d) => d.rect,
        }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        match self {
            Self::Shape(s) => s.centroid,
            Self::Blob(b) => b.center,
            Self::Circle(c) => c.center,
            Self::External(d) => d.rect.center(),
        }
    }
}

/// Everything known about one captured frame, after perception has run.
///
/// This is the per-step input to the room tracker and decision engine; it
/// owns its observations and is discarded once the step completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Source frame size as (width, height).
    pub image_shape: (u32, u32),
    pub money: i64,
    pub stars: i64,
    /// Coarse fingerprint of the frame's dominant colors; identifies the
    /// "room" the agent is in.
    pub color_sig: String,
    /// Cheap content-sensitive hash; changes whenever the screen changes.
    pub screen_hash: u64,
    pub objects: Vec<ObservedObject>,
}

impl StateSnapshot {
    /// Nearest observed object to a point, if any lies within
    /// `dist_threshold` pixels.
    #[must_use]
    pub fn find_nearest_object(&self, point: Point, dist_threshold: f64) -> Option<&ObservedObject> {
        let threshold_sq = (dist_threshold * dist_threshold) as i64;
        self.objects
            .iter()
            .map(|obj| (obj, obj.center().distance_squared(point)))
            .filter(|&(_, d)| d <= threshold_sq)
            .min_by_key(|&(_, d)| d)
            .map(|(obj, _)| obj)
    }
}

impl fmt::Display for StateSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "money: {} | stars: {} | objects: {}",
            self.money,
            self.stars,
            self.objects.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_at(x: i32, y: i32) -> ObservedObject {
        ObservedObject::Circle(CircleObservation {
            center: Point::new(x, y),
            radius: 10,
        })
    }

    #[test]
    fn test_find_nearest_object() {
        let state = StateSnapshot {
            image_shape: (1280, 720),
            money: 0,
            stars: 0,
            color_sig: "sig".to_owned(),
            screen_hash: 0,
            objects: vec![circle_at(100, 100), circle_at(500, 500)],
        };

        let hit = state.find_nearest_object(Point::new(110, 95), 50.0).unwrap();
        assert_eq!(hit.center(), Point::new(100, 100));

        assert!(state.find_nearest_object(Point::new(300, 300), 50.0).is_none());
    }

    #[test]
    fn test_object_type_labels() {
        assert_eq!(circle_at(0, 0).object_type(), "circle");
        let ext = ObservedObject::External(ExternalDetection {
            label: "person".to_owned(),
            confidence: 0.9,
            rect: Rect::new(0, 0, 10, 10),
        });
        assert_eq!(ext.object_type(), "person");
    }
}
