use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

/// Fraction of the perimeter used as the polygon-approximation tolerance.
const POLY_EPSILON_FRAC: f64 = 0.04;

/// Raw per-contour measurements, in processing-resolution coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContourMeasure {
    pub centroid_x: f64,
    pub centroid_y: f64,
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
    /// Absolute contour area from the polygon moments.
    pub area: f64,
    pub vertex_count: usize,
}

/// Polygon moments (m00, m10, m01) of a closed point sequence via Green's
/// theorem, matching how image moments behave on a traced contour.
fn polygon_moments(points: &[Point<i32>]) -> (f64, f64, f64) {
    let mut m00 = 0.0;
    let mut m10 = 0.0;
    let mut m01 = 0.0;
    for (i, p0) in points.iter().enumerate() {
        let p1 = points[(i + 1) % points.len()];
        let (x0, y0) = (f64::from(p0.x), f64::from(p0.y));
        let (x1, y1) = (f64::from(p1.x), f64::from(p1.y));
        let cross = x0 * y1 - x1 * y0;
        m00 += cross;
        m10 += (x0 + x1) * cross;
        m01 += (y0 + y1) * cross;
    }
    (m00 / 2.0, m10 / 6.0, m01 / 6.0)
}

/// Measures one contour. Returns `None` only for an empty point list; a
/// degenerate (zero-area) contour is measured with a substituted moment
/// denominator of 1 instead of raising a division fault.
pub(crate) fn measure_contour(points: &[Point<i32>]) -> Option<ContourMeasure> {
    if points.is_empty() {
        return None;
    }

    let (m00, m10, m01) = polygon_moments(points);
    let denom = if m00 == 0.0 { 1.0 } else { m00 };
    let centroid_x = m10 / denom;
    let centroid_y = m01 / denom;

    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let vertex_count = if points.len() < 3 {
        points.len()
    } else {
        let perimeter = arc_length(points, true);
        let epsilon = POLY_EPSILON_FRAC * perimeter;
        approximate_polygon_dp(points, epsilon, true).len()
    };

    Some(ContourMeasure {
        centroid_x,
        centroid_y,
        min_x,
        min_y,
        max_x,
        max_y,
        area: m00.abs(),
        vertex_count,
    })
}

/// Contour perimeter; exposed for the circularity filters.
pub(crate) fn contour_perimeter(points: &[Point<i32>]) -> f64 {
    arc_length(points, true)
}

/// `4 * pi * area / perimeter^2`; 1.0 for a perfect circle, lower for
/// elongated or ragged regions. Zero perimeter yields 0.
pub(crate) fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_points(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    #[test]
    fn test_rectangle_measurements() {
        let m = measure_contour(&rect_points(0, 0, 10, 20)).unwrap();
        assert!((m.area - 200.0).abs() < 1e-9);
        assert!((m.centroid_x - 5.0).abs() < 1e-9);
        assert!((m.centroid_y - 10.0).abs() < 1e-9);
        assert_eq!((m.min_x, m.min_y, m.max_x, m.max_y), (0, 0, 10, 20));
        assert_eq!(m.vertex_count, 4);
    }

    #[test]
    fn test_orientation_does_not_flip_centroid() {
        let mut reversed = rect_points(0, 0, 10, 20);
        reversed.reverse();
        let m = measure_contour(&reversed).unwrap();
        assert!((m.centroid_x - 5.0).abs() < 1e-9);
        assert!((m.centroid_y - 10.0).abs() < 1e-9);
        assert!((m.area - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_contour_does_not_panic() {
        // A single point has zero area; the denominator substitution keeps
        // the measurement finite.
        let m = measure_contour(&[Point::new(7, 9)]).unwrap();
        assert_eq!(m.area, 0.0);
        assert!(m.centroid_x.is_finite());
        assert!(m.centroid_y.is_finite());

        // A straight line also has zero enclosed area.
        let line = vec![Point::new(0, 0), Point::new(10, 0)];
        let m = measure_contour(&line).unwrap();
        assert_eq!(m.area, 0.0);
        assert!(m.centroid_x.is_finite());
    }

    #[test]
    fn test_empty_contour_skipped() {
        assert!(measure_contour(&[]).is_none());
    }

    #[test]
    fn test_circularity_of_square_vs_circle() {
        // Square: area s^2, perimeter 4s -> pi/4 ~ 0.785.
        let c = circularity(100.0, 40.0);
        assert!((c - std::f64::consts::PI / 4.0).abs() < 1e-9);
        assert_eq!(circularity(10.0, 0.0), 0.0);
    }
}
