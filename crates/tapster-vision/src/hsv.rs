use image::RgbImage;

/// A pixel in hue-saturation-value form, using OpenCV's 8-bit ranges:
/// hue in `0..180`, saturation and value in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

pub(crate) fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let v = max;
    let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

    let h_deg = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    Hsv {
        h: (h_deg / 2.0) as u8,
        s: s.round() as u8,
        v: v as u8,
    }
}

/// A frame converted to HSV once, shared by all rule masks.
pub(crate) struct HsvImage {
    pub width: u32,
    pub height: u32,
    data: Vec<Hsv>,
}

impl HsvImage {
    pub(crate) fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let data = image
            .pixels()
            .map(|p| rgb_to_hsv(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> Hsv {
        self.data[(y * self.width + x) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 255, 0), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 0, 255), Hsv { h: 120, s: 255, v: 255 });
    }

    #[test]
    fn test_grays_have_zero_saturation() {
        let black = rgb_to_hsv(0, 0, 0);
        assert_eq!((black.s, black.v), (0, 0));
        let white = rgb_to_hsv(255, 255, 255);
        assert_eq!((white.h, white.s, white.v), (0, 0, 255));
        let gray = rgb_to_hsv(128, 128, 128);
        assert_eq!((gray.h, gray.s, gray.v), (0, 0, 128));
    }

    #[test]
    fn test_red_near_hue_origin() {
        // Slightly blue-ish red sits just below the wrap point.
        let hsv = rgb_to_hsv(255, 0, 10);
        assert!(hsv.h >= 178 || hsv.h == 0, "hue {} should wrap", hsv.h);
    }
}
