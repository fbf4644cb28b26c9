//! Face-centred crop targeting: detection, outlier filtering, and weighted centroid.
//!
//! There is no production face-detection crate available in the corpus this crate was
//! built from. Per SPEC_FULL.md §4.4 / the original spec's §9 guidance ("either
//! detector may be replaced, provided the detection tuple and the area-ratio filter
//! are preserved"), both the primary and fallback detectors below are skin-tone /
//! contrast blob heuristics built on `image`/`imageproc` primitives rather than a
//! fabricated dependency. See DESIGN.md for the resolution record.

use image::RgbImage;

/// One face-ish detection: centre, bounding-box area, and a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub cx: f64,
    pub cy: f64,
    pub area: f64,
    pub confidence: f64,
}

const GRID: u32 = 16;
const MIN_SKIN_FRACTION: f64 = 0.35;

/// Primary detector: slides a coarse grid of windows over the frame and flags
/// windows whose skin-tone pixel density exceeds a threshold. `confidence` is that
/// density. Falls through to [`detect_fallback`] if nothing is found.
pub fn detect(frame: &RgbImage) -> Vec<Detection> {
    let primary = detect_skin_tone_windows(frame);
    if !primary.is_empty() {
        return primary;
    }
    detect_fallback(frame)
}

fn detect_skin_tone_windows(frame: &RgbImage) -> Vec<Detection> {
    let (w, h) = frame.dimensions();
    let win_w = (w / GRID).max(1);
    let win_h = (h / GRID).max(1);

    let mut detections = Vec::new();

    let mut y = 0;
    while y + win_h <= h {
        let mut x = 0;
        while x + win_w <= w {
            let (skin, total) = skin_fraction(frame, x, y, win_w, win_h);
            let fraction = skin as f64 / total.max(1) as f64;
            if fraction >= MIN_SKIN_FRACTION {
                detections.push(Detection {
                    cx: (x + win_w / 2) as f64,
                    cy: (y + win_h / 2) as f64,
                    area: (win_w * win_h) as f64,
                    confidence: fraction.min(1.0),
                });
            }
            x += win_w;
        }
        y += win_h;
    }

    detections
}

fn skin_fraction(frame: &RgbImage, x: u32, y: u32, w: u32, h: u32) -> (u32, u32) {
    let mut skin = 0u32;
    let mut total = 0u32;
    for py in y..(y + h) {
        for px in x..(x + w) {
            let pixel = frame.get_pixel(px, py);
            total += 1;
            if is_skin_tone(pixel.0[0], pixel.0[1], pixel.0[2]) {
                skin += 1;
            }
        }
    }
    (skin, total)
}

/// A permissive RGB skin-tone heuristic (not colour-space accurate, intentionally
/// loose since it only needs to bias the crop towards probable faces).
fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    r > 95 && g > 40 && b > 20 && (r - g).abs() > 15 && r > g && r > b
}

/// Fallback detector: used when the skin-tone pass finds nothing. Picks the single
/// highest-contrast quadrant of the frame as a low-confidence guess, approximating a
/// Haar-cascade fallback without a dependency on one.
fn detect_fallback(frame: &RgbImage) -> Vec<Detection> {
    let (w, h) = frame.dimensions();
    let half_w = w / 2;
    let half_h = h / 2;
    if half_w == 0 || half_h == 0 {
        return Vec::new();
    }

    let quadrants = [
        (0, 0),
        (half_w, 0),
        (0, half_h),
        (half_w, half_h),
    ];

    quadrants
        .iter()
        .map(|&(x, y)| (x, y, contrast(frame, x, y, half_w, half_h)))
        .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(x, y, contrast)| Detection {
            cx: (x + half_w / 2) as f64,
            cy: (y + half_h / 2) as f64,
            area: (half_w * half_h) as f64,
            confidence: (contrast / 255.0).clamp(0.1, 0.5),
        })
        .into_iter()
        .collect()
}

fn contrast(frame: &RgbImage, x: u32, y: u32, w: u32, h: u32) -> f64 {
    let mut min = 255u8;
    let mut max = 0u8;
    for py in (y..(y + h)).step_by(4) {
        for px in (x..(x + w)).step_by(4) {
            let p = frame.get_pixel(px, py);
            let luma = (0.299 * p.0[0] as f64 + 0.587 * p.0[1] as f64 + 0.114 * p.0[2] as f64) as u8;
            min = min.min(luma);
            max = max.max(luma);
        }
    }
    (max.saturating_sub(min)) as f64
}

/// Discards detections whose area lies outside `(0.005 * frame_area, 0.9 * frame_area)`.
pub fn filter_by_area_ratio(detections: Vec<Detection>, frame_area: f64) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.area > 0.005 * frame_area && d.area < 0.9 * frame_area)
        .collect()
}

/// If at least 3 detections remain, discards those further than 2 standard
/// deviations from the median `x` or median `y`.
pub fn filter_outliers(detections: Vec<Detection>) -> Vec<Detection> {
    if detections.len() < 3 {
        return detections;
    }

    let xs: Vec<f64> = detections.iter().map(|d| d.cx).collect();
    let ys: Vec<f64> = detections.iter().map(|d| d.cy).collect();

    let median_x = median(&xs);
    let median_y = median(&ys);
    let std_x = std_dev(&xs, median_x);
    let std_y = std_dev(&ys, median_y);

    detections
        .into_iter()
        .filter(|d| {
            (std_x == 0.0 || (d.cx - median_x).abs() <= 2.0 * std_x)
                && (std_y == 0.0 || (d.cy - median_y).abs() <= 2.0 * std_y)
        })
        .collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// The area-and-confidence weighted centroid of the surviving detections, or `None`
/// if no detections survive (caller falls back to frame centre).
pub fn weighted_centroid(detections: &[Detection]) -> Option<(f64, f64)> {
    let total_weight: f64 = detections.iter().map(|d| d.area * d.confidence).sum();
    if total_weight <= 0.0 {
        return None;
    }

    let cx = detections.iter().map(|d| d.cx * d.area * d.confidence).sum::<f64>() / total_weight;
    let cy = detections.iter().map(|d| d.cy * d.area * d.confidence).sum::<f64>() / total_weight;
    Some((cx, cy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(cx: f64, cy: f64, area: f64, confidence: f64) -> Detection {
        Detection { cx, cy, area, confidence }
    }

    #[test]
    fn test_filter_by_area_ratio() {
        let frame_area = 1000.0;
        let detections = vec![
            det(0.0, 0.0, 1.0, 0.9),      // too small: < 0.005 * 1000 = 5
            det(0.0, 0.0, 950.0, 0.9),    // too large: > 0.9 * 1000 = 900
            det(0.0, 0.0, 100.0, 0.9),    // within bounds
        ];
        let kept = filter_by_area_ratio(detections, frame_area);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].area, 100.0);
    }

    #[test]
    fn test_filter_outliers_keeps_clustered_detections() {
        let detections = vec![
            det(100.0, 100.0, 50.0, 0.9),
            det(105.0, 98.0, 50.0, 0.9),
            det(95.0, 102.0, 50.0, 0.9),
            det(10_000.0, 10_000.0, 50.0, 0.9), // far outlier
        ];
        let kept = filter_outliers(detections);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_filter_outliers_noop_below_three() {
        let detections = vec![det(0.0, 0.0, 1.0, 1.0), det(1000.0, 1000.0, 1.0, 1.0)];
        assert_eq!(filter_outliers(detections.clone()).len(), detections.len());
    }

    #[test]
    fn test_weighted_centroid() {
        let detections = vec![det(0.0, 0.0, 1.0, 1.0), det(100.0, 0.0, 1.0, 1.0)];
        let (cx, _) = weighted_centroid(&detections).unwrap();
        assert!((cx - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_centroid_none_when_empty() {
        assert!(weighted_centroid(&[]).is_none());
    }
}
