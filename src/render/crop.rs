//! Square crop geometry: side length, face-centred origin, and even-integer rounding.

/// Rounds a dimension down to the nearest even integer, per SPEC_FULL.md §4.4.
pub fn round_to_even(value: i64) -> i64 {
    value - (value % 2)
}

/// The square crop side: `min(width, height)`, rounded down to even.
pub fn square_side(width: u32, height: u32) -> i64 {
    round_to_even(width.min(height) as i64)
}

/// Clamps a face-weighted centre `(cx, cy)` into a valid crop origin for a `side`×`side`
/// square inside a `width`×`height` frame, rounded down to even integers.
///
/// `(cx, cy)` is the desired crop *centre*; the returned origin is the top-left corner.
pub fn crop_origin(cx: f64, cy: f64, side: i64, width: u32, height: u32) -> (i64, i64) {
    let max_x = (width as i64 - side).max(0);
    let max_y = (height as i64 - side).max(0);

    let x = (cx - side as f64 / 2.0).round() as i64;
    let y = (cy - side as f64 / 2.0).round() as i64;

    (round_to_even(x.clamp(0, max_x)), round_to_even(y.clamp(0, max_y)))
}

/// The no-faces-detected fallback origin: dead centre of the frame.
pub fn centered_origin(side: i64, width: u32, height: u32) -> (i64, i64) {
    crop_origin(width as f64 / 2.0, height as f64 / 2.0, side, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_even() {
        assert_eq!(round_to_even(5), 4);
        assert_eq!(round_to_even(4), 4);
        assert_eq!(round_to_even(0), 0);
    }

    #[test]
    fn test_square_side_is_even_and_min() {
        assert_eq!(square_side(1921, 1081), 1080);
        assert_eq!(square_side(1080, 1920), 1080);
    }

    #[test]
    fn test_crop_origin_is_clamped_and_even() {
        let (x, y) = crop_origin(-1000.0, -1000.0, 1080, 1920, 1080);
        assert_eq!((x, y), (0, 0));
        assert_eq!(x % 2, 0);
        assert_eq!(y % 2, 0);

        let (x, _) = crop_origin(100_000.0, 100_000.0, 1080, 1920, 1080);
        assert_eq!(x, round_to_even(1920 - 1080));
    }

    #[test]
    fn test_centered_origin_no_faces() {
        let (x, y) = centered_origin(1080, 1920, 1080);
        assert_eq!(x, round_to_even((1920 - 1080) / 2));
        assert_eq!(y, 0);
        assert_eq!(x % 2, 0);
        assert_eq!(y % 2, 0);
    }
}
