pub use kurbo::{Point, Rect};

/// Milliseconds on the playback clock.
pub type Millis = f64;

pub fn clamp01(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Axis-aligned box from an origin and a size. Negative sizes are normalized.
pub fn box_rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
    Rect::new(x, y, x + w, y + h).abs()
}

/// Bounding box of a segment; degenerate for horizontal/vertical segments.
pub fn segment_rect(a: Point, b: Point) -> Rect {
    Rect::from_points(a, b)
}

/// Union of all boxes, `None` when the iterator is empty.
pub fn union_all(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

/// Formats a scene coordinate for DSL output: rounded to 4 decimals, no trailing zeros.
pub fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_owned();
    }
    let rounded = (v * 10_000.0).round() / 10_000.0;
    let s = format!("{rounded:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp01_handles_nan_and_bounds() {
        assert_eq!(clamp01(f64::NAN), 0.0);
        assert_eq!(clamp01(-1.0), 0.0);
        assert_eq!(clamp01(2.0), 1.0);
        assert_eq!(clamp01(0.25), 0.25);
    }

    #[test]
    fn box_rect_normalizes_negative_size() {
        let r = box_rect(2.0, 2.0, -1.0, 1.0);
        assert_eq!(r.x0, 1.0);
        assert_eq!(r.x1, 2.0);
    }

    #[test]
    fn union_all_of_nothing_is_none() {
        assert!(union_all(Vec::<Rect>::new()).is_none());
        let u = union_all([box_rect(0.0, 0.0, 1.0, 1.0), box_rect(3.0, 1.0, 1.0, 1.0)]).unwrap();
        assert_eq!((u.x0, u.y0, u.x1, u.y1), (0.0, 0.0, 4.0, 2.0));
    }

    #[test]
    fn fmt_num_drops_float_noise() {
        assert_eq!(fmt_num(0.2 * 6.0), "1.2");
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(-0.00001), "0");
        assert_eq!(fmt_num(3.6000000000000005), "3.6");
        assert_eq!(fmt_num(-0.2), "-0.2");
    }
}
