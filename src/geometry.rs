//! Dial geometry: the mapping from speed values to angles and from angles to
//! screen coordinates, plus the size-relative layout of the face.
//!
//! Everything here is pure; the layout is rebuilt only when the drawable
//! size changes and is immutable in between.

pub type Point = (f32, f32);

/// Angular anchor of every tick segment, in degrees. The dial starts at
/// 150 degrees (speed 0) and steps 15 degrees per 10 speed units; the last
/// three anchors wrap past 360 to the top of the dial.
pub const TICK_DEGREES: [i32; 17] = [
    150, 165, 180, 195, 210, 225, 240, 255, 270, 285, 300, 315, 330, 345, 360, 15, 30,
];

/// Printed labels, paired in order with the even-indexed tick anchors.
pub const LABEL_TEXT: [&str; 9] = ["0", "20", "40", "60", "80", "100", "120", "140", "160"];

pub const MAX_SPEED: i32 = 160;

/// Point on a circle of `radius` around `(center, center)` at `degrees`.
pub fn point_on_circle(radius: f32, center: f32, degrees: f64) -> Point {
    let radians = degrees.to_radians();
    (
        (radius as f64 * radians.cos() + center as f64) as f32,
        (radius as f64 * radians.sin() + center as f64) as f32,
    )
}

/// Needle angle for a speed value.
///
/// The rule is deliberately asymmetric: the low end clamps at 150 degrees,
/// while anything past 360 gets 360 subtracted exactly once (not a modulo).
/// This reproduces the 15/30 degree anchors for speeds above 140 and must
/// not be generalized.
pub fn speed_to_angle(speed: i32) -> i32 {
    let mut degree = (speed as f64 * 1.5 + 150.0).round() as i32;
    if degree < 150 {
        degree = 150;
    }
    if degree > 360 {
        degree -= 360;
    }
    degree
}

/// One line segment per tick anchor, spanning the two given radii.
pub fn tick_segments(outer_radius: f32, inner_radius: f32, center: f32) -> Vec<(Point, Point)> {
    TICK_DEGREES
        .iter()
        .map(|&degree| {
            (
                point_on_circle(outer_radius, center, degree as f64),
                point_on_circle(inner_radius, center, degree as f64),
            )
        })
        .collect()
}

/// Anchor points for the printed numbers: one per even-indexed tick.
pub fn label_positions(radius: f32, center: f32) -> Vec<Point> {
    TICK_DEGREES
        .iter()
        .enumerate()
        .filter(|(index, _)| index % 2 == 0)
        .map(|(_, &degree)| point_on_circle(radius, center, degree as f64))
        .collect()
}

/// Size-derived geometry of the dial. All lengths are fixed fractions of
/// the square side `size`.
#[derive(Debug, Clone)]
pub struct DialLayout {
    pub size: u32,
    pub center: f32,
    pub edging_width: f32,
    /// Radius of the gradient face (and of the edging ring's centerline).
    pub face_radius: f32,
    /// Unused by rendering but part of the layout state.
    pub inner_segment_radius: f32,
    pub tick_thickness: f32,
    pub needle_length: f32,
    pub label_text_size: f32,
    pub label_stroke_width: f32,
    pub segments: Vec<(Point, Point)>,
    pub labels: Vec<Point>,
}

impl DialLayout {
    pub fn new(size: u32) -> Self {
        let side = size as f32;
        let center = side / 2.0;
        let edging_width = side * 0.03;
        let face_radius = center - edging_width / 2.0;
        let tick_thickness = edging_width / 1.9;
        Self {
            size,
            center,
            edging_width,
            face_radius,
            inner_segment_radius: face_radius - side * 0.6,
            tick_thickness,
            needle_length: face_radius * 0.82,
            label_text_size: side * 0.06,
            label_stroke_width: tick_thickness / 3.0,
            segments: tick_segments(face_radius - side * 0.01, face_radius - side * 0.1, center),
            labels: label_positions(face_radius - side * 0.18, center),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn assert_close(actual: Point, expected: Point) {
        assert!(
            (actual.0 - expected.0).abs() < EPSILON && (actual.1 - expected.1).abs() < EPSILON,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn point_on_circle_cardinal_angles() {
        assert_close(point_on_circle(10.0, 100.0, 0.0), (110.0, 100.0));
        assert_close(point_on_circle(10.0, 100.0, 90.0), (100.0, 110.0));
        assert_close(point_on_circle(10.0, 100.0, 180.0), (90.0, 100.0));
        assert_close(point_on_circle(10.0, 100.0, 270.0), (100.0, 90.0));
    }

    #[test]
    fn speed_to_angle_anchor_values() {
        assert_eq!(speed_to_angle(0), 150);
        assert_eq!(speed_to_angle(100), 300);
        // 140 lands exactly on 360 and does not wrap
        assert_eq!(speed_to_angle(140), 360);
        // 160 overshoots to 390 and wraps once
        assert_eq!(speed_to_angle(160), 30);
    }

    #[test]
    fn speed_to_angle_rounds_half_degrees_up() {
        // odd speeds land between degrees and round to the nearest one
        assert_eq!(speed_to_angle(35), 203);
        assert_eq!(speed_to_angle(115), 323);
    }

    #[test]
    fn speed_to_angle_clamps_low_but_wraps_high_once() {
        assert_eq!(speed_to_angle(-20), 150);
        // the single subtraction is not a modulo
        assert_eq!(speed_to_angle(200), 90);
    }

    #[test]
    fn segment_and_label_counts_are_fixed() {
        for size in [1, 100, 400, 550, 2000] {
            let layout = DialLayout::new(size);
            assert_eq!(layout.segments.len(), 17);
            assert_eq!(layout.labels.len(), 9);
        }
    }

    #[test]
    fn labels_sit_on_even_tick_anchors() {
        let positions = label_positions(50.0, 100.0);
        for (label_index, position) in positions.iter().enumerate() {
            let degree = TICK_DEGREES[label_index * 2];
            assert_close(*position, point_on_circle(50.0, 100.0, degree as f64));
        }
    }

    #[test]
    fn layout_scales_linearly_with_size() {
        let small = DialLayout::new(400);
        let large = DialLayout::new(800);
        let pairs = [
            (small.center, large.center),
            (small.edging_width, large.edging_width),
            (small.face_radius, large.face_radius),
            (small.inner_segment_radius, large.inner_segment_radius),
            (small.tick_thickness, large.tick_thickness),
            (small.needle_length, large.needle_length),
            (small.label_text_size, large.label_text_size),
            (small.label_stroke_width, large.label_stroke_width),
        ];
        for (a, b) in pairs {
            assert!((b - a * 2.0).abs() < 1e-3, "{b} is not double {a}");
        }
    }

    #[test]
    fn layout_center_is_half_size() {
        let layout = DialLayout::new(550);
        assert_eq!(layout.center, 275.0);
        assert!(layout.edging_width > 0.0);
        assert!(layout.face_radius > 0.0);
        assert!(layout.needle_length > 0.0);
    }
}
