//! Straight line segment extraction
//!
//! Canny edges are voted into a Hough accumulator (`imageproc::hough`), and each
//! polar line that collects enough votes is walked across the edge map to cut
//! it into finite segments. Runs of edge pixels separated by no more than the
//! allowed gap form one segment; segments shorter than the minimum length are
//! dropped.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

const EPSILON: f32 = 1e-6;

/// Non-maximum suppression radius in (r, angle) accumulator space
const SUPPRESSION_RADIUS: u32 = 2;

/// Parameters for segment extraction
#[derive(Debug, Clone, Copy)]
pub struct SegmentParams {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Minimum accumulator votes for a line
    pub votes: u32,
    pub min_length: f32,
    pub max_gap: f32,
}

/// A finite line segment with integer pixel endpoints, ordered left to right
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: (i32, i32),
    pub end: (i32, i32),
}

impl LineSegment {
    pub fn new(a: (i32, i32), b: (i32, i32)) -> Self {
        if (b.0, b.1) < (a.0, a.1) {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    /// Euclidean length in pixels
    pub fn length(&self) -> f64 {
        let dx = (self.end.0 - self.start.0) as f64;
        let dy = (self.end.1 - self.start.1) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Angle from horizontal in degrees, in (-90, 90]. Positive descends to the right.
    pub fn angle_degrees(&self) -> f64 {
        let dx = (self.end.0 - self.start.0) as f64;
        let dy = (self.end.1 - self.start.1) as f64;
        dy.atan2(dx).to_degrees()
    }

    /// Mean y coordinate of the two endpoints, truncated
    pub fn mean_y(&self) -> i32 {
        (self.start.1 + self.end.1) / 2
    }
}

/// Find straight segments in a grayscale image
pub fn find_segments(image: &GrayImage, params: &SegmentParams) -> Vec<LineSegment> {
    let edges = canny(image, params.canny_low, params.canny_high);
    find_segments_in_edges(&edges, params)
}

/// Find straight segments in an edge map (non-zero pixels are edges)
pub fn find_segments_in_edges(edges: &GrayImage, params: &SegmentParams) -> Vec<LineSegment> {
    let (width, height) = edges.dimensions();
    if width == 0 || height == 0 {
        return vec![];
    }

    let options = LineDetectionOptions {
        vote_threshold: params.votes,
        suppression_radius: SUPPRESSION_RADIUS,
    };

    let mut segments = Vec::new();
    for line in detect_lines(edges, options) {
        walk_line(edges, &line, params, &mut segments);
    }
    segments
}

/// Longest segment within `max_tilt` degrees of horizontal.
///
/// `inclusive` decides whether a segment exactly at the tilt limit qualifies.
/// Ties keep the first segment encountered.
pub fn longest_near_horizontal(
    segments: &[LineSegment],
    max_tilt: f64,
    inclusive: bool,
) -> Option<LineSegment> {
    let mut best: Option<LineSegment> = None;

    for segment in segments {
        let tilt = segment.angle_degrees().abs();
        let qualifies = if inclusive { tilt <= max_tilt } else { tilt < max_tilt };
        if !qualifies {
            continue;
        }
        if best.map_or(true, |b| segment.length() > b.length()) {
            best = Some(*segment);
        }
    }

    best
}

/// Clip a polar line to the image, walk it, and emit every qualifying run.
fn walk_line(edges: &GrayImage, line: &PolarLine, params: &SegmentParams, out: &mut Vec<LineSegment>) {
    let (width, height) = edges.dimensions();
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let rho = line.r;

    let Some((p0, p1)) = clip_to_image(rho, cos_t, sin_t, width as f32, height as f32) else {
        return;
    };

    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let steps = (dx.abs().max(dy.abs()).ceil() as usize).max(1);
    let step_len = (dx * dx + dy * dy).sqrt() / steps as f32;
    let max_gap_steps = (params.max_gap / step_len).floor() as usize;

    let mut run_start: Option<(usize, (f32, f32))> = None;
    let mut last_hit: Option<(usize, (f32, f32))> = None;

    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let point = (p0.0 + dx * t, p0.1 + dy * t);

        if !is_edge_near(edges, point, cos_t, sin_t) {
            continue;
        }

        match (run_start, last_hit) {
            (Some(_), Some((last_i, _))) if i - last_i <= max_gap_steps + 1 => {}
            (Some(start), Some(last)) => {
                emit_run(start.1, last.1, params.min_length, out);
                run_start = Some((i, point));
            }
            _ => run_start = Some((i, point)),
        }
        last_hit = Some((i, point));
    }

    if let (Some(start), Some(last)) = (run_start, last_hit) {
        emit_run(start.1, last.1, params.min_length, out);
    }
}

fn emit_run(a: (f32, f32), b: (f32, f32), min_length: f32, out: &mut Vec<LineSegment>) {
    let segment = LineSegment::new(
        (a.0.round() as i32, a.1.round() as i32),
        (b.0.round() as i32, b.1.round() as i32),
    );
    if segment.length() >= min_length as f64 {
        out.push(segment);
    }
}

/// Edge test with one pixel of tolerance along the line normal; the
/// accumulator quantizes r to whole pixels.
fn is_edge_near(edges: &GrayImage, point: (f32, f32), cos_t: f32, sin_t: f32) -> bool {
    [0.0f32, 1.0, -1.0].iter().any(|&offset| {
        let x = (point.0 + offset * cos_t).round();
        let y = (point.1 + offset * sin_t).round();
        x >= 0.0
            && y >= 0.0
            && (x as u32) < edges.width()
            && (y as u32) < edges.height()
            && edges.get_pixel(x as u32, y as u32).0[0] > 0
    })
}

/// Intersect `x cos + y sin = rho` with the image border and return the two
/// most distant intersection points.
fn clip_to_image(rho: f32, cos_t: f32, sin_t: f32, width: f32, height: f32) -> Option<((f32, f32), (f32, f32))> {
    let max_x = width - 1.0;
    let max_y = height - 1.0;
    let mut points: Vec<(f32, f32)> = Vec::with_capacity(4);

    if sin_t.abs() > EPSILON {
        for x in [0.0, max_x] {
            let y = (rho - x * cos_t) / sin_t;
            if (0.0..=max_y).contains(&y) {
                points.push((x, y));
            }
        }
    }
    if cos_t.abs() > EPSILON {
        for y in [0.0, max_y] {
            let x = (rho - y * sin_t) / cos_t;
            if (0.0..=max_x).contains(&x) {
                points.push((x, y));
            }
        }
    }

    let mut best: Option<((f32, f32), (f32, f32), f32)> = None;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            let d = (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2);
            if best.map_or(true, |(_, _, bd)| d > bd) {
                best = Some((*a, *b, d));
            }
        }
    }

    match best {
        Some((a, b, d)) if d > EPSILON => Some((a, b)),
        _ => None,
    }
}
