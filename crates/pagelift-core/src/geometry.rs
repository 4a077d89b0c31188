// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometric primitives for document detection: points, traced contours, and
// canonically ordered quadrilaterals.

use serde::{Deserialize, Serialize};

/// A point in image pixel coordinates (x grows right, y grows down).
///
/// Coordinates are only meaningful relative to the image they were measured
/// in. Points from an analysis-resolution copy must be scaled before they are
/// applied to the full-resolution frame (see [`Quadrilateral::scaled`]).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Angle of the vector from `origin` to this point, in radians.
    fn angle_from(&self, origin: Point) -> f64 {
        (self.y - origin.y).atan2(self.x - origin.x)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// A closed boundary traced from an edge map.
///
/// Points are stored in trace order; the closing segment from the last point
/// back to the first is implicit. Detection emits contours in arbitrary
/// order, so consumers that care about size must sort or scan themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total length of the closed boundary, including the implicit closing
    /// segment.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let mut length = 0.0;
        for i in 0..self.points.len() {
            let j = (i + 1) % self.points.len();
            length += self.points[i].distance(self.points[j]);
        }
        length
    }

    /// Enclosed area of the closed boundary.
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }
}

/// Four document corners in canonical order: top-left, top-right,
/// bottom-right, bottom-left.
///
/// Canonical order is established at construction time. Corner sets straight
/// out of detection are plain `[Point; 4]` arrays until they pass through
/// [`Quadrilateral::from_unordered`], so an unordered set cannot reach the
/// rectifier by accident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    corners: [Point; 4],
}

impl Quadrilateral {
    /// Order four arbitrary corners into the canonical sequence.
    ///
    /// The points are sorted by the angle of the vector from their centroid,
    /// which is a consistent clockwise rotation in image coordinates (y grows
    /// down). The sorted ring is then rotated so the corner with the smallest
    /// `x + y` sum comes first.
    ///
    /// The smallest-sum anchor is a heuristic: it picks the true top-left
    /// only while the document is rotated less than about 45 degrees from
    /// axis-aligned. Beyond that the labels shift around the ring by one.
    pub fn from_unordered(points: [Point; 4]) -> Self {
        let cx = (points[0].x + points[1].x + points[2].x + points[3].x) / 4.0;
        let cy = (points[0].y + points[1].y + points[2].y + points[3].y) / 4.0;
        let centroid = Point::new(cx, cy);

        let mut ring = points;
        ring.sort_by(|a, b| a.angle_from(centroid).total_cmp(&b.angle_from(centroid)));

        let mut anchor = 0;
        for (i, p) in ring.iter().enumerate() {
            if p.x + p.y < ring[anchor].x + ring[anchor].y {
                anchor = i;
            }
        }

        Self {
            corners: std::array::from_fn(|i| ring[(anchor + i) % 4]),
        }
    }

    /// The quadrilateral covering the whole image.
    ///
    /// Callers fall back to this when detection finds no candidate, giving
    /// the user a full set of corner handles to adjust manually.
    pub fn full_image(width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        Self {
            corners: [
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(w, h),
                Point::new(0.0, h),
            ],
        }
    }

    pub fn top_left(&self) -> Point {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.corners[3]
    }

    /// All four corners in canonical order.
    pub fn corners(&self) -> [Point; 4] {
        self.corners
    }

    /// Enclosed area of the corner polygon.
    pub fn area(&self) -> f64 {
        polygon_area(&self.corners)
    }

    /// Whether the corner sequence forms a convex polygon.
    pub fn is_convex(&self) -> bool {
        is_convex(&self.corners)
    }

    /// Map the corners by independent x/y scale factors.
    ///
    /// Positive factors preserve canonical order, so this converts corner
    /// coordinates between an analysis-resolution copy and the
    /// full-resolution frame.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            corners: self.corners.map(|p| Point::new(p.x * sx, p.y * sy)),
        }
    }
}

/// Area enclosed by a closed polygon using the shoelace formula.
///
/// Vertices must be in ring order (CW or CCW); the result is the absolute
/// area. Fewer than 3 vertices enclose nothing.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area.abs() / 2.0
}

/// Whether a closed polygon is convex.
///
/// The cross products of consecutive edge vectors must never change sign.
/// Collinear runs are tolerated; a fully collinear point set is degenerate
/// and reported as not convex.
pub fn is_convex(points: &[Point]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let c = points[(i + 2) % points.len()];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() < 1e-9 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_corners() -> [Point; 4] {
        [
            Point::new(10.0, 20.0),
            Point::new(110.0, 20.0),
            Point::new(110.0, 170.0),
            Point::new(10.0, 170.0),
        ]
    }

    /// Every rotation and swap of a rectangle's corners must canonicalize to
    /// the same `[tl, tr, br, bl]` sequence.
    #[test]
    fn ordering_is_stable_across_permutations() {
        let [tl, tr, br, bl] = rect_corners();
        let permutations = [
            [tl, tr, br, bl],
            [tr, br, bl, tl],
            [br, bl, tl, tr],
            [bl, tl, tr, br],
            [br, tl, bl, tr],
            [bl, br, tr, tl],
        ];

        for perm in permutations {
            let quad = Quadrilateral::from_unordered(perm);
            assert_eq!(quad.top_left(), tl, "input {:?}", perm);
            assert_eq!(quad.top_right(), tr, "input {:?}", perm);
            assert_eq!(quad.bottom_right(), br, "input {:?}", perm);
            assert_eq!(quad.bottom_left(), bl, "input {:?}", perm);
        }
    }

    /// A perspective-skewed (but near-axis-aligned) quadrilateral keeps its
    /// corner labels after canonicalization.
    #[test]
    fn ordering_handles_skewed_quadrilateral() {
        let tl = Point::new(10.0, 12.0);
        let tr = Point::new(90.0, 8.0);
        let br = Point::new(95.0, 85.0);
        let bl = Point::new(5.0, 80.0);

        let quad = Quadrilateral::from_unordered([br, tl, bl, tr]);
        assert_eq!(quad.corners(), [tl, tr, br, bl]);
    }

    /// The full-image fallback covers the whole frame with canonical corners.
    #[test]
    fn full_image_covers_frame() {
        let quad = Quadrilateral::full_image(640, 480);
        assert_eq!(quad.top_left(), Point::new(0.0, 0.0));
        assert_eq!(quad.bottom_right(), Point::new(640.0, 480.0));
        assert!((quad.area() - 640.0 * 480.0).abs() < 1e-6);
        assert!(quad.is_convex());
    }

    /// Verify the shoelace area computation for a known rectangle.
    #[test]
    fn shoelace_area_rectangle() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
        ];
        let area = polygon_area(&points);
        assert!((area - 50.0).abs() < 1e-9, "expected 50.0, got {}", area);
    }

    /// Contour perimeter includes the implicit closing segment.
    #[test]
    fn contour_perimeter_closes_the_ring() {
        let contour = Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
        ]);
        assert!((contour.perimeter() - 30.0).abs() < 1e-9);
        assert!((contour.area() - 50.0).abs() < 1e-9);
    }

    /// Convexity accepts a square, rejects a self-intersecting bowtie, and
    /// rejects a fully collinear point set.
    #[test]
    fn convexity_check() {
        assert!(is_convex(&rect_corners()));

        let bowtie = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
        ];
        assert!(!is_convex(&bowtie));

        let collinear = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(3.0, 3.0),
        ];
        assert!(!is_convex(&collinear));
    }

    /// Scaling multiplies each axis independently and keeps corner labels.
    #[test]
    fn scaling_preserves_canonical_order() {
        let quad = Quadrilateral::from_unordered(rect_corners());
        let scaled = quad.scaled(2.0, 0.5);

        assert_eq!(scaled.top_left(), Point::new(20.0, 10.0));
        assert_eq!(scaled.bottom_right(), Point::new(220.0, 85.0));
        assert!((scaled.area() - quad.area()).abs() < 1e-6);
    }
}
