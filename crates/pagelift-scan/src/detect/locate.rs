// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document location — reduce candidate contours to quadrilaterals and pick
// the most plausible document shape.

use image::DynamicImage;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point as TracePoint;
use pagelift_core::DetectorOptions;
use pagelift_core::geometry::{Contour, Point, Quadrilateral, is_convex, polygon_area};
use tracing::{debug, instrument};

use crate::detect::contours::extract_contours;

/// Find the document quadrilateral among traced contours.
///
/// Each contour is approximated down to a polygon with an epsilon of
/// [`DetectorOptions::approx_epsilon_frac`] of its own perimeter; only
/// exactly-four-vertex results qualify. The largest candidate by enclosed
/// area wins (ties keep the first found) and is returned in canonical corner
/// order.
///
/// `None` means no candidate; callers fall back to
/// [`Quadrilateral::full_image`].
#[instrument(skip(contours, options), fields(contour_count = contours.len()))]
pub fn find_document_quad(
    contours: &[Contour],
    options: &DetectorOptions,
) -> Option<Quadrilateral> {
    let quad = largest_quad(contours, options, None).map(Quadrilateral::from_unordered);
    match &quad {
        Some(q) => debug!(area = q.area(), "Document quadrilateral selected"),
        None => debug!("No quadrilateral candidate among contours"),
    }
    quad
}

/// Detect the document quadrilateral in one step from an image.
///
/// Runs contour extraction and the quadrilateral search together. Knowing
/// the image dimensions lets [`DetectorOptions::min_area_frac`] and
/// [`DetectorOptions::max_area_frac`] take effect.
#[instrument(skip(image, options), fields(width = image.width(), height = image.height()))]
pub fn detect_document_quad(
    image: &DynamicImage,
    options: &DetectorOptions,
) -> Option<Quadrilateral> {
    let contours = extract_contours(image, options);
    let image_area = f64::from(image.width()) * f64::from(image.height());
    largest_quad(&contours, options, Some(image_area)).map(Quadrilateral::from_unordered)
}

/// Detect the largest convex quadrilateral, for per-frame preview overlays.
///
/// Same extraction and search core as [`detect_document_quad`], with the
/// convexity filter always on. The corners come back raw, in no particular
/// order; callers that need the canonical sequence pass them through
/// [`Quadrilateral::from_unordered`]. Every intermediate buffer is scoped to
/// this call.
#[instrument(skip(image, options), fields(width = image.width(), height = image.height()))]
pub fn detect_largest_convex_quad(
    image: &DynamicImage,
    options: &DetectorOptions,
) -> Option<[Point; 4]> {
    let opts = DetectorOptions {
        require_convex: true,
        ..options.clone()
    };
    let contours = extract_contours(image, &opts);
    let image_area = f64::from(image.width()) * f64::from(image.height());
    largest_quad(&contours, &opts, Some(image_area))
}

/// The shared candidate search behind both detection entry points.
///
/// `image_area` enables the fractional area bounds; contour-level callers
/// have no image dimensions and pass `None`, which disables them.
fn largest_quad(
    contours: &[Contour],
    options: &DetectorOptions,
    image_area: Option<f64>,
) -> Option<[Point; 4]> {
    let (min_area, max_area) = area_bounds(options, image_area);

    let mut best: Option<([Point; 4], f64)> = None;
    for contour in contours {
        let Some(corners) = approximate_to_quad(contour, options.approx_epsilon_frac) else {
            continue;
        };
        if options.require_convex && !is_convex(&corners) {
            continue;
        }
        let area = polygon_area(&corners);
        if area < min_area || area > max_area {
            continue;
        }
        match &best {
            Some((_, best_area)) if area <= *best_area => {}
            _ => best = Some((corners, area)),
        }
    }

    best.map(|(corners, _)| corners)
}

fn area_bounds(options: &DetectorOptions, image_area: Option<f64>) -> (f64, f64) {
    match image_area {
        Some(total) => (
            options.min_area_frac.map_or(0.0, |frac| frac * total),
            options.max_area_frac.map_or(f64::INFINITY, |frac| frac * total),
        ),
        None => (0.0, f64::INFINITY),
    }
}

/// Approximate a contour down to a quadrilateral, if it is one.
fn approximate_to_quad(contour: &Contour, epsilon_frac: f64) -> Option<[Point; 4]> {
    if contour.len() < 4 {
        return None;
    }

    let curve: Vec<TracePoint<f64>> = contour
        .points
        .iter()
        .map(|p| TracePoint::new(p.x, p.y))
        .collect();
    let epsilon = arc_length(&curve, true) * epsilon_frac;
    if epsilon <= 0.0 {
        return None;
    }

    let approx = approximate_closed_polygon(&curve, epsilon);
    if approx.len() != 4 {
        return None;
    }
    Some(std::array::from_fn(|i| {
        Point::new(approx[i].x, approx[i].y)
    }))
}

/// Douglas-Peucker approximation of a closed polygon, preserving ring order.
///
/// The open-curve routine keeps both endpoints of any slice it is handed, so
/// the ring is split at two mutually distant vertices and each arc is thinned
/// on its own. A farthest-distance vertex is a true extreme of the ring,
/// never the interior of a straight run, so both anchors belong in the
/// thinned result.
fn approximate_closed_polygon(curve: &[TracePoint<f64>], epsilon: f64) -> Vec<TracePoint<f64>> {
    let anchor = farthest_vertex(curve, curve[0]);
    let ring: Vec<TracePoint<f64>> = curve[anchor..]
        .iter()
        .chain(&curve[..anchor])
        .copied()
        .collect();

    let split = farthest_vertex(&ring, ring[0]);
    if split == 0 {
        // Zero diameter: every vertex coincides with the first.
        return vec![ring[0]];
    }

    let mut thinned = approximate_polygon_dp(&ring[..=split], epsilon, false);
    let mut closing: Vec<TracePoint<f64>> = ring[split..].to_vec();
    closing.push(ring[0]);
    let closing = approximate_polygon_dp(&closing, epsilon, false);

    // Each arc ends with the anchor the other one starts with.
    thinned.extend_from_slice(&closing[1..closing.len() - 1]);
    thinned
}

/// Index of the vertex farthest from `from`.
fn farthest_vertex(curve: &[TracePoint<f64>], from: TracePoint<f64>) -> usize {
    let mut best = 0;
    let mut best_dist = 0.0;
    for (i, p) in curve.iter().enumerate() {
        let dist = (p.x - from.x).powi(2) + (p.y - from.y).powi(2);
        if dist > best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

// -- Tests --------------------------------------------------------------------
