// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour extraction — turn a raster image into candidate closed boundaries
// via grayscale conversion, Gaussian blur, Canny edge detection, and border
// following.

use image::{DynamicImage, GrayImage};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::morphology::close;
use imageproc::point::Point as TracePoint;
use pagelift_core::DetectorOptions;
use pagelift_core::geometry::{Contour, Point};
use tracing::{debug, instrument};

/// Extract candidate closed contours from an image.
///
/// Pipeline: grayscale, Gaussian blur, Canny hysteresis, optional
/// morphological close over the edge map, then border following into a flat
/// contour list. Traced boundaries are lightly thinned before return: the
/// tolerance strips trace noise but leaves enough vertices that downstream
/// polygon approximation still chooses the corners itself.
///
/// An empty or unprocessable input yields an empty list, never an error; a
/// blank scene legitimately has no contours. With
/// [`DetectorOptions::external_only`] set, boundaries nested inside another
/// boundary are dropped.
#[instrument(skip(image, options), fields(width = image.width(), height = image.height()))]
pub fn extract_contours(image: &DynamicImage, options: &DetectorOptions) -> Vec<Contour> {
    if image.width() == 0 || image.height() == 0 {
        debug!("Empty input image, no contours");
        return Vec::new();
    }

    let edges = edge_map(image, options);

    let mut contours = Vec::new();
    for traced in find_contours::<i32>(&edges) {
        if options.external_only && traced.parent.is_some() {
            continue;
        }
        if traced.points.len() < 3 {
            continue;
        }
        let thinned = thin_vertices(&traced.points, options.simplify_tolerance_frac);
        if thinned.len() >= 3 {
            contours.push(Contour::new(
                thinned
                    .iter()
                    .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                    .collect(),
            ));
        }
    }

    debug!(contour_count = contours.len(), "Contours traced");
    contours
}

/// Build the binary edge map that detection runs on.
pub(crate) fn edge_map(image: &DynamicImage, options: &DetectorOptions) -> GrayImage {
    let gray = image.to_luma8();
    let blurred = gaussian_blur_f32(&gray, options.blur_sigma);
    let edges = canny(&blurred, options.canny_low, options.canny_high);
    if options.close_edge_gaps {
        // A 5x5 square close reconnects edge runs the blur left fragmented.
        close(&edges, Norm::LInf, 2)
    } else {
        edges
    }
}

/// Drop redundant vertices from a traced boundary.
///
/// Douglas-Peucker with an epsilon proportional to the boundary's own closed
/// arc length, so longer boundaries tolerate proportionally more deviation.
/// The epsilon must stay small relative to the locator's approximation
/// epsilon: a vertex dropped here is gone for good, and an aggressive pass
/// can park the surviving vertex several pixels off a true corner.
fn thin_vertices(points: &[TracePoint<i32>], tolerance_frac: f64) -> Vec<TracePoint<i32>> {
    if tolerance_frac <= 0.0 {
        return points.to_vec();
    }
    let epsilon = arc_length(points, true) * tolerance_frac;
    if epsilon <= 0.0 {
        return points.to_vec();
    }
    approximate_polygon_dp(points, epsilon, true)
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn rect_image(w: u32, h: u32, left: u32, top: u32, right: u32, bottom: u32) -> DynamicImage {
        let mut img = GrayImage::from_pixel(w, h, Luma([20u8]));
        for y in top..bottom {
            for x in left..right {
                img.put_pixel(x, y, Luma([235u8]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    /// A uniform image has no edges, so extraction yields nothing.
    #[test]
    fn uniform_images_yield_no_contours() {
        let options = DetectorOptions::default();

        let black = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 150, Luma([0u8])));
        assert!(extract_contours(&black, &options).is_empty());

        let white = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 150, Luma([255u8])));
        assert!(extract_contours(&white, &options).is_empty());
    }

    /// A zero-dimension input is a valid no-contour outcome, not an error.
    #[test]
    fn zero_dimension_image_yields_no_contours() {
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(extract_contours(&empty, &DetectorOptions::default()).is_empty());
    }

    /// A well-contrasted rectangle produces at least one boundary enclosing
    /// roughly the rectangle's area.
    #[test]
    fn rectangle_produces_rectangular_contour() {
        let image = rect_image(400, 500, 80, 100, 320, 420);
        let contours = extract_contours(&image, &DetectorOptions::default());

        assert!(!contours.is_empty(), "expected contours from a clear rectangle");

        let expected_area = (320.0 - 80.0) * (420.0 - 100.0);
        let best = contours.iter().map(|c| c.area()).fold(0.0f64, f64::max);
        assert!(
            (best - expected_area).abs() / expected_area < 0.10,
            "largest contour area {} too far from {}",
            best,
            expected_area
        );
    }

    /// The thinned boundary of a clear rectangle still carries a vertex near
    /// each true corner. Thinning that parks vertices well inside a corner
    /// poisons every later stage, since no re-approximation can recover a
    /// dropped extreme.
    #[test]
    fn thinning_keeps_corner_fidelity() {
        let image = rect_image(400, 500, 80, 100, 320, 420);
        let contours = extract_contours(&image, &DetectorOptions::default());

        let boundary = contours
            .iter()
            .max_by(|a, b| a.area().total_cmp(&b.area()))
            .expect("rectangle should produce contours");

        let tolerance = 5.0;
        for corner in [
            Point::new(80.0, 100.0),
            Point::new(320.0, 100.0),
            Point::new(320.0, 420.0),
            Point::new(80.0, 420.0),
        ] {
            let nearest = boundary
                .points
                .iter()
                .map(|p| p.distance(corner))
                .fold(f64::INFINITY, f64::min);
            assert!(
                nearest <= tolerance,
                "no vertex within {tolerance}px of corner {corner}; nearest at {nearest:.1}px"
            );
        }
    }

    /// With `external_only`, boundaries nested inside other boundaries are
    /// dropped.
    #[test]
    fn external_only_drops_nested_boundaries() {
        // A frame: bright square with a dark square punched out of its middle.
        // Both boundaries produce closed edge rings once gaps are closed, and
        // the inner rings all nest inside the outermost one.
        let mut img = GrayImage::from_pixel(300, 300, Luma([20u8]));
        for y in 50..250 {
            for x in 50..250 {
                img.put_pixel(x, y, Luma([235u8]));
            }
        }
        for y in 100..200 {
            for x in 100..200 {
                img.put_pixel(x, y, Luma([20u8]));
            }
        }
        let image = DynamicImage::ImageLuma8(img);

        let closed = DetectorOptions {
            close_edge_gaps: true,
            ..DetectorOptions::default()
        };
        let all = extract_contours(&image, &closed);

        let external = extract_contours(
            &image,
            &DetectorOptions {
                external_only: true,
                ..closed
            },
        );

        assert!(!external.is_empty());
        assert!(
            external.len() < all.len(),
            "external-only ({}) should drop the nested boundaries out of {}",
            external.len(),
            all.len()
        );
    }

    /// Vertex thinning collapses a noisy-but-straight run down to its ends.
    #[test]
    fn thinning_collapses_collinear_runs() {
        let points: Vec<TracePoint<i32>> = (0..100)
            .map(|x| TracePoint::new(x, 0))
            .chain((0..50).map(|y| TracePoint::new(99, y)))
            .chain((0..100).rev().map(|x| TracePoint::new(x, 49)))
            .chain((0..50).rev().map(|y| TracePoint::new(0, y)))
            .collect();

        let thinned = thin_vertices(&points, 0.01);
        assert!(
            thinned.len() <= 8,
            "expected near-minimal vertex count, got {}",
            thinned.len()
        );
    }
}
