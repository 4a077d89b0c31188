// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — map a detected quadrilateral onto an upright
// rectangle sized from its measured edge lengths.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::geometry::Quadrilateral;
use tracing::{debug, instrument};

/// Smallest pairwise corner distance the rectifier accepts, in pixels.
const MIN_CORNER_SEPARATION: f64 = 1.0;

/// Smallest triangle area any three corners may span, in square pixels.
const MIN_CORNER_TRIANGLE_AREA: f64 = 0.5;

/// Dimensions of the rectified output implied by a quadrilateral's edges.
///
/// Width is the longer of the top and bottom edges, height the longer of the
/// left and right edges; perspective foreshortens at most one of each pair,
/// so the longer edge is the better estimate of true extent. Both dimensions
/// truncate to whole pixels, which can shrink the output by up to one pixel
/// per axis relative to rounding.
pub fn destination_size(quad: &Quadrilateral) -> (u32, u32) {
    let tl = quad.top_left();
    let tr = quad.top_right();
    let br = quad.bottom_right();
    let bl = quad.bottom_left();

    let top_width = tr.distance(tl);
    let bottom_width = br.distance(bl);
    let left_height = tl.distance(bl);
    let right_height = tr.distance(br);

    let width = top_width.max(bottom_width) as u32;
    let height = left_height.max(right_height) as u32;
    (width, height)
}

/// Produce the top-down rendering of the document bounded by `quad`.
///
/// The quadrilateral must be canonical and in `image`'s coordinate space.
/// The four corners are mapped onto the rectangle
/// `(0,0), (W-1,0), (W-1,H-1), (0,H-1)` via a projective transform, and the
/// source is resampled into a fresh `W x H` buffer with bilinear
/// interpolation.
///
/// Corner sets that cannot drive a perspective transform surface as errors:
/// nearly coincident corners and zero-sized destinations are rejected before
/// the solver runs, and a set with three near-collinear corners admits no
/// unique four-point solution and is reported as
/// [`PageliftError::SingularTransform`]. All are recoverable; callers fall
/// back to the unrectified original.
#[instrument(skip(image, quad), fields(width = image.width(), height = image.height()))]
pub fn rectify(image: &DynamicImage, quad: &Quadrilateral) -> Result<DynamicImage> {
    let corners = quad.corners();

    let mut min_separation = f64::INFINITY;
    for i in 0..4 {
        for j in (i + 1)..4 {
            min_separation = min_separation.min(corners[i].distance(corners[j]));
        }
    }
    if min_separation < MIN_CORNER_SEPARATION {
        return Err(PageliftError::CoincidentCorners { min_separation });
    }

    let (out_w, out_h) = destination_size(quad);
    if out_w == 0 || out_h == 0 {
        return Err(PageliftError::DegenerateQuad {
            width: out_w,
            height: out_h,
        });
    }

    // Three near-collinear corners leave the four-point system without a
    // unique solution, and the least-squares solver hands back a fit for
    // such systems instead of refusing.
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let c = corners[(i + 2) % 4];
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        if cross.abs() / 2.0 < MIN_CORNER_TRIANGLE_AREA {
            return Err(PageliftError::SingularTransform);
        }
    }

    let src: [(f32, f32); 4] = [
        (corners[0].x as f32, corners[0].y as f32),
        (corners[1].x as f32, corners[1].y as f32),
        (corners[2].x as f32, corners[2].y as f32),
        (corners[3].x as f32, corners[3].y as f32),
    ];
    let dest: [(f32, f32); 4] = [
        (0.0, 0.0),
        ((out_w - 1) as f32, 0.0),
        ((out_w - 1) as f32, (out_h - 1) as f32),
        (0.0, (out_h - 1) as f32),
    ];

    let projection =
        Projection::from_control_points(src, dest).ok_or(PageliftError::SingularTransform)?;

    let rgba_input = image.to_rgba8();
    let mut output = RgbaImage::new(out_w, out_h);
    warp_into(
        &rgba_input,
        &projection,
        Interpolation::Bilinear,
        Rgba([0u8, 0, 0, 0]),
        &mut output,
    );

    debug!(out_w, out_h, "Perspective warp applied");
    Ok(DynamicImage::ImageRgba8(output))
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma, RgbImage};
    use pagelift_core::geometry::Point;

    /// Rectifying by a quadrilateral that bounds the whole image keeps the
    /// source dimensions (identity case, within truncation tolerance).
    #[test]
    fn identity_quad_keeps_dimensions() {
        let image =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 240, image::Rgb([90, 120, 150])));
        let quad = Quadrilateral::full_image(320, 240);

        let rectified = rectify(&image, &quad).expect("identity rectification");
        assert_eq!(rectified.width(), 320);
        assert_eq!(rectified.height(), 240);
    }

    /// Rectifying an already-rectified uniform image by its own bounding
    /// quadrilateral is a no-op away from the resampling border.
    #[test]
    fn idempotent_on_uniform_image() {
        let color = image::Rgb([173, 58, 222]);
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 160, color));
        let quad = Quadrilateral::full_image(200, 160);

        let rectified = rectify(&image, &quad).expect("identity rectification");
        assert_eq!(rectified.dimensions(), (200, 160));

        for y in 1..159 {
            for x in 1..199 {
                let px = rectified.get_pixel(x, y);
                assert_eq!(
                    (px[0], px[1], px[2], px[3]),
                    (173, 58, 222, 255),
                    "pixel ({x}, {y}) changed"
                );
            }
        }
    }

    /// Destination dimensions truncate rather than round.
    #[test]
    fn destination_size_truncates() {
        let quad = Quadrilateral::from_unordered([
            Point::new(0.0, 0.0),
            Point::new(199.6, 0.0),
            Point::new(199.6, 150.9),
            Point::new(0.0, 150.9),
        ]);
        assert_eq!(destination_size(&quad), (199, 150));
    }

    /// A synthetically skewed rectangle rectifies back to roughly the
    /// original aspect ratio, with the document content filling the output.
    #[test]
    fn recovers_aspect_of_skewed_rectangle() {
        // Source document: a plain bright page, 200x300 (aspect 2:3).
        let page = RgbImage::from_pixel(200, 300, image::Rgb([230, 230, 230]));

        // Place it in a 400x500 scene under a mild perspective skew.
        let skewed_corners = [
            (50.0f32, 60.0f32),
            (248.0, 64.0),
            (252.0, 362.0),
            (48.0, 358.0),
        ];
        let placement = Projection::from_control_points(
            [(0.0, 0.0), (199.0, 0.0), (199.0, 299.0), (0.0, 299.0)],
            skewed_corners,
        )
        .expect("placement projection");

        let mut scene = RgbImage::from_pixel(400, 500, image::Rgb([25, 25, 25]));
        warp_into(
            &page,
            &placement,
            Interpolation::Bilinear,
            image::Rgb([25, 25, 25]),
            &mut scene,
        );
        let scene = DynamicImage::ImageRgb8(scene);

        let quad = Quadrilateral::from_unordered(
            skewed_corners.map(|(x, y)| Point::new(f64::from(x), f64::from(y))),
        );
        let rectified = rectify(&scene, &quad).expect("skewed rectification");

        let aspect = f64::from(rectified.width()) / f64::from(rectified.height());
        let original_aspect = 200.0 / 300.0;
        assert!(
            (aspect - original_aspect).abs() / original_aspect < 0.05,
            "aspect {aspect} too far from {original_aspect}"
        );

        // The interior of the output should be page, not background.
        let (w, h) = rectified.dimensions();
        for (x, y) in [(w / 2, h / 2), (w / 10, h / 10), (9 * w / 10, 9 * h / 10)] {
            let px = rectified.get_pixel(x, y);
            assert!(
                px[0] > 180 && px[1] > 180 && px[2] > 180,
                "pixel ({x}, {y}) is background: {:?}",
                px
            );
        }
    }

    /// Nearly coincident corners are rejected before the solver runs.
    #[test]
    fn coincident_corners_are_rejected() {
        let quad = Quadrilateral::from_unordered([
            Point::new(10.0, 10.0),
            Point::new(10.2, 10.3),
            Point::new(100.0, 10.0),
            Point::new(100.0, 100.0),
        ]);
        let image = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(120, 120, Luma([128])));

        let err = rectify(&image, &quad).expect_err("degenerate guard should fire");
        assert!(
            matches!(
                err,
                PageliftError::CoincidentCorners { min_separation } if min_separation < 1.0
            ),
            "unexpected error: {err}"
        );
    }

    /// Three collinear corners admit no projective transform onto a
    /// rectangle; the solver failure surfaces as a structured error.
    #[test]
    fn collinear_corners_surface_singular_transform() {
        let quad = Quadrilateral::from_unordered([
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 100.0),
        ]);
        let image = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(120, 120, Luma([128])));

        let err = rectify(&image, &quad).expect_err("singular system should fail");
        assert!(
            matches!(err, PageliftError::SingularTransform),
            "unexpected error: {err}"
        );
    }

    /// Corner coordinates that are not finite cannot produce a usable
    /// destination size.
    #[test]
    fn non_finite_corners_are_rejected() {
        let quad = Quadrilateral::from_unordered([
            Point::new(f64::NAN, f64::NAN),
            Point::new(100.0, 0.0),
            Point::new(f64::NAN, f64::NAN),
            Point::new(0.0, 100.0),
        ]);
        let image = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(120, 120, Luma([128])));

        let err = rectify(&image, &quad).expect_err("non-finite corners should fail");
        assert!(
            matches!(err, PageliftError::DegenerateQuad { .. }),
            "unexpected error: {err}"
        );
    }
}
