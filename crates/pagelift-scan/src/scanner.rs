// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan orchestration. `DocumentScanner` runs detection on an
// analysis-resolution copy of the frame, maps the located quadrilateral back
// to full resolution, rectifies, and optionally enhances the result.

use image::DynamicImage;
use pagelift_core::{Contour, DetectorOptions, Point, Quadrilateral};
use tracing::{debug, info, instrument, warn};

use crate::detect::{detect_document_quad, detect_largest_convex_quad, extract_contours};
use crate::enhance::enhance_document;
use crate::scaling::{DEFAULT_ANALYSIS_MAX_DIM, downscale_for_analysis};

/// Outcome of one scan: the source frame, the located quadrilateral if any,
/// and the rectified rendering if one could be produced.
pub struct ScanResult {
    original: DynamicImage,
    quad: Option<Quadrilateral>,
    rectified: Option<DynamicImage>,
}

impl ScanResult {
    pub fn original(&self) -> &DynamicImage {
        &self.original
    }

    pub fn quad(&self) -> Option<Quadrilateral> {
        self.quad
    }

    pub fn rectified(&self) -> Option<&DynamicImage> {
        self.rectified.as_ref()
    }

    /// The best available rendering: rectified when present, the untouched
    /// source otherwise.
    pub fn output(&self) -> &DynamicImage {
        self.rectified.as_ref().unwrap_or(&self.original)
    }

    pub fn into_output(self) -> DynamicImage {
        self.rectified.unwrap_or(self.original)
    }

    /// The located quadrilateral, or full-image bounds so interactive
    /// callers always have corners to adjust.
    pub fn quad_or_full_image(&self) -> Quadrilateral {
        self.quad.unwrap_or_else(|| {
            Quadrilateral::full_image(self.original.width(), self.original.height())
        })
    }
}

/// Detection and rectification pipeline with a fixed set of options.
///
/// The scanner holds plain data only, so one instance can serve any number
/// of frames from any number of threads.
pub struct DocumentScanner {
    options: DetectorOptions,
    analysis_max_dim: u32,
    enhance_output: bool,
}

impl DocumentScanner {
    /// Capture preset: still frames, contrast enhancement on.
    pub fn new() -> Self {
        Self::with_options(DetectorOptions::default())
    }

    /// Preview preset: gap closing, external contours only, convex
    /// candidates within the plausible-area window. Enhancement is off since
    /// previews only need corners.
    pub fn preview() -> Self {
        Self {
            enhance_output: false,
            ..Self::with_options(DetectorOptions::preview())
        }
    }

    pub fn with_options(options: DetectorOptions) -> Self {
        Self {
            options,
            analysis_max_dim: DEFAULT_ANALYSIS_MAX_DIM,
            enhance_output: true,
        }
    }

    /// Skip the post-warp contrast enhancement.
    pub fn without_enhancement(mut self) -> Self {
        self.enhance_output = false;
        self
    }

    /// Bound the longest side used for detection; zero disables downscaling.
    pub fn with_analysis_bound(mut self, max_dim: u32) -> Self {
        self.analysis_max_dim = max_dim;
        self
    }

    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    /// Locate the document in `image`.
    ///
    /// Detection runs on the analysis-resolution copy; the returned result
    /// carries the quadrilateral in full-resolution coordinates.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: DynamicImage) -> ScanResult {
        let quad = self.find_quad(&image);
        match &quad {
            Some(q) => info!(area = q.area(), "Document located"),
            None => warn!("No document quadrilateral found"),
        }
        ScanResult {
            original: image,
            quad,
            rectified: None,
        }
    }

    /// Rectify a detection result.
    ///
    /// Without a quadrilateral there is nothing to do. A degenerate or
    /// singular corner set is recoverable: the result keeps the original
    /// rendering and the failure is logged.
    pub fn rectify(&self, scan: ScanResult) -> ScanResult {
        let ScanResult {
            original,
            quad,
            rectified,
        } = scan;
        let Some(ref q) = quad else {
            debug!("No quadrilateral to rectify");
            return ScanResult {
                original,
                quad,
                rectified,
            };
        };

        match crate::rectify::rectify(&original, q) {
            Ok(image) => ScanResult {
                original,
                quad,
                rectified: Some(image),
            },
            Err(err) => {
                warn!(error = %err, "Rectification failed, keeping original");
                ScanResult {
                    original,
                    quad,
                    rectified,
                }
            }
        }
    }

    /// Full pipeline: detect, rectify, and (unless disabled) enhance.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn scan(&self, image: DynamicImage) -> ScanResult {
        let result = self.rectify(self.detect(image));
        if !self.enhance_output {
            return result;
        }

        let ScanResult {
            original,
            quad,
            rectified,
        } = result;
        ScanResult {
            original,
            quad,
            rectified: rectified.map(|image| enhance_document(&image)),
        }
    }

    /// Contours of the frame's edge map under the scanner's options.
    pub fn contours(&self, image: &DynamicImage) -> Vec<Contour> {
        extract_contours(image, &self.options)
    }

    /// Canonically ordered quadrilateral in full-resolution coordinates.
    pub fn find_quad(&self, image: &DynamicImage) -> Option<Quadrilateral> {
        let analysis = downscale_for_analysis(image, self.analysis_max_dim);
        detect_document_quad(&analysis.image, &self.options).map(|q| analysis.quad_to_full(&q))
    }

    /// Raw corner points for overlay rendering, in full-resolution
    /// coordinates and in no particular order.
    pub fn find_quad_raw(&self, image: &DynamicImage) -> Option<[Point; 4]> {
        let analysis = downscale_for_analysis(image, self.analysis_max_dim);
        detect_largest_convex_quad(&analysis.image, &self.options)
            .map(|points| analysis.points_to_full(points))
    }
}

impl Default for DocumentScanner {
    fn default() -> Self {
        Self::new()
    }
}

// -- Tests --------------------------------------------------------------------
