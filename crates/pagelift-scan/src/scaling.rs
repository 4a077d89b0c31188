// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analysis-resolution scaling. Detection runs on a bounded-size copy of the
// frame; the factors here map detected coordinates back onto the original.

use image::DynamicImage;
use pagelift_core::{Point, Quadrilateral};
use tracing::{debug, instrument};

/// Longest frame side used for detection unless the caller overrides it.
pub const DEFAULT_ANALYSIS_MAX_DIM: u32 = 1280;

/// A detection-sized copy of a frame together with the per-axis factors that
/// map analysis coordinates back to full resolution.
pub struct AnalysisFrame {
    pub image: DynamicImage,
    scale_x: f64,
    scale_y: f64,
}

impl AnalysisFrame {
    /// Whether the frame was actually reduced.
    pub fn is_scaled(&self) -> bool {
        self.scale_x != 1.0 || self.scale_y != 1.0
    }

    /// Map a quadrilateral found on the analysis copy back onto the
    /// original frame.
    pub fn quad_to_full(&self, quad: &Quadrilateral) -> Quadrilateral {
        quad.scaled(self.scale_x, self.scale_y)
    }

    /// Map raw corner points found on the analysis copy back onto the
    /// original frame.
    pub fn points_to_full(&self, points: [Point; 4]) -> [Point; 4] {
        points.map(|p| Point::new(p.x * self.scale_x, p.y * self.scale_y))
    }
}

/// Produce a copy of `image` whose longest side is at most `max_dim`,
/// remembering the factors needed to undo the reduction.
///
/// Frames already within the bound pass through unchanged, as does
/// everything when `max_dim` is zero.
#[instrument(skip(image), fields(width = image.width(), height = image.height(), max_dim))]
pub fn downscale_for_analysis(image: &DynamicImage, max_dim: u32) -> AnalysisFrame {
    let (width, height) = (image.width(), image.height());
    if max_dim == 0 || (width <= max_dim && height <= max_dim) {
        return AnalysisFrame {
            image: image.clone(),
            scale_x: 1.0,
            scale_y: 1.0,
        };
    }

    let reduced = image.resize(max_dim, max_dim, image::imageops::FilterType::Triangle);
    let scale_x = f64::from(width) / f64::from(reduced.width());
    let scale_y = f64::from(height) / f64::from(reduced.height());
    debug!(
        analysis_w = reduced.width(),
        analysis_h = reduced.height(),
        scale_x,
        scale_y,
        "Frame reduced for analysis"
    );

    AnalysisFrame {
        image: reduced,
        scale_x,
        scale_y,
    }
}

// -- Tests --------------------------------------------------------------------
