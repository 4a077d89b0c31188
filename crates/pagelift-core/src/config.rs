// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection tuning parameters.

use serde::{Deserialize, Serialize};

/// Tuning parameters for the detection pipeline.
///
/// The `Default` values are the capture-time preset: a still photograph of a
/// document on a contrasting background. [`DetectorOptions::preview`] is the
/// per-frame preset used for live overlay detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorOptions {
    /// Gaussian blur sigma applied before edge detection. The default is the
    /// sigma a 5x5 kernel implies.
    pub blur_sigma: f32,
    /// Canny hysteresis low threshold, on the 8-bit intensity scale.
    pub canny_low: f32,
    /// Canny hysteresis high threshold, on the 8-bit intensity scale.
    pub canny_high: f32,
    /// Close small gaps in the edge map before tracing.
    pub close_edge_gaps: bool,
    /// Trace only outermost boundaries, skipping holes and nested edges.
    pub external_only: bool,
    /// Perimeter fraction for the vertex-thinning pass on traced contours.
    /// Kept well below `approx_epsilon_frac` so thinning only strips trace
    /// noise and corner placement stays with the quadrilateral approximation.
    pub simplify_tolerance_frac: f64,
    /// Perimeter fraction for the epsilon of the quadrilateral approximation.
    pub approx_epsilon_frac: f64,
    /// Reject candidates whose corner sequence is not convex.
    pub require_convex: bool,
    /// Smallest accepted candidate area, as a fraction of the image area.
    /// `None` disables the bound.
    pub min_area_frac: Option<f64>,
    /// Largest accepted candidate area, as a fraction of the image area.
    /// `None` disables the bound.
    pub max_area_frac: Option<f64>,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 75.0,
            canny_high: 200.0,
            close_edge_gaps: false,
            external_only: false,
            simplify_tolerance_frac: 0.002,
            approx_epsilon_frac: 0.02,
            require_convex: false,
            min_area_frac: None,
            max_area_frac: None,
        }
    }
}

impl DetectorOptions {
    /// Preset for per-frame preview detection.
    ///
    /// Adds a morphological close over the edge map, traces only outermost
    /// boundaries, requires convex candidates, and accepts only candidates
    /// covering between 10% and 95% of the frame.
    pub fn preview() -> Self {
        Self {
            close_edge_gaps: true,
            external_only: true,
            require_convex: true,
            min_area_frac: Some(0.10),
            max_area_frac: Some(0.95),
            ..Self::default()
        }
    }
}
