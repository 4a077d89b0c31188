// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagelift-scan — Document detection and perspective rectification.
//
// Provides the contour extraction and quadrilateral location pipeline, the
// homography-based perspective rectifier, post-warp enhancement (adaptive
// contrast and binarization), analysis-resolution scaling helpers, and the
// session page collection.

pub mod detect;
pub mod enhance;
pub mod pages;
pub mod rectify;
pub mod scaling;
pub mod scanner;

// Re-export the primary operations so callers can use `pagelift_scan::rectify` etc.
pub use detect::contours::extract_contours;
pub use detect::locate::{detect_document_quad, detect_largest_convex_quad, find_document_quad};
pub use enhance::{binarize_otsu, enhance_document};
pub use pages::{PageSet, ScannedPage};
pub use rectify::rectify;
pub use scaling::{AnalysisFrame, downscale_for_analysis};
pub use scanner::{DocumentScanner, ScanResult};
