// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection pipeline — contour extraction and document location.

pub mod contours;
pub mod locate;

pub use contours::extract_contours;
pub use locate::{detect_document_quad, detect_largest_convex_quad, find_document_quad};
