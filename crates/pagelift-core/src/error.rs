// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagelift.

use thiserror::Error;

/// Top-level error type for all Pagelift operations.
///
/// Every variant is recoverable at the pipeline boundary. A blank scene or a
/// missing candidate is reported through empty collections and `Option`, not
/// through this type; errors are reserved for corner sets that cannot drive
/// a perspective transform.
#[derive(Debug, Error)]
pub enum PageliftError {
    // -- Rectification errors --
    #[error("corners too close together: minimum pairwise separation {min_separation:.2}px")]
    CoincidentCorners { min_separation: f64 },

    #[error("degenerate quadrilateral: destination size {width}x{height}")]
    DegenerateQuad { width: u32, height: u32 },

    #[error("perspective transform is singular for the given corners")]
    SingularTransform,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PageliftError>;
