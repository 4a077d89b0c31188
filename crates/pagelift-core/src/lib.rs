// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagelift — Core geometry, detection options, and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod types;

pub use config::DetectorOptions;
pub use error::PageliftError;
pub use geometry::{Contour, Point, Quadrilateral};
pub use types::*;
