// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Captured-page collection. Pages keep their capture order and stay
// addressable by position for retake and removal flows.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use pagelift_core::PageId;

/// One captured page: the processed image plus identity and capture time.
#[derive(Clone)]
pub struct ScannedPage {
    pub id: PageId,
    pub image: DynamicImage,
    pub captured_at: DateTime<Utc>,
}

impl ScannedPage {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            id: PageId::new(),
            image,
            captured_at: Utc::now(),
        }
    }
}

/// An ordered multi-page capture session.
#[derive(Clone, Default)]
pub struct PageSet {
    pages: Vec<ScannedPage>,
}

impl PageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page and return its identifier.
    pub fn push(&mut self, image: DynamicImage) -> PageId {
        let page = ScannedPage::new(image);
        let id = page.id;
        self.pages.push(page);
        id
    }

    /// Retake the page at `index`: the image and capture time are replaced
    /// while the page keeps its identifier. Returns `None` when the index is
    /// out of range.
    pub fn replace(&mut self, index: usize, image: DynamicImage) -> Option<PageId> {
        let page = self.pages.get_mut(index)?;
        page.image = image;
        page.captured_at = Utc::now();
        Some(page.id)
    }

    pub fn get(&self, index: usize) -> Option<&ScannedPage> {
        self.pages.get(index)
    }

    /// Remove and return the page at `index`, shifting later pages up.
    pub fn remove(&mut self, index: usize) -> Option<ScannedPage> {
        if index < self.pages.len() {
            Some(self.pages.remove(index))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScannedPage> {
        self.pages.iter()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

// -- Tests --------------------------------------------------------------------
