//! Book descriptor — the static content a flip-book instance displays.
//!
//! DESIGN
//! ======
//! The core never touches image contents. A book is a list of opaque image
//! handles (two per spread) plus presentation metadata; the renderer maps
//! handles to real textures. Everything here derives from static content,
//! so every participant computes identical values locally — nothing in this
//! module is replicated.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::PagePosition;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("book has no page images")]
    Empty,
    #[error("page image count must be even, got {0}")]
    OddImageCount(usize),
}

/// Opaque handle to one page image. The renderer owns the mapping from
/// handle to texture; the core only shuffles handles between surface slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle(pub Uuid);

impl ImageHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Static content and presentation options for one flip-book.
#[derive(Debug, Clone)]
pub struct Book {
    title: String,
    author: String,
    description: String,
    images: Vec<ImageHandle>,
    double_page_count: bool,
}

// =============================================================================
// BOOK
// =============================================================================

impl Book {
    /// Build a book from page images. Two images make one spread.
    ///
    /// # Errors
    ///
    /// Returns `Empty` for a book without images and `OddImageCount` when
    /// the images cannot be paired into spreads.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        description: impl Into<String>,
        images: Vec<ImageHandle>,
        double_page_count: bool,
    ) -> Result<Self, BookError> {
        if images.is_empty() {
            return Err(BookError::Empty);
        }
        if images.len() % 2 != 0 {
            return Err(BookError::OddImageCount(images.len()));
        }
        Ok(Self {
            title: title.into(),
            author: author.into(),
            description: description.into(),
            images,
            double_page_count,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Highest valid spread index. Derived from content length, identical
    /// on every participant.
    #[must_use]
    pub fn max_page(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        {
            (self.images.len() / 2 - 1) as u32
        }
    }

    /// The two image handles for a spread: left page, right page.
    ///
    /// # Panics
    ///
    /// Panics if `page > max_page()`; callers validate against the legal
    /// domain before indexing.
    #[must_use]
    pub fn leaf(&self, page: u32) -> (ImageHandle, ImageHandle) {
        let index = page as usize * 2;
        (self.images[index], self.images[index + 1])
    }

    /// Human-facing label for a position: "-" while closed, else the page
    /// number under the configured counting scheme. Presentation only —
    /// never feeds back into authoritative state.
    #[must_use]
    pub fn page_label(&self, position: PagePosition) -> String {
        match position.open_page() {
            None => "-".to_owned(),
            Some(page) => {
                let number = if self.double_page_count { page * 2 + 1 } else { page + 1 };
                number.to_string()
            }
        }
    }

    /// Label for the last page under the configured counting scheme.
    #[must_use]
    pub fn max_page_label(&self) -> String {
        let number = if self.double_page_count { self.max_page() * 2 + 2 } else { self.max_page() + 1 };
        number.to_string()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "book_test.rs"]
mod tests;
