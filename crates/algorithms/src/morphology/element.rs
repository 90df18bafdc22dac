//! Structuring element definitions for morphological operations
//!
//! A structuring element defines the neighborhood shape used in
//! erosion, dilation, and opening.

use std::collections::BTreeMap;

use smrf_core::raster::Neighborhood;

/// Shape of a structuring element for morphological operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuringElement {
    /// Disk of given pixel radius: offsets with `dr² + dc² <= r²`
    Disk(usize),
    /// Square element of given radius (side = 2*radius + 1)
    Square(usize),
}

impl Default for StructuringElement {
    fn default() -> Self {
        StructuringElement::Disk(1)
    }
}

impl StructuringElement {
    /// Get the radius of the structuring element
    pub fn radius(&self) -> usize {
        match self {
            StructuringElement::Disk(r) | StructuringElement::Square(r) => *r,
        }
    }

    /// Radius zero is the single-cell element; filtering with it is a copy.
    pub fn is_identity(&self) -> bool {
        self.radius() == 0
    }

    fn neighborhood(&self) -> Neighborhood {
        match self {
            StructuringElement::Disk(r) => Neighborhood::Circle(*r),
            StructuringElement::Square(r) => Neighborhood::Square(*r),
        }
    }

    /// Compute (dr, dc) offsets relative to center for all active cells
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        self.neighborhood().offsets()
    }

    /// Decompose the element into horizontal runs.
    ///
    /// Returns one `(dr, half_width)` per row offset: the element covers
    /// columns `-half_width..=half_width` on row `dr`.
    pub fn row_spans(&self) -> Vec<(isize, usize)> {
        let mut spans: BTreeMap<isize, usize> = BTreeMap::new();
        for (dr, dc) in self.offsets() {
            let h = spans.entry(dr).or_insert(0);
            *h = (*h).max(dc.unsigned_abs());
        }
        spans.into_iter().collect()
    }
}
