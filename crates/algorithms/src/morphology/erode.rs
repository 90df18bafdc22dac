//! Morphological erosion (minimum filter)
//!
//! Replaces each pixel with the minimum value in its structuring element
//! neighborhood. Shrinks raised regions and enlarges depressions.

use smrf_core::raster::Raster;
use smrf_core::{Algorithm, Error, Result};

use super::element::StructuringElement;
use super::extreme::{extreme_filter, Extreme};

/// Parameters for morphological erosion
#[derive(Debug, Clone, Default)]
pub struct ErodeParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Erosion algorithm
#[derive(Debug, Clone, Default)]
pub struct Erode;

impl Algorithm for Erode {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ErodeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Erode"
    }

    fn description(&self) -> &'static str {
        "Morphological erosion (minimum filter over structuring element)"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        erode(&input, &params.element)
    }
}

/// Perform morphological erosion on a raster
///
/// Each output pixel is the minimum value within the structuring element
/// neighborhood, truncated at the raster border. No-data neighbors are
/// ignored.
///
/// # Arguments
/// * `raster` - Input raster
/// * `element` - Structuring element defining the neighborhood shape
pub fn erode(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    extreme_filter(raster, element, Extreme::Min)
}
