//! Morphological dilation (maximum filter)
//!
//! Replaces each pixel with the maximum value in its structuring element
//! neighborhood. Enlarges raised regions and fills narrow depressions.

use smrf_core::raster::Raster;
use smrf_core::{Algorithm, Error, Result};

use super::element::StructuringElement;
use super::extreme::{extreme_filter, Extreme};

/// Parameters for morphological dilation
#[derive(Debug, Clone, Default)]
pub struct DilateParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Dilation algorithm
#[derive(Debug, Clone, Default)]
pub struct Dilate;

impl Algorithm for Dilate {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = DilateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Dilate"
    }

    fn description(&self) -> &'static str {
        "Morphological dilation (maximum filter over structuring element)"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        dilate(&input, &params.element)
    }
}

/// Perform morphological dilation on a raster
///
/// Each output pixel is the maximum value within the structuring element
/// neighborhood, truncated at the raster border. No-data neighbors are
/// ignored.
pub fn dilate(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    extreme_filter(raster, element, Extreme::Max)
}
