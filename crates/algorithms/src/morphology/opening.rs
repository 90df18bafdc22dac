//! Morphological opening (erosion followed by dilation)
//!
//! Removes raised features narrower than the structuring element while
//! leaving wider ones, and the terrain beneath them, untouched.

use smrf_core::raster::Raster;
use smrf_core::{Algorithm, Error, Result};

use super::dilate::dilate;
use super::element::StructuringElement;
use super::erode::erode;

/// Parameters for morphological opening
#[derive(Debug, Clone, Default)]
pub struct OpeningParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Opening algorithm
#[derive(Debug, Clone, Default)]
pub struct Opening;

impl Algorithm for Opening {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = OpeningParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Opening"
    }

    fn description(&self) -> &'static str {
        "Morphological opening (erosion then dilation) to remove small raised features"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        opening(&input, &params.element)
    }
}

/// Perform morphological opening on a raster
///
/// `open(S, r) = dilate(erode(S, r), r)`. The result never exceeds the
/// input, is idempotent (`open(open(S)) == open(S)`), and radius 0 is the
/// identity.
pub fn opening(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    let eroded = erode(raster, element)?;
    dilate(&eroded, element)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bumpy(rows: usize, cols: usize) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, 0.0);
        for row in 0..rows {
            for col in 0..cols {
                let v = ((row * 13 + col * 7 + row * col) % 11) as f64 * 0.5;
                r.set(row, col, v).unwrap();
            }
        }
        r
    }

    #[test]
    fn test_opening_removes_bright_spot() {
        let mut raster = Raster::filled(11, 11, 5.0);
        raster.set(5, 5, 100.0).unwrap();

        let result = opening(&raster, &StructuringElement::Disk(1)).unwrap();
        assert_eq!(result.get(5, 5).unwrap(), 5.0);
    }

    #[test]
    fn test_opening_preserves_large_region() {
        let mut raster = Raster::filled(15, 15, 5.0);
        for r in 3..12 {
            for c in 3..12 {
                raster.set(r, c, 100.0).unwrap();
            }
        }

        let result = opening(&raster, &StructuringElement::Disk(2)).unwrap();
        assert_eq!(result.get(7, 7).unwrap(), 100.0);
        assert_eq!(result.get(0, 0).unwrap(), 5.0);
    }

    #[test]
    fn test_opening_is_idempotent() {
        let raster = bumpy(20, 17);
        for r in 0..5 {
            let se = StructuringElement::Disk(r);
            let once = opening(&raster, &se).unwrap();
            let twice = opening(&once, &se).unwrap();
            assert_eq!(once.data(), twice.data(), "radius {r}");
        }
    }

    #[test]
    fn test_opening_is_anti_extensive() {
        let raster = bumpy(12, 12);
        let result = opening(&raster, &StructuringElement::Disk(3)).unwrap();
        for (o, i) in result.data().iter().zip(raster.data().iter()) {
            assert!(o <= i);
        }
    }

    #[test]
    fn test_opening_radius_zero_is_identity() {
        let raster = bumpy(6, 9);
        let result = opening(&raster, &StructuringElement::Disk(0)).unwrap();
        assert_eq!(result.data(), raster.data());
    }
}
