//! Raster element trait for generic cell values

use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Elevation rasters use `f64` with NaN as the no-data marker; object masks
/// use `bool`, which has no no-data state.
pub trait RasterElement: Copy + Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Value used to initialise a fresh raster
    fn zero() -> Self;

    /// Default no-data value for this type
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64, if the type is numeric
    fn to_f64(self) -> Option<f64>;
}

macro_rules! impl_raster_element_int {
    ($t:ty) => {
        impl RasterElement for $t {
            fn zero() -> Self {
                0
            }

            fn default_nodata() -> Self {
                <$t>::MAX
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }

            fn to_f64(self) -> Option<f64> {
                Some(self as f64)
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn zero() -> Self {
                0.0
            }

            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }

            fn to_f64(self) -> Option<f64> {
                Some(self as f64)
            }
        }
    };
}

impl_raster_element_int!(i32);
impl_raster_element_int!(u8);
impl_raster_element_int!(u32);
impl_raster_element_int!(usize);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);

impl RasterElement for bool {
    fn zero() -> Self {
        false
    }

    fn default_nodata() -> Self {
        false
    }

    fn is_nodata(&self, _nodata: Option<Self>) -> bool {
        false
    }

    fn to_f64(self) -> Option<f64> {
        Some(if self { 1.0 } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!((-9999.0_f64).is_nodata(Some(-9999.0)));
        assert!(!1.0_f64.is_nodata(Some(-9999.0)));
    }

    #[test]
    fn test_bool_never_nodata() {
        assert!(!true.is_nodata(Some(true)));
        assert_eq!(true.to_f64(), Some(1.0));
        assert!(!bool::zero());
    }
}
