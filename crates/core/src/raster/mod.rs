//! Raster data structures and grid geometry

mod element;
mod geotransform;
mod grid;
mod lattice;
mod neighborhood;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Mask, Raster, RasterStatistics};
pub use lattice::{validate_cell_size, EdgeClamp, Grid};
pub use neighborhood::{offset_within, Neighborhood};
