//! Grayscale mathematical morphology on elevation rasters
//!
//! - **Erosion**: minimum filter (shrinks raised regions)
//! - **Dilation**: maximum filter (expands raised regions)
//! - **Opening**: erosion then dilation (removes raised features narrower
//!   than the structuring element)
//!
//! All three use the same border convention: the neighborhood is truncated
//! at the raster edge. For the symmetric, convex elements provided here this
//! gives the same result as edge replication, and it keeps opening
//! idempotent.

mod dilate;
mod element;
mod erode;
mod extreme;
mod opening;

pub use dilate::{dilate, Dilate, DilateParams};
pub use element::StructuringElement;
pub use erode::{erode, Erode, ErodeParams};
pub use opening::{opening, Opening, OpeningParams};
