//! Terrain derivatives used by the ground filter
//!
//! - Gradient magnitude: local slope (dz/dx) of an elevation surface

mod gradient;

pub use gradient::{gradient_magnitude, GradientMagnitude, GradientParams};
