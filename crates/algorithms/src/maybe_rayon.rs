//! Row-parallel iteration with or without rayon.
//!
//! With the `parallel` feature this is rayon's prelude. Without it,
//! `into_par_iter()` is plain `into_iter()`, so the row loops in the
//! morphology, interpolation and ground modules produce identical output
//! on a single thread.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Single-threaded `rayon::prelude::IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
