//! Exact polynomial layer over Z/pZ.
//!
//! [`Poly`] is the working type for everything the slicing pipeline
//! reconstructs: candidates evaluated along a slice, numerators and
//! denominators of interpolated functions, and their irreducible factors.

mod dense;
pub use dense::Poly;

mod factor;
pub use factor::{distinct_degree, equal_degree, factor, square_free_decomposition, Factorization};

mod rational;
pub use rational::Rational;

mod bivariate;
pub use bivariate::{BiPoly, BiRational};
