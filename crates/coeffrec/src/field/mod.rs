//! Arithmetic backends: prime fields, p-adic numbers, and floating point.
//!
//! The exact machinery ([`crate::poly`], [`crate::interpolate`]) works on raw
//! residues with the helpers re-exported here; black boxes and phase-space
//! points exchange values through the tagged [`Scalar`].

mod modp;
pub use modp::{add_mod, inv_mod, mul_mod, neg_mod, pow_mod, reduce_i64, sub_mod, ModP};

mod padic;
pub use padic::PAdic;

mod scalar;
pub use scalar::{FieldKind, Scalar};
