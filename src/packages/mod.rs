//! Typed package facades
//!
//! Plain structs mirroring a catalog package field by field, converted to
//! and from the generic [`crate::package::Package`].

pub mod gwf_rch;

pub use gwf_rch::{FileTarget, GwfRch};
