//! Bound data
//!
//! Values bound to templates, their block-file rendering and parsing.

mod bound;
mod format;
mod json;
pub(crate) mod parse;
pub(crate) mod tokenize;

pub use bound::BoundData;
pub use format::{FileResolver, NoReferences, RenderContext};
