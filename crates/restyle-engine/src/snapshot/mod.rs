//! Snapshot testing support.
//!
//! Fixture-driven tests serialize the document tree through a stable,
//! flattened view instead of asserting on raw markup strings:
//!
//! - **`normalize`**: converts a [`crate::dom::DocTree`] into a serializable
//!   `Snap` of content lines (covering containers, text, inline runs with
//!   their effective styles) for `insta` snapshot assertions
//! - **`invariants`**: runtime checks a rewritten tree must always satisfy
//!   (link consistency, property-unique style runs, list nesting, childless
//!   leaves)

pub mod invariants;
pub mod normalize;

pub use invariants::check as invariants;
pub use normalize::{Snap, normalize};
