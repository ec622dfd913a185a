//! Markup adapter between the host rendering surface and [`DocTree`].
//!
//! The engine itself never talks to a live rendering host. The shell hands
//! fragments in through [`parse_fragment`] and takes rewritten, fully-closed
//! markup back out through [`write_markup`]. Everything in between operates
//! on the plain tree value.

mod parser;
mod writer;

use std::collections::HashSet;

pub use parser::{parse_fragment, ParseError};
pub use writer::{write_markup, write_subtree};

/// Registry of tag names treated as atomic custom leaves.
///
/// Supplied by the editor shell; anything in here parses as an opaque
/// [`crate::dom::NodeKind::Custom`] leaf that formatting never enters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTags(HashSet<String>);

impl CustomTags {
    /// The built-in plugin leaf vocabulary.
    pub fn standard() -> Self {
        Self(
            ["x-link", "x-image", "x-comment", "x-action", "x-mention"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

impl Default for CustomTags {
    fn default() -> Self {
        Self::standard()
    }
}
