//! Inline style declarations.
//!
//! The recognized property set is closed: the parser refuses anything else,
//! so a style run can only ever carry declarations the reformatters know how
//! to strip again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The inline properties the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleProperty {
    FontWeight,
    FontStyle,
    TextDecoration,
    Color,
}

impl StyleProperty {
    pub fn as_name(self) -> &'static str {
        match self {
            StyleProperty::FontWeight => "font-weight",
            StyleProperty::FontStyle => "font-style",
            StyleProperty::TextDecoration => "text-decoration",
            StyleProperty::Color => "color",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "font-weight" => StyleProperty::FontWeight,
            "font-style" => StyleProperty::FontStyle,
            "text-decoration" => StyleProperty::TextDecoration,
            "color" => StyleProperty::Color,
            _ => return None,
        })
    }
}

/// One `property: value` pair on an inline style run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDecl {
    pub property: StyleProperty,
    pub value: String,
}

impl StyleDecl {
    pub fn new(property: StyleProperty, value: impl Into<String>) -> Self {
        Self {
            property,
            value: value.into(),
        }
    }

    pub fn bold() -> Self {
        Self::new(StyleProperty::FontWeight, "bold")
    }

    pub fn italic() -> Self {
        Self::new(StyleProperty::FontStyle, "italic")
    }

    pub fn underline() -> Self {
        Self::new(StyleProperty::TextDecoration, "underline")
    }

    pub fn color(value: impl Into<String>) -> Self {
        Self::new(StyleProperty::Color, value)
    }
}

impl fmt::Display for StyleDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{};", self.property.as_name(), self.value)
    }
}

/// Deduplicate a declaration list by property. Order follows the first
/// occurrence of each property; the rightmost value wins.
pub fn dedupe_styles(decls: &[StyleDecl]) -> Vec<StyleDecl> {
    let mut out: Vec<StyleDecl> = Vec::with_capacity(decls.len());
    for decl in decls {
        match out.iter_mut().find(|d| d.property == decl.property) {
            Some(existing) => existing.value = decl.value.clone(),
            None => out.push(decl.clone()),
        }
    }
    out
}

/// Layer `own` over `inherited`, deduplicating by property. Used when a
/// nested style run accumulates (not replaces) its ancestors' declarations.
pub fn merge_styles(inherited: &[StyleDecl], own: &[StyleDecl]) -> Vec<StyleDecl> {
    let mut combined = inherited.to_vec();
    combined.extend_from_slice(own);
    dedupe_styles(&combined)
}
