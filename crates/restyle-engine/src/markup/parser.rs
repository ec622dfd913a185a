//! Recursive-descent parser for the editor's markup vocabulary.
//!
//! The grammar is deliberately closed: block tags, list tags, `span` with a
//! `style` attribute, `br`, and whatever tag names the shell's custom-leaf
//! registry declares. Anything else is an error rather than a guess — a
//! fragment the engine cannot fully model must never be half-rewritten.

use thiserror::Error;

use crate::dom::{dedupe_styles, BlockTag, DocTree, ListTag, NodeId, StyleDecl, StyleProperty, Tag};

use super::CustomTags;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),
    #[error("unknown tag <{name}> at byte {at}")]
    UnknownTag { name: String, at: usize },
    #[error("mismatched close tag: expected </{expected}>, found </{found}> at byte {at}")]
    MismatchedClose {
        expected: String,
        found: String,
        at: usize,
    },
    #[error("tag <{tag}> does not take attribute \"{attr}\" (byte {at})")]
    UnexpectedAttribute {
        tag: String,
        attr: String,
        at: usize,
    },
    #[error("unknown style property \"{property}\" at byte {at}")]
    UnknownStyleProperty { property: String, at: usize },
    #[error("malformed markup at byte {0}")]
    Malformed(usize),
}

/// Parse a markup fragment into a fresh [`DocTree`].
///
/// The fragment's top-level nodes become children of the tree's editor root.
/// Whitespace-only text directly under the root or a list container is
/// dropped; inside blocks it is content.
pub fn parse_fragment(input: &str, custom: &CustomTags) -> Result<DocTree, ParseError> {
    let mut tree = DocTree::new();
    let mut cur = Cursor::new(input);
    let children = parse_nodes(&mut cur, &mut tree, custom)?;
    if !cur.eof() {
        // Only an unconsumed close tag can stop the top-level loop.
        return Err(ParseError::Malformed(cur.pos));
    }
    let root = tree.root();
    for child in prune_structural_whitespace(&tree, &Tag::Root, children) {
        tree.append(root, child);
    }
    Ok(tree)
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.bump();
        }
    }

    /// Consume until `stop` returns true for the current char; returns the
    /// consumed slice.
    fn take_while(&mut self, mut keep: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            self.bump();
        }
        &self.input[start..self.pos]
    }
}

/// Parse sibling nodes until EOF or an unconsumed `</...` close tag.
fn parse_nodes(
    cur: &mut Cursor<'_>,
    tree: &mut DocTree,
    custom: &CustomTags,
) -> Result<Vec<NodeId>, ParseError> {
    let mut out = Vec::new();
    loop {
        if cur.eof() || cur.starts_with("</") {
            return Ok(out);
        }
        if cur.peek() == Some('<') {
            out.push(parse_element(cur, tree, custom)?);
        } else {
            let raw = cur.take_while(|c| c != '<');
            let decoded = html_escape::decode_html_entities(raw);
            out.push(tree.alloc_text(decoded.into_owned()));
        }
    }
}

fn parse_element(
    cur: &mut Cursor<'_>,
    tree: &mut DocTree,
    custom: &CustomTags,
) -> Result<NodeId, ParseError> {
    let open_at = cur.pos;
    if !cur.eat("<") {
        return Err(ParseError::Malformed(cur.pos));
    }
    let name = cur
        .take_while(|c| c.is_ascii_alphanumeric() || c == '-')
        .to_string();
    if name.is_empty() {
        return Err(ParseError::Malformed(open_at));
    }

    let attrs = parse_attributes(cur)?;
    cur.skip_whitespace();
    let self_closed = cur.eat("/>");
    if !self_closed && !cur.eat(">") {
        return Err(ParseError::Malformed(cur.pos));
    }

    if custom.contains(&name) {
        let inner = if self_closed {
            String::new()
        } else {
            read_raw_inner(cur, &name)?
        };
        return Ok(tree.alloc_custom(name, attrs, inner));
    }

    let tag = resolve_tag(&name).ok_or(ParseError::UnknownTag {
        name: name.clone(),
        at: open_at,
    })?;

    let node = match &tag {
        Tag::Span => {
            let mut styles = Vec::new();
            for (attr, value) in &attrs {
                if attr != "style" {
                    return Err(ParseError::UnexpectedAttribute {
                        tag: name.clone(),
                        attr: attr.clone(),
                        at: open_at,
                    });
                }
                styles = parse_style_attribute(value, open_at)?;
            }
            tree.alloc_span(styles)
        }
        _ => {
            if let Some((attr, _)) = attrs.first() {
                return Err(ParseError::UnexpectedAttribute {
                    tag: name.clone(),
                    attr: attr.clone(),
                    at: open_at,
                });
            }
            tree.alloc_element(tag.clone())
        }
    };

    // Void elements carry no content.
    if matches!(tag, Tag::Br) || self_closed {
        return Ok(node);
    }

    let children = parse_nodes(cur, tree, custom)?;
    expect_close(cur, &name)?;
    for child in prune_structural_whitespace(tree, &tag, children) {
        tree.append(node, child);
    }
    Ok(node)
}

fn resolve_tag(name: &str) -> Option<Tag> {
    if let Some(block) = BlockTag::from_name(name) {
        return Some(Tag::Block(block));
    }
    if let Some(list) = ListTag::from_name(name) {
        return Some(Tag::List(list));
    }
    match name {
        "span" => Some(Tag::Span),
        "br" => Some(Tag::Br),
        _ => None,
    }
}

fn parse_attributes(cur: &mut Cursor<'_>) -> Result<Vec<(String, String)>, ParseError> {
    let mut attrs = Vec::new();
    loop {
        cur.skip_whitespace();
        match cur.peek() {
            Some('>') | Some('/') => return Ok(attrs),
            None => return Err(ParseError::UnexpectedEof(cur.pos)),
            _ => {}
        }
        let name = cur
            .take_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            .to_string();
        if name.is_empty() || !cur.eat("=\"") {
            return Err(ParseError::Malformed(cur.pos));
        }
        let raw = cur.take_while(|c| c != '"');
        if !cur.eat("\"") {
            return Err(ParseError::UnexpectedEof(cur.pos));
        }
        let value = html_escape::decode_html_entities(raw).into_owned();
        attrs.push((name, value));
    }
}

fn parse_style_attribute(value: &str, at: usize) -> Result<Vec<StyleDecl>, ParseError> {
    let mut decls = Vec::new();
    for part in value.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (prop, val) = part.split_once(':').ok_or(ParseError::Malformed(at))?;
        let prop = prop.trim();
        let property =
            StyleProperty::from_name(prop).ok_or_else(|| ParseError::UnknownStyleProperty {
                property: prop.to_string(),
                at,
            })?;
        decls.push(StyleDecl::new(property, val.trim()));
    }
    Ok(dedupe_styles(&decls))
}

/// Capture the raw inner markup of an atomic custom leaf, verbatim, up to the
/// matching close tag. Nested occurrences of the same tag are balanced.
fn read_raw_inner(cur: &mut Cursor<'_>, name: &str) -> Result<String, ParseError> {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let start = cur.pos;
    let mut depth = 0usize;
    loop {
        if cur.eof() {
            return Err(ParseError::UnexpectedEof(cur.pos));
        }
        if cur.starts_with(&close) {
            if depth == 0 {
                let inner = cur.input[start..cur.pos].to_string();
                cur.eat(&close);
                return Ok(inner);
            }
            depth -= 1;
            cur.eat(&close);
            continue;
        }
        if cur.starts_with(&open) {
            // Only a real open counts; `<x-link` inside `<x-linked>` is a
            // different tag.
            let after = cur.rest()[open.len()..].chars().next();
            if matches!(after, Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/') {
                depth += 1;
            }
        }
        cur.bump();
    }
}

fn expect_close(cur: &mut Cursor<'_>, name: &str) -> Result<(), ParseError> {
    let at = cur.pos;
    if !cur.eat("</") {
        return Err(ParseError::UnexpectedEof(at));
    }
    let found = cur
        .take_while(|c| c.is_ascii_alphanumeric() || c == '-')
        .to_string();
    if !cur.eat(">") {
        return Err(ParseError::Malformed(cur.pos));
    }
    if found != name {
        return Err(ParseError::MismatchedClose {
            expected: name.to_string(),
            found,
            at,
        });
    }
    Ok(())
}

/// Drop whitespace-only text nodes in structural positions (under the root
/// or a list container), where they are markup formatting, not content.
fn prune_structural_whitespace(tree: &DocTree, parent_tag: &Tag, children: Vec<NodeId>) -> Vec<NodeId> {
    let structural = matches!(parent_tag, Tag::Root | Tag::List(_));
    if !structural {
        return children;
    }
    children
        .into_iter()
        .filter(|&child| {
            tree.text(child)
                .map(|text| !text.trim().is_empty())
                .unwrap_or(true)
        })
        .collect()
}
