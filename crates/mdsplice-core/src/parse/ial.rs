//! Inline attribute lists (`{: #id .class key="value"}`).
//!
//! Attribute lists are recognised in three positions:
//! - at the end of a paragraph, heading, tight list item or table cell,
//!   where they apply to that element;
//! - as a paragraph of their own, where they apply to the preceding block;
//! - directly after a link or image, where they apply to that inline.
//!
//! The list is removed from the text and rendered into an attribute fragment.

use crate::ast::{Node, NodeKind};
use crate::fragment;
use crate::util::escape_html;

/// Parse the body of an attribute list into a fragment.
///
/// Accepts the text between the braces, with or without the leading `:`.
/// Returns `None` if the body is empty or malformed.
///
/// ```
/// use mdsplice_core::parse::parse_attribute_list;
///
/// assert_eq!(
///     parse_attribute_list(": #intro .lead .wide").as_deref(),
///     Some(r#" id="intro" class="lead wide""#)
/// );
/// assert_eq!(parse_attribute_list(":remove").as_deref(), Some(" data-remove"));
/// ```
#[must_use]
pub fn parse_attribute_list(body: &str) -> Option<String> {
    let body = body.strip_prefix(':').unwrap_or(body);
    let tokens = tokenize(body)?;
    if tokens.is_empty() {
        return None;
    }

    let mut id = None;
    let mut classes = Vec::new();
    let mut rest = String::new();
    for token in tokens {
        match token {
            Token::Word(word) => {
                if let Some(value) = word.strip_prefix('#') {
                    id = Some(value.to_owned());
                } else if let Some(value) = word.strip_prefix('.') {
                    classes.push(value.to_owned());
                } else {
                    rest.push(' ');
                    rest.push_str(alias(&word));
                }
            }
            Token::Pair(key, value) => {
                rest.push_str(&format!(r#" {}="{}""#, alias(&key), escape_html(&value)));
            }
        }
    }

    let mut out = String::new();
    if let Some(id) = id {
        out.push_str(&format!(r#" id="{}""#, escape_html(&id)));
    }
    if !classes.is_empty() {
        out.push_str(&format!(r#" class="{}""#, escape_html(&classes.join(" "))));
    }
    out.push_str(&rest);
    Some(out)
}

/// Shorthand attribute names.
fn alias(name: &str) -> &str {
    match name {
        "remove" => "data-remove",
        "caption" => "data-caption",
        "tfoot" => "data-tfoot",
        other => other,
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    Pair(String, String),
}

/// Closing delimiter for a quote character. Smart punctuation may already
/// have turned straight quotes into curly ones.
fn closing_quote(open: char) -> Option<char> {
    match open {
        '"' => Some('"'),
        '\'' => Some('\''),
        '\u{201c}' => Some('\u{201d}'),
        '\u{2018}' => Some('\u{2019}'),
        _ => None,
    }
}

fn is_name(word: &str) -> bool {
    let mut chars = word.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn is_valid_word(word: &str) -> bool {
    match word.chars().next() {
        Some('#' | '.') => {
            let value = &word[1..];
            !value.is_empty() && !value.contains(['"', '\'', '<', '>'])
        }
        _ => is_name(word),
    }
}

fn tokenize(body: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = body.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            return Some(tokens);
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=') {
            key.push(c);
        }

        if chars.next_if_eq(&'=').is_none() {
            if !is_valid_word(&key) {
                return None;
            }
            tokens.push(Token::Word(key));
            continue;
        }

        if !is_name(&key) {
            return None;
        }
        let mut value = String::new();
        if let Some(close) = chars.peek().copied().and_then(closing_quote) {
            chars.next();
            loop {
                match chars.next() {
                    Some(c) if c == close => break,
                    Some(c) => value.push(c),
                    None => return None,
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }
        tokens.push(Token::Pair(key, value));
    }
}

/// Split `{…}` off the end of `text`, returning the remaining text and the
/// fragment.
fn split_trailing(text: &str) -> Option<(String, String)> {
    let trimmed = text.trim_end();
    let body = trimmed.strip_suffix('}')?;
    let open = body.rfind('{')?;
    let fragment = list_body(&body[open + 1..]).and_then(parse_attribute_list)?;
    Some((body[..open].trim_end().to_owned(), fragment))
}

/// Split `{…}` off the start of `text`.
fn split_leading(text: &str) -> Option<(String, String)> {
    let rest = text.strip_prefix('{')?;
    let close = rest.find('}')?;
    let fragment = list_body(&rest[..close]).and_then(parse_attribute_list)?;
    Some((rest[close + 1..].to_owned(), fragment))
}

/// Accept only `{:…}` and `{#…}` / `{.…}` so ordinary braces stay text.
fn list_body(body: &str) -> Option<&str> {
    (body.starts_with(':') || body.starts_with('#') || body.starts_with('.'))
        .then_some(body)
        .filter(|b| !b.contains('{'))
}

/// The whole text is a single attribute list.
fn standalone(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let body = trimmed.strip_prefix('{')?.strip_suffix('}')?;
    if body.contains(['{', '}']) {
        return None;
    }
    list_body(body).and_then(parse_attribute_list)
}

fn attach(node: &mut Node, extra: &str) {
    node.attrs = Some(fragment::merge(node.attrs.as_deref(), extra));
}

fn is_block(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Paragraph
            | NodeKind::Heading { .. }
            | NodeKind::BlockQuote
            | NodeKind::List { .. }
            | NodeKind::Item
            | NodeKind::CodeBlock { .. }
            | NodeKind::HtmlBlock
            | NodeKind::ThematicBreak
            | NodeKind::Table { .. }
    )
}

/// Attach attribute lists throughout the tree.
pub(super) fn apply(node: &mut Node) {
    attach_inline(&mut node.children);
    attach_standalone(&mut node.children);

    let trailing = match node.kind {
        NodeKind::Paragraph | NodeKind::Heading { .. } | NodeKind::TableCell => {
            let len = node.children.len();
            take_trailing(&mut node.children, len)
        }
        NodeKind::Item => {
            let inline_end = node
                .children
                .iter()
                .position(is_block)
                .unwrap_or(node.children.len());
            take_trailing(&mut node.children, inline_end)
        }
        _ => None,
    };
    if let Some(extra) = trailing {
        attach(node, &extra);
    }

    for child in &mut node.children {
        apply(child);
    }
}

/// Paragraphs made of a single attribute list apply to the previous block.
fn attach_standalone(children: &mut Vec<Node>) {
    let mut i = 1;
    while i < children.len() {
        let list = match (&children[i].kind, children[i].children.as_slice()) {
            (NodeKind::Paragraph, [only]) => match &only.kind {
                NodeKind::Text(text) => standalone(text),
                _ => None,
            },
            _ => None,
        };
        match list {
            Some(extra) if is_block(&children[i - 1]) => {
                attach(&mut children[i - 1], &extra);
                children.remove(i);
            }
            _ => i += 1,
        }
    }
}

/// Attribute lists directly after a link or image.
fn attach_inline(children: &mut Vec<Node>) {
    let mut i = 0;
    while i + 1 < children.len() {
        let is_target = matches!(
            children[i].kind,
            NodeKind::Link { .. } | NodeKind::Image { .. }
        );
        let split = match &children[i + 1].kind {
            NodeKind::Text(text) if is_target => split_leading(text),
            _ => None,
        };
        if let Some((rest, extra)) = split {
            attach(&mut children[i], &extra);
            if rest.is_empty() {
                children.remove(i + 1);
            } else {
                children[i + 1].kind = NodeKind::Text(rest);
            }
        }
        i += 1;
    }
}

/// Remove a trailing attribute list from the inline run `children[..end]`.
fn take_trailing(children: &mut Vec<Node>, end: usize) -> Option<String> {
    let last = end.checked_sub(1)?;
    let (rest, extra) = match &children[last].kind {
        NodeKind::Text(text) => split_trailing(text)?,
        _ => return None,
    };

    if rest.is_empty() {
        children.remove(last);
        if last > 0
            && matches!(
                children[last - 1].kind,
                NodeKind::SoftBreak | NodeKind::HardBreak
            )
        {
            children.remove(last - 1);
        }
        if let Some(prev) = last.checked_sub(1).and_then(|i| children.get_mut(i))
            && let NodeKind::Text(text) = &mut prev.kind
        {
            let len = text.trim_end().len();
            text.truncate(len);
        }
    } else {
        children[last].kind = NodeKind::Text(rest);
    }
    Some(extra)
}
