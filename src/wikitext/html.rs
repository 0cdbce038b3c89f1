//! HTML-like element parsing and tag-class dispatch, against the fixed
//! tag-class tables in [`crate::config`]. There is no extension-tag or
//! template renderer layer here, so an unrecognized tag name falls through
//! to the inline/paragraph catch-all rather than being looked up in a
//! broader registry.

use crate::ast::{Attribute, Block, HtmlContent, Inline};
use crate::config;
use crate::diagnostics::Diagnostic;
use crate::span::{Span, Spanned};
use crate::wikitext::{inline, Parser};

struct TagOpen {
    name: String,
    attrs: Vec<Attribute>,
    self_closing: bool,
}

/// Whether a start tag for any known element class begins at `pos` —
/// used by indent-pre to decide whether an HTML-like block element
/// terminates it.
pub(crate) fn starts_block_element(p: &Parser, pos: usize) -> bool {
    parse_start_tag(p, pos).is_some_and(|(_, tag)| {
        let name = tag.name.to_lowercase();
        config::BLOCK_WITH_BLOCKS_TAGS.contains(name.as_str())
            || config::BLOCK_NO_INDENT_PRE_TAGS.contains(name.as_str())
            || config::BLOCK_INLINE_ONLY_TAGS.contains(name.as_str())
            || config::TABLE_FAMILY_TAGS.contains(name.as_str())
            || config::PRE_TAGS.contains(name.as_str())
            || config::HEADING_TAGS.contains(name.as_str())
    })
}

/// Dispatches a start tag whose element class is block-level. Returns
/// `None` for a tag this grammar doesn't recognize as a block,
/// leaving it for `inline_element` or the paragraph catch-all.
pub(crate) fn block_element(p: &Parser, pos: usize) -> Option<(usize, Block)> {
    let (after_open, tag) = parse_start_tag(p, pos)?;
    let name = tag.name.to_lowercase();

    if config::PRE_TAGS.contains(name.as_str()) {
        return Some(pre_element(p, pos, after_open, tag));
    }
    if config::BLOCK_WITH_BLOCKS_TAGS.contains(name.as_str())
        || config::TABLE_FAMILY_TAGS.contains(name.as_str())
    {
        let (end, content) = nested_document(p, pos, after_open, &tag.name, tag.self_closing);
        return Some((
            end,
            Block::Html {
                name: tag.name,
                attrs: tag.attrs,
                content: HtmlContent::Blocks(content),
                self_closing: tag.self_closing,
            },
        ));
    }
    if config::BLOCK_NO_INDENT_PRE_TAGS.contains(name.as_str()) {
        let _wspre_off = p.stacks.push_wspre(false);
        let (end, content) = nested_document(p, pos, after_open, &tag.name, tag.self_closing);
        return Some((
            end,
            Block::Html {
                name: tag.name,
                attrs: tag.attrs,
                content: HtmlContent::Blocks(content),
                self_closing: tag.self_closing,
            },
        ));
    }
    if config::BLOCK_INLINE_ONLY_TAGS.contains(name.as_str()) {
        let _wspre_off = p.stacks.push_wspre(false);
        let (end, content) = inline_until_close(p, after_open, &tag.name, tag.self_closing);
        return Some((
            end,
            Block::Html {
                name: tag.name,
                attrs: tag.attrs,
                content: HtmlContent::Inline(content),
                self_closing: tag.self_closing,
            },
        ));
    }
    None
}

/// Dispatches a start tag whose element class is inline-level. Also handles
/// `nowiki` and `ref`, which are lexically inline but carry verbatim/block
/// content respectively.
pub(crate) fn inline_element(p: &Parser, pos: usize) -> Option<(usize, Spanned<Inline>)> {
    let (after_open, tag) = parse_start_tag(p, pos)?;
    let name = tag.name.to_lowercase();

    if config::VOID_TAGS.contains(name.as_str()) {
        if name == "br" {
            return Some((after_open, Spanned::new(Inline::LineBreak, pos, after_open)));
        }
        return Some((
            after_open,
            Spanned::new(
                Inline::HtmlElement {
                    name: tag.name,
                    attrs: tag.attrs,
                    content: Vec::new(),
                    self_closing: true,
                },
                pos,
                after_open,
            ),
        ));
    }
    if config::NOWIKI_TAGS.contains(name.as_str()) {
        return Some(nowiki_element(p, pos, after_open));
    }
    if config::REF_TAGS.contains(name.as_str()) {
        let _wspre_off = p.stacks.push_wspre(false);
        let close = format!("</{}>", tag.name);
        let src = p.src();
        let (body_end, closed) = match src[after_open..].find(&close) {
            Some(offset) => (after_open + offset, true),
            None => (src.len(), false),
        };
        let blocks = bounded_document(p, after_open, body_end);
        let end = if closed { body_end + close.len() } else { body_end };
        if !closed {
            p.diagnostics.borrow_mut().push(Diagnostic::UnclosedHtmlTag {
                tag: tag.name.clone(),
                span: Span::new(pos, end),
            });
        }
        return Some((end, Spanned::new(Inline::Ref { blocks }, pos, end)));
    }
    if config::INLINE_TAGS.contains(name.as_str()) {
        if tag.self_closing {
            return Some((
                after_open,
                Spanned::new(
                    Inline::HtmlElement {
                        name: tag.name,
                        attrs: tag.attrs,
                        content: Vec::new(),
                        self_closing: true,
                    },
                    pos,
                    after_open,
                ),
            ));
        }
        let content = inline_until_close(p, after_open, &tag.name, false);
        return Some((
            content.0,
            Spanned::new(
                Inline::HtmlElement {
                    name: tag.name,
                    attrs: tag.attrs,
                    content: content.1,
                    self_closing: false,
                },
                pos,
                content.0,
            ),
        ));
    }
    None
}

fn nowiki_element(p: &Parser, pos: usize, after_open: usize) -> (usize, Spanned<Inline>) {
    let src = p.src();
    let close = "</nowiki>";
    let (body_end, closed) = match src[after_open..].find(close) {
        Some(offset) => (after_open + offset, true),
        None => (src.len(), false),
    };
    let end = if closed { body_end + close.len() } else { body_end };
    if !closed {
        p.diagnostics.borrow_mut().push(Diagnostic::UnclosedHtmlTag {
            tag: "nowiki".to_owned(),
            span: Span::new(pos, end),
        });
    }
    (end, Spanned::new(Inline::Nowiki(src[after_open..body_end].to_owned()), pos, end))
}

fn pre_element(p: &Parser, pos: usize, after_open: usize, tag: TagOpen) -> (usize, Block) {
    let src = p.src();
    let close = "</pre>";
    let (body_end, closed) = match src[after_open..].find(close) {
        Some(offset) => (after_open + offset, true),
        None => (src.len(), false),
    };
    let end = if closed { body_end + close.len() } else { body_end };
    if !closed {
        p.diagnostics.borrow_mut().push(Diagnostic::UnclosedHtmlTag {
            tag: "pre".to_owned(),
            span: Span::new(pos, end),
        });
    }
    let raw = src[after_open..body_end].to_owned();
    (
        end,
        Block::Html {
            name: tag.name,
            attrs: tag.attrs,
            content: HtmlContent::Raw(raw),
            self_closing: false,
        },
    )
}

fn inline_until_close(p: &Parser, pos: usize, tag_name: &str, self_closing: bool) -> (usize, Vec<Spanned<Inline>>) {
    if self_closing {
        return (pos, Vec::new());
    }
    let close = format!("</{tag_name}>");
    let src = p.src();
    let limit = src[pos..].find(&close).map_or(src.len(), |n| pos + n);
    let mut out = Vec::new();
    let mut cur = pos;
    while cur < limit {
        let (next, mut nodes) = inline::inline_element_bounded(p, cur, limit);
        if next > limit || next == cur {
            break;
        }
        out.append(&mut nodes);
        cur = next;
    }
    let end = if limit < src.len() { limit + close.len() } else { limit };
    (end, out)
}

/// Parses a nested block document up to the matching close tag for
/// `tag_name`, consuming it if present (EOF otherwise closes the region,
/// logging a diagnostic).
fn nested_document(p: &Parser, pos: usize, after_open: usize, tag_name: &str, self_closing: bool) -> (usize, Vec<Block>) {
    if self_closing {
        return (after_open, Vec::new());
    }
    let _ifnot = p.stacks.push_ifnot(crate::engine::traps::close_tag(tag_name));
    let mut out = Vec::new();
    let mut cur = after_open;
    loop {
        if p.buffer.is_eof(cur) || crate::engine::traps::close_tag(tag_name)(p.src(), cur) {
            break;
        }
        let (next, block) = p.document_block(cur);
        if next == cur {
            break;
        }
        out.push(block);
        cur = next;
    }
    drop(_ifnot);
    let close = format!("</{tag_name}>");
    if let Some(end) = p.buffer.match_literal_ci(cur, &close) {
        (end, out)
    } else {
        p.diagnostics.borrow_mut().push(Diagnostic::UnclosedHtmlTag {
            tag: tag_name.to_owned(),
            span: Span::new(pos, cur),
        });
        (cur, out)
    }
}

fn bounded_document(p: &Parser, pos: usize, limit: usize) -> Vec<Block> {
    let mut out = Vec::new();
    let mut cur = pos;
    while cur < limit {
        let (next, block) = p.document_block(cur);
        if next > limit || next == cur {
            break;
        }
        out.push(block);
        cur = next;
    }
    out
}

fn parse_start_tag(p: &Parser, pos: usize) -> Option<(usize, TagOpen)> {
    let after_lt = p.buffer.match_literal(pos, "<")?;
    if p.src().as_bytes().get(after_lt) == Some(&b'/') {
        return None;
    }
    let src = p.src();
    let name_end = {
        let rest = &src[after_lt..];
        let len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '\0'))
            .unwrap_or(rest.len());
        after_lt + len
    };
    if name_end == after_lt {
        return None;
    }
    let name = src[after_lt..name_end].to_owned();

    let mut cur = name_end;
    let mut attrs = Vec::new();
    loop {
        cur = skip_ws(src, cur);
        if src.as_bytes().get(cur) == Some(&b'/') || src.as_bytes().get(cur) == Some(&b'>') {
            break;
        }
        match parse_attribute(src, cur) {
            Some((next, attr)) => {
                attrs.push(attr);
                cur = next;
            }
            None => {
                // Tolerate junk tokens between attributes, but not `<`.
                if src.as_bytes().get(cur) == Some(&b'<') || src.as_bytes().get(cur).is_none() {
                    return None;
                }
                cur += 1;
            }
        }
    }
    let self_closing = src.as_bytes().get(cur) == Some(&b'/');
    if self_closing {
        cur += 1;
    }
    if src.as_bytes().get(cur) != Some(&b'>') {
        return None;
    }
    cur += 1;
    Some((cur, TagOpen { name, attrs, self_closing }))
}

pub(crate) fn skip_ws(src: &str, pos: usize) -> usize {
    let rest = &src[pos..];
    let trimmed = rest.trim_start_matches([' ', '\t', '\n', '\r', '/']);
    pos + (rest.len() - trimmed.len())
}

/// `name`, or `name="value"` / `name='value'` / `name=unquoted`. Names
/// match `[:A-Za-z_][:A-Za-z0-9_.\-]*`; entities in the value are decoded.
pub(crate) fn parse_attribute(src: &str, pos: usize) -> Option<(usize, Attribute)> {
    let rest = &src[pos..];
    let name_len = rest.find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))).unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let name = rest[..name_len].to_owned();
    let mut cur = pos + name_len;
    let after_ws = skip_ws(src, cur);
    if src.as_bytes().get(after_ws) != Some(&b'=') {
        return Some((cur, Attribute { name, value: None }));
    }
    cur = skip_ws(src, after_ws + 1);
    let (value_end, raw) = match src.as_bytes().get(cur) {
        Some(&q @ (b'"' | b'\'')) => {
            let start = cur + 1;
            let end = src[start..].find(q as char).map(|n| start + n)?;
            (end + 1, &src[start..end])
        }
        _ => {
            let rest = &src[cur..];
            let len = rest.find(|c: char| c.is_whitespace() || c == '>').unwrap_or(rest.len());
            (cur + len, &rest[..len])
        }
    };
    let decoded = html_escape::decode_html_entities(raw).into_owned();
    Some((value_end, Attribute { name, value: Some(decoded) }))
}
