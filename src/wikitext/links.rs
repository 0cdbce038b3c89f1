//! Links: internal (`[[...]]`), external (`[url ...]`), and bare
//! autolinked URLs. Grounded on `wikilink`/`extlink`/`autourl` in the
//! teacher's `wikitext/parser.rs`.

use crate::ast::Inline;
use crate::span::Spanned;
use crate::wikitext::{inline, Parser};

/// `[[ target ( | text )? ]] trail?`. `trail` is a contiguous run of
/// letters/apostrophes immediately following the closing brackets.
pub(crate) fn internal_link(p: &Parser, pos: usize) -> Option<(usize, Spanned<Inline>)> {
    let after_open = p.buffer.match_literal(pos, "[[")?;
    let target_end = {
        let src = p.src();
        let mut i = after_open;
        loop {
            if src.as_bytes().get(i).is_none() || src.as_bytes()[i] == b'\n' {
                break i;
            }
            if src[i..].starts_with("]]") || src[i..].starts_with('|') {
                break i;
            }
            i += src[i..].chars().next().map_or(1, char::len_utf8);
        }
    };
    let target = p.src()[after_open..target_end].to_owned();

    let (after_text, text) = if p.buffer.match_literal(target_end, "|").is_some() {
        let _no_pre = p.stacks.push_wspre(false);
        let (end, content) = inline_until_close_bracket(p, target_end + 1);
        drop(_no_pre);
        (end, Some(content))
    } else {
        (target_end, None)
    };

    let end = p.buffer.match_literal(after_text, "]]")?;

    let trail_end = {
        let src = p.src();
        let mut i = end;
        while let Some(c) = src[i..].chars().next() {
            if c.is_alphabetic() || c == '\'' {
                i += c.len_utf8();
            } else {
                break;
            }
        }
        i
    };
    let trail = if trail_end > end {
        Some(p.src()[end..trail_end].to_owned())
    } else {
        None
    };

    Some((
        trail_end,
        Spanned::new(Inline::InternalLink { target, text, trail }, pos, trail_end),
    ))
}

fn inline_until_close_bracket(p: &Parser, pos: usize) -> (usize, Vec<Spanned<Inline>>) {
    let src = p.src();
    let limit = src[pos..].find("]]").map_or(src.len(), |n| pos + n);
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
    (cur, out)
}

/// `[ url text? ]`, where `url` begins with a recognized scheme or `//`.
pub(crate) fn external_link(p: &Parser, pos: usize) -> Option<(usize, Spanned<Inline>)> {
    if p.src().as_bytes().get(pos) != Some(&b'[') {
        return None;
    }
    if p.src()[pos..].starts_with("[[") {
        return None;
    }
    let after_open = pos + 1;
    if !scheme_starts_here(p, after_open) && !p.src()[after_open..].starts_with("//") {
        return None;
    }
    let src = p.src();
    let line_end = p.buffer.line_end(after_open);
    let url_end = {
        let mut i = after_open;
        while i < line_end && !matches!(src.as_bytes()[i], b' ' | b'\t' | b']') {
            i += 1;
        }
        i
    };
    let url = src[after_open..url_end].to_owned();
    let text_start = {
        let rest = &src[url_end..line_end];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        url_end + (rest.len() - trimmed.len())
    };
    let (after_text, text) = if src.as_bytes().get(text_start) == Some(&b']') {
        (text_start, None)
    } else {
        let close = src[text_start..line_end].find(']').map(|n| text_start + n)?;
        let (_, content) = bounded_inline(p, text_start, close);
        (close, Some(content))
    };
    let end = p.buffer.match_literal(after_text, "]")?;
    Some((end, Spanned::new(Inline::ExternalLink { url, text }, pos, end)))
}

fn bounded_inline(p: &Parser, pos: usize, limit: usize) -> (usize, Vec<Spanned<Inline>>) {
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
    (cur, out)
}

/// True when a configured scheme (or `//`) begins at `pos`, case-insensitive.
pub(crate) fn scheme_starts_here(p: &Parser, pos: usize) -> bool {
    let rest = &p.src()[pos..];
    p.config.schemes().any(|scheme| {
        rest.len() > scheme.len()
            && rest[..scheme.len()].eq_ignore_ascii_case(scheme)
            && rest.as_bytes()[scheme.len()] == b':'
    })
}

/// A bare URL starting at a word boundary. Trailing punctuation is not
/// absorbed; a closing `)` is absorbed only if a matching `(` appears
/// within the URL.
pub(crate) fn autolink(p: &Parser, pos: usize) -> Option<(usize, Spanned<Inline>)> {
    let src = p.src();
    let preceded_by_word_char = pos > 0
        && matches!(src.as_bytes()[pos - 1], b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_');
    if preceded_by_word_char {
        return None;
    }
    if src[pos..].starts_with("//") {
        return None;
    }
    if !scheme_starts_here(p, pos) {
        return None;
    }
    let mut i = pos;
    while src.as_bytes().get(i).is_some_and(u8::is_ascii_alphabetic) {
        i += 1;
    }
    i += 1; // the ':'
    let mut end = i;
    while end < src.len() {
        let c = src[end..].chars().next().unwrap();
        if c.is_whitespace() || matches!(c, '<' | '[' | ']' | '"') {
            break;
        }
        end += c.len_utf8();
    }
    let has_open_paren = src[i..end].contains('(');
    while end > i {
        let last = src.as_bytes()[end - 1];
        let strip = matches!(last, b',' | b';' | b'.' | b':' | b'!' | b'?')
            || (last == b')' && !has_open_paren);
        if strip {
            end -= 1;
        } else {
            break;
        }
    }
    if end <= i {
        return None;
    }
    let url = src[pos..end].to_owned();
    Some((end, Spanned::new(Inline::PlainLink { url }, pos, end)))
}
