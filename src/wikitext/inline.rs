//! Inline content: the ordered choice tried at every position inside a
//! paragraph, heading, list item, table cell, or other inline context.
//! Quote runs nest directly into `Bold`/`Italic`/`BoldItalic` content, since
//! there is no separate rendering pass downstream to pair up flat style
//! markers afterward.

use crate::ast::{EntityRef, Inline};
use crate::span::Spanned;
use crate::wikitext::{html, links, Parser};

/// Parses a run of inline content starting at `pos`, stopping at the first
/// position where a `no`/`ifnot` trap fires, at a raw newline, or at EOF.
pub(crate) fn inline_run(p: &Parser, pos: usize) -> (usize, Vec<Spanned<Inline>>) {
    let mut out = Vec::new();
    let mut cur = pos;
    while !stopped(p, cur) {
        let (next, mut nodes) = inline_element(p, cur, None);
        if next == cur {
            break;
        }
        out.append(&mut nodes);
        cur = next;
    }
    (cur, out)
}

/// Like [`inline_run`], but also stops at an absolute byte `limit` — used to
/// parse the body of a quote run bounded by its already-located closer, or a
/// definition-list term bounded by a same-line `:` separator. The limit is
/// also handed down into any quote run encountered, so a nested quote can't
/// locate a closer past the bound and have its whole node discarded.
pub(crate) fn inline_run_until(p: &Parser, pos: usize, limit: usize) -> (usize, Vec<Spanned<Inline>>) {
    let mut out = Vec::new();
    let mut cur = pos;
    while cur < limit && !stopped(p, cur) {
        let (next, mut nodes) = inline_element(p, cur, Some(limit));
        if next > limit || next == cur {
            break;
        }
        out.append(&mut nodes);
        cur = next;
    }
    (cur, out)
}

fn stopped(p: &Parser, pos: usize) -> bool {
    let src = p.src();
    p.buffer.is_eof(pos)
        || src.as_bytes().get(pos) == Some(&b'\n')
        || !p.stacks.check_ifnots(src, pos)
}

pub(crate) fn inline_element_pub(p: &Parser, pos: usize) -> (usize, Vec<Spanned<Inline>>) {
    inline_element(p, pos, None)
}

/// Like [`inline_element_pub`], but bounds a quote run encountered at `pos`
/// to `limit` — for the bounded contexts (link text, table cell, HTML
/// element content) that scan with their own external closer already
/// located, and need any quote run inside to respect it.
pub(crate) fn inline_element_bounded(p: &Parser, pos: usize, limit: usize) -> (usize, Vec<Spanned<Inline>>) {
    inline_element(p, pos, Some(limit))
}

fn inline_element(p: &Parser, pos: usize, limit: Option<usize>) -> (usize, Vec<Spanned<Inline>>) {
    if let Some(r) = quote(p, pos, limit) {
        return r;
    }
    if let Some(r) = comment(p, pos) {
        return (r.0, vec![r.1]);
    }
    if let Some(r) = entity(p, pos) {
        return (r.0, vec![r.1]);
    }
    if let Some(r) = html::inline_element(p, pos) {
        return (r.0, vec![r.1]);
    }
    if let Some(r) = links::internal_link(p, pos) {
        return (r.0, vec![r.1]);
    }
    if let Some(r) = links::external_link(p, pos) {
        return (r.0, vec![r.1]);
    }
    if let Some(r) = links::autolink(p, pos) {
        return (r.0, vec![r.1]);
    }
    if let Some(r) = behavior_switch(p, pos) {
        return (r.0, vec![r.1]);
    }
    if let Some(r) = text_run(p, pos) {
        return (r.0, vec![r.1]);
    }
    let width = p.src()[pos..].chars().next().map_or(1, char::len_utf8);
    (
        pos + width,
        vec![Spanned::new(Inline::Text(p.src()[pos..pos + width].to_owned()), pos, pos + width)],
    )
}

/// A maximal run of characters that cannot start another inline production.
/// Also breaks at a word boundary immediately before a recognized URL
/// scheme, so `links::autolink` gets a chance mid-run to recognize a bare
/// URL starting there.
fn text_run(p: &Parser, pos: usize) -> Option<(usize, Spanned<Inline>)> {
    let src = p.src();
    let mut cur = pos;
    let mut prev_alnum = pos > 0 && src.as_bytes().get(pos - 1).is_some_and(|b| b.is_ascii_alphanumeric());
    loop {
        if stopped(p, cur) {
            break;
        }
        let c = p.buffer.at(cur)?;
        if matches!(c, '\'' | '&' | '<' | '[') {
            break;
        }
        if c == '_' && src[cur..].starts_with("__") {
            break;
        }
        if !prev_alnum && c.is_ascii_alphabetic() && links::scheme_starts_here(p, cur) {
            break;
        }
        prev_alnum = c.is_ascii_alphanumeric();
        cur += c.len_utf8();
    }
    if cur == pos {
        None
    } else {
        Some((cur, Spanned::new(Inline::Text(src[pos..cur].to_owned()), pos, cur)))
    }
}

/// `'''…'''`, `''…''`, `'''''…'''''`, with the "peeling" rule for runs of
/// exactly 4 or more than 5 apostrophes. The closing run is the next
/// apostrophe run of at least the same semantic length on the same line; a
/// raw newline is the fallback terminator. When `limit` is set (this quote
/// was reached from a bounded context), the closer search is also capped
/// there, so a quote nested inside, say, link text never claims a closer
/// that lies outside the link's own closing bracket.
fn quote(p: &Parser, pos: usize, limit: Option<usize>) -> Option<(usize, Vec<Spanned<Inline>>)> {
    let src = p.src();
    let bytes = src.as_bytes();
    if bytes.get(pos) != Some(&b'\'') || bytes.get(pos + 1) != Some(&b'\'') {
        return None;
    }
    let mut len = 0usize;
    while bytes.get(pos + len) == Some(&b'\'') {
        len += 1;
    }
    let (skip, sem_len) = if len == 4 {
        (1, 3)
    } else if len > 5 {
        (len - 5, 5)
    } else {
        (0, len)
    };
    let open_end = pos + skip + sem_len;
    let line_end = p.buffer.line_end(open_end);
    let search_end = limit.map_or(line_end, |l| l.min(line_end));

    let mut i = open_end;
    let mut close = None;
    while i < search_end {
        if bytes[i] == b'\'' {
            let mut j = i;
            while j < search_end && bytes[j] == b'\'' {
                j += 1;
            }
            if j - i >= sem_len {
                close = Some((i, i + sem_len));
                break;
            }
            i = j;
        } else {
            i += 1;
        }
    }
    let (close_start, close_end) = close.unwrap_or((search_end, search_end));

    // Forbid the content from re-entering the same style level.
    let _no_quote = p.stacks.push_no(crate::engine::stacks::literal_pattern("'".repeat(sem_len)));
    let (_, content) = inline_run_until(p, open_end, close_start);
    drop(_no_quote);

    let node = match sem_len {
        2 => Inline::Italic(content),
        3 => Inline::Bold(content),
        5 => Inline::BoldItalic(content),
        _ => return None,
    };
    let mut out = Vec::new();
    if skip > 0 {
        out.push(Spanned::new(Inline::Text("'".repeat(skip)), pos, pos + skip));
    }
    out.push(Spanned::new(node, pos + skip, close_end));
    Some((close_end, out))
}

/// `<!-- … -->`, independent of the preprocessor's own comment handling
/// (the main grammar may run directly over text that bypassed
/// preprocessing).
fn comment(p: &Parser, pos: usize) -> Option<(usize, Spanned<Inline>)> {
    let after_open = p.buffer.match_literal(pos, "<!--")?;
    let src = p.src();
    match src[after_open..].find("-->") {
        Some(offset) => {
            let close = after_open + offset;
            let end = close + 3;
            Some((end, Spanned::new(Inline::Comment(src[after_open..close].to_owned()), pos, end)))
        }
        None => {
            let end = src.len();
            p.diagnostics.borrow_mut().push(crate::diagnostics::Diagnostic::UnclosedComment {
                span: crate::span::Span::new(pos, end),
            });
            Some((end, Spanned::new(Inline::Comment(src[after_open..].to_owned()), pos, end)))
        }
    }
}

/// `__WORD__`, where `WORD` names a configured behavior switch other than
/// the mandatory TOC markers. Unrecognized words are left for `text_run` to
/// consume a character at a time.
fn behavior_switch(p: &Parser, pos: usize) -> Option<(usize, Spanned<Inline>)> {
    let after_open = p.buffer.match_literal(pos, "__")?;
    let src = p.src();
    let name: String = src[after_open..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() || !p.config.is_behavior_switch(&name) {
        return None;
    }
    let after_name = after_open + name.len();
    let end = p.buffer.match_literal(after_name, "__")?;
    Some((end, Spanned::new(Inline::BehaviorSwitch { name }, pos, end)))
}

/// `&name;`, `&#digits;`, `&#xhex;`.
fn entity(p: &Parser, pos: usize) -> Option<(usize, Spanned<Inline>)> {
    let after_amp = p.buffer.match_literal(pos, "&")?;
    let src = p.src();
    let rest = &src[after_amp..];
    if let Some(after_hash) = rest.strip_prefix('#') {
        if let Some(after_x) = after_hash.strip_prefix(['x', 'X']) {
            let digits: String = after_x.chars().take_while(|c| c.is_ascii_hexdigit()).collect();
            if digits.is_empty() {
                return None;
            }
            let after_digits = after_amp + 1 + 1 + digits.len();
            let end = p.buffer.match_literal(after_digits, ";")?;
            let value = u32::from_str_radix(&digits, 16).ok()?;
            return Some((end, Spanned::new(Inline::HtmlEntity(EntityRef::Hex(value)), pos, end)));
        }
        let digits: String = after_hash.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return None;
        }
        let after_digits = after_amp + 1 + digits.len();
        let end = p.buffer.match_literal(after_digits, ";")?;
        let value: u32 = digits.parse().ok()?;
        return Some((end, Spanned::new(Inline::HtmlEntity(EntityRef::Decimal(value)), pos, end)));
    }
    let name: String = rest.chars().take_while(|c| c.is_ascii_alphanumeric()).collect();
    if name.is_empty() {
        return None;
    }
    let after_name = after_amp + name.len();
    let end = p.buffer.match_literal(after_name, ";")?;
    Some((end, Spanned::new(Inline::HtmlEntity(EntityRef::Named(name)), pos, end)))
}
