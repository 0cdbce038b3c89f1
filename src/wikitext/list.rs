//! Lists: `*` (ul), `#` (ol), `;`/`:` (dl), with arbitrary nesting depth
//! encoded by the marker run at the start of each line. Built as a direct
//! marker-prefix recursive tree, since [`crate::ast::ListItem`] nests
//! sublists directly rather than through a flat token stream needing a
//! separate depth-reconstruction pass.

use crate::ast::{Block, ListItem, ListKind};
use crate::wikitext::{inline, Parser};

pub(crate) fn list(p: &Parser, pos: usize) -> Option<(usize, Block)> {
    if !p.buffer.is_bol(pos) {
        return None;
    }
    if !matches!(p.src().as_bytes().get(pos), Some(b'*' | b'#' | b':' | b';')) {
        return None;
    }
    let (end, items, kind) = parse_level(p, pos, "");
    Some((end, Block::List { kind, items }))
}

fn marker_run(p: &Parser, pos: usize) -> String {
    p.src()[pos..]
        .chars()
        .take_while(|c| matches!(c, '*' | '#' | ':' | ';'))
        .collect()
}

fn kind_of(marker: char) -> ListKind {
    match marker {
        '*' => ListKind::Ul,
        '#' => ListKind::Ol,
        _ => ListKind::Dl,
    }
}

/// Parses every consecutive line whose marker run starts with `prefix` and
/// has exactly one more marker char (the items of this level), attaching
/// deeper-nested lines as sublists of the preceding item.
fn parse_level(p: &Parser, pos: usize, prefix: &str) -> (usize, Vec<ListItem>, ListKind) {
    let first_markers = marker_run(p, pos);
    let this_char = first_markers.as_bytes()[prefix.len()] as char;
    let kind = kind_of(this_char);
    let this_prefix = format!("{prefix}{this_char}");

    let mut items = Vec::new();
    let mut cur = pos;
    loop {
        if !p.buffer.is_bol(cur) {
            break;
        }
        let markers = marker_run(p, cur);
        if markers.len() != this_prefix.len() || !markers.starts_with(&this_prefix) {
            break;
        }
        let content_start = cur + markers.len();
        let _bol_skip_guards: Vec<_> = this_prefix
            .chars()
            .map(|c| p.stacks.push_bol_skip(crate::engine::traps::list_marker(c)))
            .collect();

        if this_char == ';' || this_char == ':' {
            cur = dtdd_item(p, content_start, &this_prefix, &mut items, this_char);
        } else {
            let (after, item) = single_item(p, content_start, &this_prefix);
            items.push(item);
            cur = after;
        }
        drop(_bol_skip_guards);
    }
    (cur, items, kind)
}

/// One item: inline content to end-of-line, plus any immediately-following
/// deeper-nested lines, attached as this item's sublists.
fn single_item(p: &Parser, content_start: usize, this_prefix: &str) -> (usize, ListItem) {
    let (after_inline, content) = inline::inline_run(p, content_start);
    let after_eol = consume_eol(p, after_inline);
    let (after, sublists) = collect_sublists(p, after_eol, this_prefix);
    (after, ListItem { content, sublists })
}

/// A `;`- or `:`-led line. If led by `;` and a bare `:` appears before the
/// line ends, the content splits into a `DefTerm` and a `DefDef` sharing
/// this depth; otherwise it is a single `DefTerm` (led by `;`) or `DefDef`
/// (led by `:`), tagged by the innermost marker. Deeper nesting on the line
/// gets its own item rather than attaching to either half.
fn dtdd_item(p: &Parser, content_start: usize, this_prefix: &str, items: &mut Vec<ListItem>, marker: char) -> usize {
    let src = p.src();
    let line_end = p.buffer.line_end(content_start);
    let colon = (marker == ';')
        .then(|| src[content_start..line_end].find(':').map(|n| content_start + n))
        .flatten();
    match colon {
        Some(colon_pos) => {
            let (_, term_content) = inline::inline_run_until(p, content_start, colon_pos);
            let (after_inline, detail_content) = inline::inline_run(p, colon_pos + 1);
            let after_eol = consume_eol(p, after_inline);
            let (after, sublists) = collect_sublists(p, after_eol, this_prefix);
            items.push(ListItem {
                content: Vec::new(),
                sublists: vec![
                    Block::DefTerm { content: term_content },
                    Block::DefDef { content: detail_content },
                ],
            });
            if !sublists.is_empty() {
                items.push(ListItem { content: Vec::new(), sublists });
            }
            after
        }
        None => {
            let (after_inline, content) = inline::inline_run(p, content_start);
            let after_eol = consume_eol(p, after_inline);
            let (after, sublists) = collect_sublists(p, after_eol, this_prefix);
            let tagged = if marker == ';' { Block::DefTerm { content } } else { Block::DefDef { content } };
            let mut item_sublists = vec![tagged];
            item_sublists.extend(sublists);
            items.push(ListItem { content: Vec::new(), sublists: item_sublists });
            after
        }
    }
}

fn collect_sublists(p: &Parser, mut pos: usize, this_prefix: &str) -> (usize, Vec<Block>) {
    let mut sublists = Vec::new();
    while p.buffer.is_bol(pos) {
        let markers = marker_run(p, pos);
        if markers.starts_with(this_prefix) && markers.len() > this_prefix.len() {
            let (after, items, kind) = parse_level(p, pos, this_prefix);
            sublists.push(Block::List { kind, items });
            pos = after;
        } else {
            break;
        }
    }
    (pos, sublists)
}

fn consume_eol(p: &Parser, pos: usize) -> usize {
    if p.src().as_bytes().get(pos) == Some(&b'\n') {
        pos + 1
    } else {
        pos
    }
}
